/*
 * Scheduler Trait Definitions
 *
 * This module defines the trait that separates scheduling policy from
 * mechanism:
 *
 * - SchedPolicy: the interface the priority and MLFQS policies implement
 * - SchedContext (see context.rs): the mechanism state a policy may touch
 *
 * The mechanism decides *when* threads move between states and which
 * thread runs next (always the head of the ready queue). A policy decides
 * *what priority* each thread has.
 */

use super::context::SchedContext;
use super::events::SchedEvent;
use super::types::SchedMode;
use crate::fixed_point::Fixed;

/// Scheduling policy trait
///
/// The Scheduler holds a `Box<dyn SchedPolicy>` chosen from the boot
/// configuration and forwards events to it.
pub trait SchedPolicy: Send {
    /// React to a scheduling event
    ///
    /// Called with the scheduler lock held. Any priority change must go
    /// through `ctx` so the ready queue stays ordered.
    fn on_event(&mut self, ctx: &mut SchedContext<'_>, event: SchedEvent);

    /// Mode this policy implements
    fn mode(&self) -> SchedMode;

    /// Get the policy name for debugging
    fn name(&self) -> &'static str;

    /// System load average; zero for policies that do not track it
    fn load_avg(&self) -> Fixed {
        Fixed::ZERO
    }
}
