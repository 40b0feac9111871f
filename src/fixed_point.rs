/*
 * 17.14 Fixed-Point Arithmetic
 *
 * The MLFQS statistics (load average, recent CPU) are fractional values, but
 * the kernel never touches the FPU: its state is not saved across context
 * switches. This module provides a signed 17.14 fixed-point number instead.
 *
 * ## Representation
 *
 * A `Fixed` wraps an `i32` whose low 14 bits are the fraction:
 *
 *   value = raw / 2^14
 *
 * which gives 17 integer bits (plus sign) and a resolution of ~0.00006.
 *
 * ## Operations
 *
 * - Fixed +/- Fixed: add/sub
 * - Fixed +/- int:   x +/- n * F
 * - Fixed * Fixed:   multiplied, then divided by F
 * - Fixed / Fixed:   numerator scaled by F before dividing
 * - Fixed * int, Fixed / int: integer mul/div on the raw value
 *
 * Every operation except division by an integer is computed in 64 bits and
 * narrowed back; a result that does not fit into 32 bits is a scheduler bug
 * and panics.
 */

use core::fmt;
use core::ops::{Add, Div, Mul, Neg, Sub};

/// Number of fractional bits
pub const FRACTION_BITS: u32 = 14;

/// Scale factor (2^14)
pub const F: i32 = 1 << FRACTION_BITS;

/// Signed 17.14 fixed-point number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Fixed(i32);

impl Fixed {
    /// Zero
    pub const ZERO: Fixed = Fixed(0);

    /// One
    pub const ONE: Fixed = Fixed(F);

    /// Largest integer that converts without overflow
    pub const MAX_INT: i32 = i32::MAX / F;

    /// Smallest integer that converts and rounds back without overflow
    pub const MIN_INT: i32 = -(i32::MAX / F);

    /// Convert an integer to fixed point (`n * F`)
    pub const fn from_int(n: i32) -> Self {
        Fixed(n * F)
    }

    /// Wrap an already-scaled raw value
    pub const fn from_raw(raw: i32) -> Self {
        Fixed(raw)
    }

    /// The raw scaled representation
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Convert to integer, rounding half away from zero
    pub const fn round_to_int(self) -> i32 {
        if self.0 >= 0 {
            (self.0 + F / 2) / F
        } else {
            (self.0 - F / 2) / F
        }
    }

    /// Convert to integer, truncating toward zero
    pub const fn trunc_to_int(self) -> i32 {
        self.0 / F
    }

    /// `round(self * 100)`, the form user-visible statistics are reported in
    ///
    /// Computed in 64 bits: `self * 100` leaves the 17.14 range long before
    /// the rounded result leaves `i32`.
    pub fn hundredths(self) -> i32 {
        let scaled = i64::from(self.0) * 100;
        let half = i64::from(F / 2);
        let rounded = if scaled >= 0 {
            scaled + half
        } else {
            scaled - half
        };
        narrow(rounded / i64::from(F))
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }
}

/// Narrow a widened intermediate back to 32 bits
fn narrow(wide: i64) -> i32 {
    match i32::try_from(wide) {
        Ok(v) => v,
        Err(_) => panic!("fixed-point overflow: {} does not fit in 17.14", wide),
    }
}

impl Add for Fixed {
    type Output = Fixed;

    fn add(self, rhs: Fixed) -> Fixed {
        Fixed(narrow(i64::from(self.0) + i64::from(rhs.0)))
    }
}

impl Sub for Fixed {
    type Output = Fixed;

    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed(narrow(i64::from(self.0) - i64::from(rhs.0)))
    }
}

impl Add<i32> for Fixed {
    type Output = Fixed;

    fn add(self, n: i32) -> Fixed {
        Fixed(narrow(i64::from(self.0) + i64::from(n) * i64::from(F)))
    }
}

impl Sub<i32> for Fixed {
    type Output = Fixed;

    fn sub(self, n: i32) -> Fixed {
        Fixed(narrow(i64::from(self.0) - i64::from(n) * i64::from(F)))
    }
}

impl Mul for Fixed {
    type Output = Fixed;

    fn mul(self, rhs: Fixed) -> Fixed {
        Fixed(narrow(i64::from(self.0) * i64::from(rhs.0) / i64::from(F)))
    }
}

impl Mul<i32> for Fixed {
    type Output = Fixed;

    fn mul(self, n: i32) -> Fixed {
        Fixed(narrow(i64::from(self.0) * i64::from(n)))
    }
}

impl Div for Fixed {
    type Output = Fixed;

    fn div(self, rhs: Fixed) -> Fixed {
        Fixed(narrow(i64::from(self.0) * i64::from(F) / i64::from(rhs.0)))
    }
}

impl Div<i32> for Fixed {
    type Output = Fixed;

    fn div(self, n: i32) -> Fixed {
        Fixed(self.0 / n)
    }
}

impl Neg for Fixed {
    type Output = Fixed;

    fn neg(self) -> Fixed {
        Fixed(narrow(-i64::from(self.0)))
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hundredths = self.hundredths();
        let sign = if hundredths < 0 { "-" } else { "" };
        let abs = hundredths.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}
