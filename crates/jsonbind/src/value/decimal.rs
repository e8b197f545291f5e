use std::fmt;
use std::hash::{Hash, Hasher};

use num_bigint::BigInt;
use num_traits::{Pow, Signed, Zero};

/// Arbitrary-precision decimal: `digits` × 10^`exponent`.
///
/// The scale is kept exactly as parsed (`1.50` stays distinct from `1.5` in
/// its printed form), while equality and hashing compare the normalized
/// value.
#[derive(Debug, Clone)]
pub struct Decimal {
    digits: BigInt,
    exponent: i64,
}

impl Decimal {
    pub fn new(digits: BigInt, exponent: i64) -> Self {
        Self { digits, exponent }
    }

    /// The exact integer value, if the normalized exponent is non-negative.
    pub(crate) fn to_bigint_exact(&self) -> Option<BigInt> {
        let (digits, exponent) = self.normalized();
        if exponent < 0 {
            return None;
        }
        let exponent = u32::try_from(exponent).ok()?;
        Some(digits * BigInt::from(10u32).pow(exponent))
    }

    /// Nearest binary floating approximation. Values beyond the `f64` domain
    /// saturate to the infinities.
    pub fn to_f64(&self) -> f64 {
        self.to_string().parse().unwrap_or(f64::NAN)
    }

    fn normalized(&self) -> (BigInt, i64) {
        if self.digits.is_zero() {
            return (BigInt::zero(), 0);
        }
        let mut digits = self.digits.clone();
        let mut exponent = self.exponent;
        while (&digits % 10u32).is_zero() {
            digits /= 10u32;
            exponent += 1;
        }
        (digits, exponent)
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for Decimal {}

impl Hash for Decimal {
    fn hash<H: Hasher>(&self, h: &mut H) {
        self.normalized().hash(h);
    }
}

impl fmt::Display for Decimal {
    /// Renders a lexeme that re-parses to an equal decimal: plain notation
    /// for negative exponents, exponential notation otherwise (so integral
    /// lexical forms are never produced).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.digits.magnitude().to_string();
        let sign = if self.digits.is_negative() { "-" } else { "" };
        if self.exponent >= 0 {
            return write!(f, "{sign}{magnitude}e{}", self.exponent);
        }
        let point = magnitude.len() as i64 + self.exponent;
        if point > 0 {
            let (int_part, frac_part) = magnitude.split_at(point as usize);
            write!(f, "{sign}{int_part}.{frac_part}")
        } else {
            let zeros = "0".repeat(usize::try_from(-point).unwrap_or(0));
            write!(f, "{sign}0.{zeros}{magnitude}")
        }
    }
}
