//! Fixed-point monetary amounts.
//!
//! Every value on the ledger is a signed 64-bit integer scaled by 10^8, so an
//! amount of `1` whole unit is stored as `100_000_000` raw. Negative values only
//! appear as balance deltas.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Number of raw units per whole unit (8 decimal places).
pub const FIXED8_DECIMALS: i64 = 100_000_000;

/// A fixed-point amount with 8 decimal places.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Fixed8(i64);

impl Fixed8 {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(FIXED8_DECIMALS);

    /// Build from raw (already scaled) units.
    pub fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Build from whole units, returning `None` on overflow.
    pub fn from_units(units: i64) -> Option<Self> {
        units.checked_mul(FIXED8_DECIMALS).map(Self)
    }

    pub fn raw(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }
}

impl Add for Fixed8 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Fixed8 {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Fixed8 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Fixed8 {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Fixed8 {
    type Output = Self;
    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Sum for Fixed8 {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, v| acc + v)
    }
}

impl fmt::Display for Fixed8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let scale = FIXED8_DECIMALS as u64;
        write!(f, "{}{}.{:08}", sign, abs / scale, abs % scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_units_scales_by_eight_decimals() {
        assert_eq!(Fixed8::from_units(3).unwrap().raw(), 300_000_000);
        assert!(Fixed8::from_units(i64::MAX).is_none());
    }

    #[test]
    fn negation_and_sum() {
        let total: Fixed8 = [Fixed8::ONE, Fixed8::ONE, -Fixed8::ONE].into_iter().sum();
        assert_eq!(total, Fixed8::ONE);
    }

    #[test]
    fn display_shows_fraction() {
        assert_eq!(Fixed8::from_raw(150_000_000).to_string(), "1.50000000");
        assert_eq!(Fixed8::from_raw(-1).to_string(), "-0.00000001");
    }
}
