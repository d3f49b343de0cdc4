//! Type-safe money representation using decimal arithmetic.
//!
//! Every amount the backend returns is Indonesian Rupiah without minor units,
//! so the type carries no currency code. Arithmetic stays in `Decimal` to
//! keep subtotals exact; only display rounds to whole rupiah.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// An amount of Indonesian Rupiah.
///
/// Deserializes from either a JSON number (the API's format) or a string
/// (the persisted cart's format).
///
/// ```
/// use foody_core::Rupiah;
///
/// let price = Rupiah::from(25_000);
/// assert_eq!(price.times(3).to_string(), "Rp75.000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rupiah(Decimal);

impl Rupiah {
    /// Zero rupiah.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create an amount from a decimal value.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Line total for `quantity` units at this unit price.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<i64> for Rupiah {
    fn from(amount: i64) -> Self {
        Self(Decimal::from(amount))
    }
}

impl From<Decimal> for Rupiah {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Rupiah {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Rupiah {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Rupiah {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Formats as `Rp` followed by whole rupiah grouped with `.` separators,
/// the way the id-ID locale renders currency.
impl fmt::Display for Rupiah {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self
            .0
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .normalize();
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let digits = rounded.abs().trunc().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }

        write!(f, "{sign}Rp{grouped}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Rupiah::from(0).to_string(), "Rp0");
        assert_eq!(Rupiah::from(500).to_string(), "Rp500");
        assert_eq!(Rupiah::from(15_000).to_string(), "Rp15.000");
        assert_eq!(Rupiah::from(1_250_000).to_string(), "Rp1.250.000");
    }

    #[test]
    fn test_display_rounds_to_whole_rupiah() {
        let amount = Rupiah::new(Decimal::new(2_499_950, 2)); // 24999.50
        assert_eq!(amount.to_string(), "Rp25.000");
    }

    #[test]
    fn test_display_negative() {
        assert_eq!(Rupiah::from(-5_000).to_string(), "-Rp5.000");
    }

    #[test]
    fn test_times_and_sum() {
        let unit = Rupiah::from(12_500);
        assert_eq!(unit.times(4), Rupiah::from(50_000));

        let total: Rupiah = [Rupiah::from(1_000), Rupiah::from(2_000)].iter().sum();
        assert_eq!(total, Rupiah::from(3_000));
    }

    #[test]
    fn test_deserialize_number_and_string() {
        let from_number: Rupiah = serde_json::from_str("25000").unwrap();
        let from_string: Rupiah = serde_json::from_str("\"25000\"").unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(from_number, Rupiah::from(25_000));
    }
}
