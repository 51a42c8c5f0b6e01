//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are kept at full precision. Rounding to the two decimal places the
//! backend and the customer see happens only at the boundary, via
//! [`round_money`] or [`Price::rounded`], so repeated recomputation never
//! compounds rounding error.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of decimal places shown to customers and sent to the backend.
pub const MONEY_DECIMAL_PLACES: u32 = 2;

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
}

/// A non-negative unit price.
///
/// ## Constraints
///
/// - Amount is always `>= 0`
///
/// ## Examples
///
/// ```
/// use feedstore_core::Price;
/// use rust_decimal::Decimal;
///
/// let price = Price::new(Decimal::new(1999, 2)).unwrap();
/// assert_eq!(price.times(3), Some(Decimal::new(5997, 2)));
/// assert!(Price::new(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount.normalize()))
    }

    /// Returns the full-precision amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns `price * quantity` at full precision, or `None` if the
    /// product does not fit in a `Decimal`.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Option<Decimal> {
        self.0.checked_mul(Decimal::from(quantity))
    }

    /// Returns the amount rounded for display.
    #[must_use]
    pub fn rounded(&self) -> Decimal {
        round_money(self.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.rounded())
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

/// Round a monetary amount to two decimal places, midpoints away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use core::str::FromStr;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_new_rejects_negative() {
        assert!(matches!(
            Price::new(dec("-0.01")),
            Err(PriceError::Negative(_))
        ));
        assert!(Price::new(Decimal::ZERO).is_ok());
        assert!(Price::new(dec("-0")).is_ok());
    }

    #[test]
    fn test_times_keeps_full_precision() {
        let price = Price::new(dec("5.005")).unwrap();
        assert_eq!(price.times(2), Some(dec("10.010")));
        assert_eq!(price.times(0), Some(Decimal::ZERO));
    }

    #[test]
    fn test_times_overflow_is_none() {
        let price = Price::new(Decimal::from_scientific("1e20").unwrap()).unwrap();
        assert_eq!(price.times(u32::MAX), None);
        assert_eq!(price.times(1), Some(price.amount()));
    }

    #[test]
    fn test_round_money_midpoint_away_from_zero() {
        assert_eq!(round_money(dec("0.125")), dec("0.13"));
        assert_eq!(round_money(dec("0.135")), dec("0.14"));
        assert_eq!(round_money(dec("69.98")), dec("69.98"));
        assert_eq!(round_money(dec("10.0049")), dec("10.00"));
    }

    #[test]
    fn test_display_two_places() {
        assert_eq!(Price::new(dec("12")).unwrap().to_string(), "12.00");
        assert_eq!(Price::new(dec("5.005")).unwrap().to_string(), "5.01");
    }

    #[test]
    fn test_try_from() {
        let price: Price = dec("3.50").try_into().unwrap();
        assert_eq!(price.amount(), dec("3.5"));
    }
}
