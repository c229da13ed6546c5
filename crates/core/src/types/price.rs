//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are held as exact decimals so cart totals never accumulate binary
//! floating-point error. On the wire (local mirror, remote rows) a price is a
//! plain JSON number such as `39.99`, the format the storefront has always
//! written.

use core::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of decimal places shown to shoppers.
pub const MONEY_SCALE: u32 = 2;

/// A price in the store currency (USD).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price from a decimal amount in dollars.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from an integer number of cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, MONEY_SCALE))
    }

    /// The amount in dollars.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price multiplied by a line quantity (unrounded).
    #[must_use]
    pub fn times(&self, quantity: u32) -> Decimal {
        self.0 * Decimal::from(quantity)
    }
}

/// Round a money amount to cents, midpoint away from zero.
///
/// Matches what `toFixed(2)` shows for the decimal value of the amount.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", round_money(self.0))
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self
            .0
            .to_f64()
            .ok_or_else(|| serde::ser::Error::custom("price is not representable as a number"))?;
        serializer.serialize_f64(value)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PriceVisitor)
    }
}

struct PriceVisitor;

impl Visitor<'_> for PriceVisitor {
    type Value = Price;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a price as a JSON number or decimal string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Price(Decimal::from(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Price(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        if !v.is_finite() {
            return Err(E::custom("price must be finite"));
        }
        // `Display` for f64 yields the shortest string that round-trips, so
        // 39.99 becomes exactly 39.99 rather than its binary approximation.
        Decimal::from_str(&v.to_string()).map(Price).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Decimal::from_str(v.trim()).map(Price).map_err(E::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        assert_eq!(Price::from_cents(3999).amount(), Decimal::new(3999, 2));
        assert_eq!(Price::from_cents(-150).amount(), Decimal::new(-150, 2));
    }

    #[test]
    fn test_serializes_as_number() {
        let price = Price::from_cents(3999);
        assert_eq!(serde_json::to_string(&price).unwrap(), "39.99");
    }

    #[test]
    fn test_deserializes_float_exactly() {
        let price: Price = serde_json::from_str("39.99").unwrap();
        assert_eq!(price.amount(), Decimal::new(3999, 2));

        let price: Price = serde_json::from_str("0.1").unwrap();
        assert_eq!(price.times(3), Decimal::new(3, 1));
    }

    #[test]
    fn test_deserializes_integers_and_strings() {
        let price: Price = serde_json::from_str("40").unwrap();
        assert_eq!(price.amount(), Decimal::from(40));

        let price: Price = serde_json::from_str("\"12.50\"").unwrap();
        assert_eq!(price, Price::from_cents(1250));
    }

    #[test]
    fn test_rejects_non_numeric() {
        assert!(serde_json::from_str::<Price>("\"twelve\"").is_err());
        assert!(serde_json::from_str::<Price>("true").is_err());
    }

    #[test]
    fn test_round_money_midpoint() {
        assert_eq!(round_money(Decimal::new(1005, 3)), Decimal::new(101, 2));
        assert_eq!(round_money(Decimal::new(1004, 3)), Decimal::new(100, 2));
        assert_eq!(round_money(Decimal::new(3550, 2)), Decimal::new(355, 1));
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::from_cents(4599).to_string(), "$45.99");
        assert_eq!(Price::new(Decimal::from(5)).to_string(), "$5.00");
    }
}
