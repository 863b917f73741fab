//! Fixed-point decimal types for prices and amounts
//!
//! Uses rust_decimal for deterministic arithmetic. Both types carry the
//! storage scale of decimal(20,10): ten fractional digits, ten integral
//! digits. Binary floating point is never used for arithmetic or for
//! ordered-map keys; it appears only at the JSON boundary, where the wire
//! format is a plain number.

use crate::errors::InvalidRequest;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Fractional digits kept by prices and amounts.
pub const SCALE: u32 = 10;

/// Upper bound (exclusive): ten integral digits.
fn max_magnitude() -> Decimal {
    Decimal::from(10_000_000_000u64)
}

fn rescale(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Limit price of an order. Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(Decimal);

impl Price {
    /// Create a new Price.
    ///
    /// # Panics
    /// Panics if the value is not representable as a positive decimal(20,10).
    pub fn new(value: Decimal) -> Self {
        Self::try_new(value).expect("price must be a positive decimal(20,10)")
    }

    /// Try to create a Price, returning None if the value is zero, negative
    /// or too large for the storage scale.
    pub fn try_new(value: Decimal) -> Option<Self> {
        let value = rescale(value);
        if value > Decimal::ZERO && value < max_magnitude() {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn from_u64(value: u64) -> Self {
        Self::new(Decimal::from(value))
    }

    pub fn from_str(s: &str) -> Result<Self, rust_decimal::Error> {
        Ok(Self::new(Decimal::from_str(s)?))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::NAN)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// The wire format carries prices as JSON numbers.
impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_f64(self.to_f64())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = f64::deserialize(deserializer)?;
        let decimal = Decimal::from_f64_retain(raw).ok_or_else(|| {
            serde::de::Error::custom(InvalidRequest::Price("not a finite number".to_string()))
        })?;
        Self::try_new(decimal).ok_or_else(|| {
            serde::de::Error::custom(InvalidRequest::Price(
                "must be a positive decimal(20,10)".to_string(),
            ))
        })
    }
}

/// Remaining amount of an order. Positive at rest; zero only as the result
/// of a subtraction during matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    /// Create a new Amount.
    ///
    /// # Panics
    /// Panics if the value is not representable as a positive decimal(20,10).
    pub fn new(value: Decimal) -> Self {
        Self::try_new(value).expect("amount must be a positive decimal(20,10)")
    }

    /// Try to create an Amount, returning None if the value is zero,
    /// negative or too large for the storage scale.
    pub fn try_new(value: Decimal) -> Option<Self> {
        let value = rescale(value);
        if value > Decimal::ZERO && value < max_magnitude() {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn from_u64(value: u64) -> Self {
        Self::new(Decimal::from(value))
    }

    pub fn from_str(s: &str) -> Result<Self, rust_decimal::Error> {
        Ok(Self::new(Decimal::from_str(s)?))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::NAN)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == Decimal::ZERO
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        assert!(self.0 >= rhs.0, "amount subtraction would go negative");
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_f64(self.to_f64())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = f64::deserialize(deserializer)?;
        let decimal = Decimal::from_f64_retain(raw).ok_or_else(|| {
            serde::de::Error::custom(InvalidRequest::Amount("not a finite number".to_string()))
        })?;
        Self::try_new(decimal).ok_or_else(|| {
            serde::de::Error::custom(InvalidRequest::Amount(
                "must be a positive decimal(20,10)".to_string(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_creation() {
        let price = Price::from_u64(100);
        assert_eq!(price.as_decimal(), Decimal::from(100));
    }

    #[test]
    fn test_price_rejects_non_positive() {
        assert!(Price::try_new(Decimal::ZERO).is_none());
        assert!(Price::try_new(Decimal::from(-5)).is_none());
    }

    #[test]
    fn test_price_rejects_overflow() {
        assert!(Price::try_new(Decimal::from(10_000_000_000u64)).is_none());
        assert!(Price::try_new(Decimal::from(9_999_999_999u64)).is_some());
    }

    #[test]
    fn test_price_rescales_to_ten_digits() {
        let price = Price::from_str("1.00000000005").unwrap();
        assert_eq!(price, Price::from_str("1.0000000001").unwrap());
    }

    #[test]
    fn test_price_ordering_is_by_value() {
        // 1.5 and 1.50 are the same key in an ordered map.
        let a = Price::from_str("1.5").unwrap();
        let b = Price::from_str("1.50").unwrap();
        assert_eq!(a, b);
        assert!(Price::from_str("1.4").unwrap() < a);
    }

    #[test]
    fn test_price_serializes_as_number() {
        let price = Price::from_str("100.25").unwrap();
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "100.25");
    }

    #[test]
    fn test_price_deserializes_from_number() {
        let price: Price = serde_json::from_str("100.25").unwrap();
        assert_eq!(price, Price::from_str("100.25").unwrap());

        // Binary float noise is absorbed by the decimal rescale.
        let price: Price = serde_json::from_str("0.1").unwrap();
        assert_eq!(price, Price::from_str("0.1").unwrap());
    }

    #[test]
    fn test_price_rejects_bad_wire_values() {
        let err = serde_json::from_str::<Price>("0").unwrap_err();
        assert!(err.to_string().contains("invalid price"));
        assert!(serde_json::from_str::<Price>("-3").is_err());
        assert!(serde_json::from_str::<Price>("\"abc\"").is_err());
    }

    #[test]
    fn test_amount_arithmetic() {
        let a = Amount::from_str("2.5").unwrap();
        let b = Amount::from_str("1.5").unwrap();
        assert_eq!(a + b, Amount::from_str("4.0").unwrap());
        assert_eq!(a - b, Amount::from_str("1.0").unwrap());
    }

    #[test]
    fn test_amount_sub_to_zero() {
        let a = Amount::from_str("2.5").unwrap();
        let b = a - a;
        assert!(b.is_zero());
    }

    #[test]
    #[should_panic(expected = "amount subtraction would go negative")]
    fn test_amount_sub_negative_panics() {
        let a = Amount::from_str("1.0").unwrap();
        let b = Amount::from_str("2.0").unwrap();
        let _ = a - b;
    }

    #[test]
    fn test_amount_rejects_zero_on_wire() {
        let err = serde_json::from_str::<Amount>("0").unwrap_err();
        assert!(err.to_string().contains("invalid amount"));
    }

    #[test]
    fn test_deterministic_comparison() {
        // The classic 0.1 + 0.2 drift does not exist in decimal space.
        let a = Amount::from_str("0.1").unwrap() + Amount::from_str("0.2").unwrap();
        assert_eq!(a, Amount::from_str("0.3").unwrap());
    }
}
