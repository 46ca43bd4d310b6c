//! Two-decimal currency amounts.
//!
//! All order totals and line prices in the store are non-negative amounts
//! with at most two decimal places, backed by [`rust_decimal::Decimal`] so
//! arithmetic is exact. Currency is implicitly the store currency; there is
//! no multi-currency settlement.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Money`] value.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// Amount is negative.
    #[error("amount cannot be negative")]
    Negative,
    /// Amount carries more than two decimal places.
    #[error("amount cannot be more precise than cents")]
    SubCent,
}

/// A non-negative currency amount with cent precision.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a `Money` value from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`] for negative amounts and
    /// [`MoneyError::SubCent`] for amounts with more than two decimal places.
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }

        if amount.round_dp(2) != amount {
            return Err(MoneyError::SubCent);
        }

        Ok(Self(amount.normalize()))
    }

    /// Create a `Money` value from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2).normalize())
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Checked addition.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Multiply by an item quantity.
    ///
    /// Returns `None` on overflow.
    #[must_use]
    pub fn times(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(Decimal::from(quantity)).map(Self)
    }

    /// Whether this amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

// SQLx support (with postgres feature): stored as NUMERIC
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are constrained non-negative by the schema
        Ok(Self(amount.normalize()))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accepts_two_decimals() {
        assert!(Money::new(Decimal::new(1999, 2)).is_ok());
        assert!(Money::new(Decimal::ZERO).is_ok());
        assert!(Money::new(Decimal::new(10, 0)).is_ok());
    }

    #[test]
    fn test_new_rejects_negative() {
        assert_eq!(Money::new(Decimal::new(-1, 2)), Err(MoneyError::Negative));
    }

    #[test]
    fn test_new_rejects_sub_cent() {
        assert_eq!(Money::new(Decimal::new(1999, 3)), Err(MoneyError::SubCent));
    }

    #[test]
    fn test_from_cents() {
        assert_eq!(
            Money::from_cents(1999),
            Money::new(Decimal::new(1999, 2)).unwrap()
        );
        assert_eq!(Money::from_cents(0), Money::ZERO);
    }

    #[test]
    fn test_times_and_add() {
        let five = Money::from_cents(500);
        let ten = Money::from_cents(1000);
        let twenty = Money::from_cents(2000);

        let total = ten
            .times(1)
            .unwrap()
            .checked_add(five.times(2).unwrap())
            .unwrap();
        assert_eq!(total, twenty);
    }

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(1990).to_string(), "19.90");
    }

    #[test]
    fn test_normalized_equality() {
        // 5.00 and 5 are the same amount
        assert_eq!(
            Money::new(Decimal::new(500, 2)).unwrap(),
            Money::new(Decimal::new(5, 0)).unwrap()
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        let m = Money::from_cents(2000);
        let json = serde_json::to_string(&m).unwrap();
        let parsed: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, m);
    }
}
