//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types. Orders use an opaque
//! text token ([`OrderId`]) instead of a serial integer so order references
//! are not guessable from sequence position.

use serde::{Deserialize, Serialize};

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_i32()`
/// - `From<i32>` and `Into<i32>` implementations
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use harbor_thread_core::define_id;
/// define_id!(UserId);
/// define_id!(AddressId);
///
/// let user_id = UserId::new(1);
/// let address_id = AddressId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: UserId = address_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <i32 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

// Define standard entity IDs
define_id!(UserId);
define_id!(AddressId);
define_id!(OrderItemId);
define_id!(ReceiptId);

/// Errors that can occur when parsing an [`OrderId`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum OrderIdError {
    /// The token does not start with the `ORD-` prefix.
    #[error("order id must start with ORD-")]
    MissingPrefix,
    /// The token body has the wrong length or contains invalid characters.
    #[error("order id body must be {len} alphanumeric characters")]
    MalformedBody {
        /// Expected body length.
        len: usize,
    },
}

/// An opaque order token, e.g. `ORD-7K2M9QX04ZB1RWETHJ6N`.
///
/// Orders are referenced by a random token rather than a serial integer so
/// an order URL leaks nothing about order volume and cannot be enumerated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Length of the random token body after the `ORD-` prefix.
    pub const BODY_LENGTH: usize = 20;

    /// Token prefix.
    pub const PREFIX: &'static str = "ORD-";

    /// Generate a fresh random order token.
    #[must_use]
    pub fn generate() -> Self {
        use rand::Rng;

        let body: String = rand::rng()
            .sample_iter(rand::distr::Alphanumeric)
            .take(Self::BODY_LENGTH)
            .map(|b| char::from(b).to_ascii_uppercase())
            .collect();

        Self(format!("{}{body}", Self::PREFIX))
    }

    /// Parse an `OrderId` from a string, validating the token shape.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix is missing or the body is not exactly
    /// [`Self::BODY_LENGTH`] ASCII alphanumeric characters.
    pub fn parse(s: &str) -> Result<Self, OrderIdError> {
        let body = s.strip_prefix(Self::PREFIX).ok_or(OrderIdError::MissingPrefix)?;

        if body.len() != Self::BODY_LENGTH || !body.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(OrderIdError::MalformedBody {
                len: Self::BODY_LENGTH,
            });
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for OrderId {
    type Err = OrderIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for OrderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for OrderId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for OrderId {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for OrderId {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_id_roundtrip() {
        let id = UserId::new(42);
        assert_eq!(id.as_i32(), 42);
        assert_eq!(i32::from(id), 42);
        assert_eq!(UserId::from(42), id);
    }

    #[test]
    fn test_numeric_id_display() {
        assert_eq!(AddressId::new(7).to_string(), "7");
    }

    #[test]
    fn test_numeric_id_serde_transparent() {
        let id = OrderItemId::new(5);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "5");
        let parsed: OrderItemId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_order_id_generate_shape() {
        let id = OrderId::generate();
        let s = id.as_str();
        assert!(s.starts_with("ORD-"));
        assert_eq!(s.len(), 4 + OrderId::BODY_LENGTH);
        assert!(s[4..].bytes().all(|b| b.is_ascii_alphanumeric()));
        // Regenerating must produce a different token
        assert_ne!(OrderId::generate(), id);
    }

    #[test]
    fn test_order_id_parse_valid() {
        let id = OrderId::generate();
        let parsed = OrderId::parse(id.as_str()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_order_id_parse_missing_prefix() {
        assert!(matches!(
            OrderId::parse("7K2M9QX04ZB1RWETHJ6N"),
            Err(OrderIdError::MissingPrefix)
        ));
    }

    #[test]
    fn test_order_id_parse_bad_body() {
        assert!(matches!(
            OrderId::parse("ORD-short"),
            Err(OrderIdError::MalformedBody { .. })
        ));
        assert!(matches!(
            OrderId::parse("ORD-7K2M9QX04ZB1RWETHJ6!"),
            Err(OrderIdError::MalformedBody { .. })
        ));
    }

    #[test]
    fn test_order_id_serde_transparent() {
        let id = OrderId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }
}
