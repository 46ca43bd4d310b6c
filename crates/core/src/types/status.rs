//! Status enums for orders, payments, and users.
//!
//! Statuses are persisted as snake_case text and parsed back through strict
//! `FromStr` implementations. Parsing is exact: no case folding, no prefix
//! matching. An unknown value is an error, never a default.

use serde::{Deserialize, Serialize};

/// Error returned when parsing a status string fails.
#[derive(thiserror::Error, Debug, Clone)]
#[error("invalid {kind}: {value}")]
pub struct StatusParseError {
    /// Which enum rejected the value.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl StatusParseError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Order fulfillment stage.
///
/// The happy path runs `Pending → Processing → Shipped → InTransit →
/// Delivered → Completed`; `Cancelled` is reachable from any non-terminal
/// state. `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    InTransit,
    Delivered,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 7] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::InTransit,
        Self::Delivered,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Whether no further transitions are allowed out of this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::InTransit => "in_transit",
            Self::Delivered => "delivered",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "in_transit" => Ok(Self::InTransit),
            "delivered" => Ok(Self::Delivered),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(StatusParseError::new("order status", s)),
        }
    }
}

/// Payment verification outcome, independent of the fulfillment stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Verified,
    Rejected,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            "rejected" => Ok(Self::Rejected),
            _ => Err(StatusParseError::new("payment status", s)),
        }
    }
}

/// How the customer pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Card captured by the external gateway simulation before checkout.
    Card,
    /// Manual bank transfer, verified by staff from an uploaded receipt.
    BankTransfer,
    /// Paid in cash on delivery.
    CashOnDelivery,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Card => "card",
            Self::BankTransfer => "bank_transfer",
            Self::CashOnDelivery => "cash_on_delivery",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(Self::Card),
            "bank_transfer" => Ok(Self::BankTransfer),
            "cash_on_delivery" => Ok(Self::CashOnDelivery),
            _ => Err(StatusParseError::new("payment method", s)),
        }
    }
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular customer.
    #[default]
    User,
    /// Staff member allowed to verify payments and move orders.
    Admin,
}

impl UserRole {
    /// Whether this role grants access to the admin order surface.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(StatusParseError::new("user role", s)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_order_status_roundtrip() {
        for status in OrderStatus::ALL {
            let parsed = OrderStatus::from_str(&status.to_string()).unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_order_status_rejects_unknown() {
        for bad in ["", "PENDING", "pend", "shipped ", "in-transit", "done"] {
            assert!(OrderStatus::from_str(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_order_status_terminal() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::InTransit,
            OrderStatus::Delivered,
        ] {
            assert!(!status.is_terminal());
        }
    }

    #[test]
    fn test_payment_status_roundtrip() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Verified,
            PaymentStatus::Rejected,
        ] {
            assert_eq!(
                PaymentStatus::from_str(&status.to_string()).unwrap(),
                status
            );
        }
        assert!(PaymentStatus::from_str("refunded").is_err());
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!(
            PaymentMethod::from_str("card").unwrap(),
            PaymentMethod::Card
        );
        assert_eq!(
            PaymentMethod::from_str("bank_transfer").unwrap(),
            PaymentMethod::BankTransfer
        );
        assert!(PaymentMethod::from_str("bitcoin").is_err());
    }

    #[test]
    fn test_user_role() {
        assert!(UserRole::from_str("admin").unwrap().is_admin());
        assert!(!UserRole::from_str("user").unwrap().is_admin());
        assert!(UserRole::from_str("superuser").is_err());
    }

    #[test]
    fn test_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::InTransit).unwrap(),
            "\"in_transit\""
        );
        let parsed: OrderStatus = serde_json::from_str("\"in_transit\"").unwrap();
        assert_eq!(parsed, OrderStatus::InTransit);
    }
}
