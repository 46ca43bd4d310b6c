//! Shipping address models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use harbor_thread_core::{AddressId, Email, UserId};

/// A stored shipping address.
#[derive(Debug, Clone, Serialize)]
pub struct Address {
    /// Database ID.
    pub id: AddressId,
    /// Owning user.
    pub user_id: UserId,
    /// Name of the person receiving the parcel.
    pub recipient_name: String,
    /// Contact email for delivery updates.
    pub email: Email,
    /// Street address line.
    pub street_address: String,
    /// City.
    pub city: String,
    /// State or province.
    pub state_province: String,
    /// Postal code.
    pub postal_code: String,
    /// Contact phone number.
    pub phone: String,
    /// Whether this is the user's default address.
    pub is_default: bool,
    /// When the address was saved.
    pub created_at: DateTime<Utc>,
}

/// A validated address ready to be inserted.
///
/// Produced by the order service after field validation; repositories never
/// see unvalidated client input.
#[derive(Debug, Clone)]
pub struct NewAddress {
    pub recipient_name: String,
    pub email: Email,
    pub street_address: String,
    pub city: String,
    pub state_province: String,
    pub postal_code: String,
    pub phone: String,
    pub is_default: bool,
}
