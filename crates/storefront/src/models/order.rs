//! Order, line item, and payment receipt models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use harbor_thread_core::{
    AddressId, Money, OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus, ReceiptId,
    UserId,
};

/// A placed order.
///
/// The shipping address and line items are snapshots taken at creation time;
/// later catalog or address edits never change a placed order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    /// Opaque order token.
    pub id: OrderId,
    /// Owning user.
    pub user_id: UserId,
    /// Shipping address snapshot reference.
    pub address_id: AddressId,
    /// Fulfillment stage.
    pub status: OrderStatus,
    /// How the customer pays.
    pub payment_method: PaymentMethod,
    /// Payment verification outcome (independent of `status`).
    pub payment_status: PaymentStatus,
    /// Order total, validated against the line items at creation.
    pub total_amount: Money,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
    /// When the order was last modified.
    pub updated_at: DateTime<Utc>,
}

/// A single order line.
///
/// Immutable after creation; the product name and unit price are snapshots
/// so historical orders stay readable after catalog edits.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    /// Database ID.
    pub id: OrderItemId,
    /// Owning order.
    pub order_id: OrderId,
    /// Catalog product reference (opaque to this system).
    pub product_id: String,
    /// Product name at purchase time.
    pub product_name: String,
    /// Number of units, always at least 1.
    pub quantity: u32,
    /// Unit price at purchase time.
    pub price: Money,
}

/// Payment evidence submitted for manual verification.
///
/// At most one active receipt exists per order; resubmission overwrites the
/// evidence and resets the verification state.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    /// Database ID.
    pub id: ReceiptId,
    /// Owning order.
    pub order_id: OrderId,
    /// Opaque reference to the stored evidence image or document.
    pub receipt_image: String,
    /// When the evidence was uploaded.
    pub upload_date: DateTime<Utc>,
    /// Whether an admin has verified the payment.
    pub verified: bool,
    /// When verification happened.
    pub verified_date: Option<DateTime<Utc>>,
    /// The admin who verified, if any (absent for gateway-captured payments).
    pub verified_by: Option<UserId>,
    /// Free-form admin notes (verification note or rejection reason).
    pub notes: Option<String>,
}

/// A validated cart line ready to be inserted.
#[derive(Debug, Clone)]
pub struct CartLine {
    /// Catalog product reference.
    pub product_id: String,
    /// Product name snapshot.
    pub product_name: String,
    /// Units ordered, at least 1.
    pub quantity: u32,
    /// Unit price, non-negative with cent precision.
    pub unit_price: Money,
}

impl CartLine {
    /// The line total (`quantity × unit_price`).
    ///
    /// Returns `None` on arithmetic overflow.
    #[must_use]
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.times(self.quantity)
    }
}
