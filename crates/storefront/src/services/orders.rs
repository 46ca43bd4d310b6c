//! Order lifecycle service.
//!
//! Owns order creation (one transaction covering address, order, line items,
//! and the optional pre-verified receipt), order reads with ownership checks,
//! and fulfillment status transitions.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use thiserror::Error;

use harbor_thread_core::{Money, OrderId, OrderStatus, PaymentMethod, UserId};

use crate::db::{
    AddressRepository, OrderItemRepository, OrderRepository, ReceiptRepository, RepositoryError,
    UserRepository,
};
use crate::models::address::{Address, NewAddress};
use crate::models::order::{CartLine, Order, OrderItem, PaymentReceipt};
use crate::models::session::CurrentUser;
use crate::services::notify::Notifier;

/// Longest accepted product name snapshot.
const MAX_PRODUCT_NAME_LENGTH: usize = 512;

/// Longest accepted gateway transaction reference.
const MAX_TRANSACTION_REF_LENGTH: usize = 128;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Malformed or missing input, detected before any write.
    #[error("{0}")]
    Validation(String),

    /// The caller has no resolvable account.
    #[error("account not found")]
    AccountNotFound,

    /// The order does not exist (or is not visible to the caller).
    #[error("order not found")]
    NotFound,

    /// Store-level failure, including an aborted transaction.
    #[error("persistence failure: {0}")]
    Persistence(#[from] RepositoryError),
}

// =============================================================================
// Request / Response Types
// =============================================================================

/// Checkout address fields as submitted by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressInput {
    pub recipient_name: String,
    pub email: String,
    pub street_address: String,
    pub city: String,
    pub state_province: String,
    pub postal_code: String,
    pub phone: String,
    #[serde(default)]
    pub is_default: bool,
}

/// A cart line as submitted by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct CartItemInput {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// Reference to a payment already captured by the gateway simulation.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayCapture {
    /// Gateway transaction reference.
    pub reference: String,
    /// When the gateway captured the payment.
    #[serde(default)]
    pub captured_at: Option<DateTime<Utc>>,
}

/// A complete checkout request.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub address: AddressInput,
    pub payment_method: String,
    pub items: Vec<CartItemInput>,
    pub total_amount: Decimal,
    #[serde(default)]
    pub transaction: Option<GatewayCapture>,
}

/// An order with its shipping snapshot, line items, and receipt, as returned
/// to the caller.
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub shipping_address: Address,
    pub items: Vec<OrderItem>,
    pub receipt: Option<PaymentReceipt>,
}

/// Everything validated and ready to write, produced before `begin()`.
struct PreparedOrder {
    id: OrderId,
    user_id: UserId,
    address: NewAddress,
    status: OrderStatus,
    payment_method: PaymentMethod,
    total: Money,
    lines: Vec<CartLine>,
    capture: Option<GatewayCapture>,
}

// =============================================================================
// Service
// =============================================================================

/// Order lifecycle service.
pub struct OrderService<'a> {
    pool: &'a PgPool,
    users: UserRepository<'a>,
    orders: OrderRepository<'a>,
    items: OrderItemRepository<'a>,
    receipts: ReceiptRepository<'a>,
    addresses: AddressRepository<'a>,
    notifier: Notifier,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            users: UserRepository::new(pool),
            orders: OrderRepository::new(pool),
            items: OrderItemRepository::new(pool),
            receipts: ReceiptRepository::new(pool),
            addresses: AddressRepository::new(pool),
            notifier: Notifier::new(),
        }
    }

    /// Place an order: address, order row, line items, and (for captured card
    /// payments) a pre-verified receipt, written as one atomic unit.
    ///
    /// Validation runs entirely before the transaction opens, so a rejected
    /// request never costs a connection checkout. The caller's identity comes
    /// from the session; any user id in the request body is ignored.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Validation` for malformed input,
    /// `OrderError::AccountNotFound` if the session user no longer exists,
    /// and `OrderError::Persistence` if the transaction aborts (after
    /// rollback; partial writes are never observable).
    pub async fn create_order(
        &self,
        caller: &CurrentUser,
        request: CreateOrderRequest,
    ) -> Result<OrderId, OrderError> {
        // All validation happens before begin()
        let payment_method = PaymentMethod::from_str(&request.payment_method)
            .map_err(|e| OrderError::Validation(e.to_string()))?;
        let lines = validate_items(&request.items)?;
        let total = validate_total(&lines, request.total_amount)?;
        let address = validate_address(&request.address)?;
        let capture = validate_capture(request.transaction)?;

        // Resolve the caller against the database; the session may outlive
        // the account.
        let user = self
            .users
            .get_by_id(caller.id)
            .await?
            .ok_or(OrderError::AccountNotFound)?;

        let prepared = PreparedOrder {
            id: OrderId::generate(),
            user_id: user.id,
            address,
            status: initial_status(payment_method, capture.is_some()),
            payment_method,
            total,
            lines,
            capture,
        };

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        match write_order(&mut tx, &prepared).await {
            Ok(()) => {
                tx.commit().await.map_err(RepositoryError::from)?;
            }
            Err(e) => {
                // Surface the original failure; a failed rollback only warns.
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(
                        error = %rollback_err,
                        order_id = %prepared.id,
                        "rollback failed after aborted order creation"
                    );
                }
                return Err(e);
            }
        }

        tracing::info!(
            order_id = %prepared.id,
            user_id = %prepared.user_id,
            status = %prepared.status,
            total = %prepared.total,
            "order created"
        );

        Ok(prepared.id)
    }

    /// Fetch an order with its items and receipt.
    ///
    /// Admins see every order; customers see their own. For anyone else the
    /// order does not exist, so order tokens cannot be probed.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if absent or not visible,
    /// `OrderError::Persistence` on store failure.
    pub async fn get_order(
        &self,
        caller: &CurrentUser,
        order_id: &OrderId,
    ) -> Result<OrderDetail, OrderError> {
        let order = self
            .orders
            .get_by_id(order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        if !caller.role.is_admin() && order.user_id != caller.id {
            return Err(OrderError::NotFound);
        }

        // The FK guarantees the snapshot exists; a missing row is corruption.
        let shipping_address = self
            .addresses
            .get_by_id(order.address_id)
            .await?
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "order {} references a missing address",
                    order.id
                ))
            })
            .map_err(OrderError::Persistence)?;

        let items = self.items.list_for_order(order_id).await?;
        let receipt = self.receipts.get_for_order(order_id).await?;

        Ok(OrderDetail {
            order,
            shipping_address,
            items,
            receipt,
        })
    }

    /// List the caller's saved addresses, default first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Persistence` on store failure.
    pub async fn list_addresses(&self, caller: &CurrentUser) -> Result<Vec<Address>, OrderError> {
        Ok(self.addresses.list_for_user(caller.id).await?)
    }

    /// List orders: a customer's own, or every order for an admin.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Persistence` on store failure.
    pub async fn list_orders(&self, caller: &CurrentUser) -> Result<Vec<Order>, OrderError> {
        let orders = if caller.role.is_admin() {
            self.orders.list_all().await?
        } else {
            self.orders.list_for_user(caller.id).await?
        };

        Ok(orders)
    }

    /// Move an order to an explicitly named target status (admin only; the
    /// route layer enforces the role).
    ///
    /// The target must be one of the enumerated statuses, parsed strictly.
    /// Transitions out of a terminal status are rejected; any other jump is
    /// accepted as an admin override. Every transition is audit-logged with
    /// the acting admin.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Validation` for an unknown target or a terminal
    /// source, `OrderError::NotFound` if the order is absent.
    pub async fn update_status(
        &self,
        admin: &CurrentUser,
        order_id: &OrderId,
        target: &str,
    ) -> Result<Order, OrderError> {
        let target = OrderStatus::from_str(target)
            .map_err(|e| OrderError::Validation(e.to_string()))?;

        let order = self
            .orders
            .get_by_id(order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        if order.status.is_terminal() {
            return Err(OrderError::Validation(format!(
                "order is already {} and cannot change status",
                order.status
            )));
        }

        let updated = self
            .orders
            .update_status(order_id, target)
            .await?
            .ok_or(OrderError::NotFound)?;

        tracing::info!(
            order_id = %order_id,
            previous_status = %order.status,
            new_status = %updated.status,
            admin_id = %admin.id,
            "order status updated"
        );

        if order.status != updated.status {
            self.notifier.order_status_changed(&updated, order.status);
        }

        Ok(updated)
    }

    /// Cancel the caller's own order, allowed only while it is still pending
    /// manual payment review.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if absent or owned by someone else,
    /// `OrderError::Validation` if the order is past `pending`.
    pub async fn cancel_own_order(
        &self,
        caller: &CurrentUser,
        order_id: &OrderId,
    ) -> Result<Order, OrderError> {
        let order = self
            .orders
            .get_by_id(order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        if order.user_id != caller.id {
            return Err(OrderError::NotFound);
        }

        if order.status != OrderStatus::Pending {
            return Err(OrderError::Validation(
                "only pending orders can be cancelled".to_owned(),
            ));
        }

        let updated = self
            .orders
            .update_status(order_id, OrderStatus::Cancelled)
            .await?
            .ok_or(OrderError::NotFound)?;

        tracing::info!(
            order_id = %order_id,
            previous_status = %order.status,
            new_status = %updated.status,
            user_id = %caller.id,
            "order cancelled by owner"
        );

        self.notifier.order_status_changed(&updated, order.status);

        Ok(updated)
    }
}

/// Write the full order unit on an open transaction.
///
/// Statement order matters: the address row must exist before the order row
/// references it, and the order row before its items and receipt.
async fn write_order(
    conn: &mut PgConnection,
    prepared: &PreparedOrder,
) -> Result<(), OrderError> {
    let address_id =
        AddressRepository::create(&mut *conn, prepared.user_id, &prepared.address).await?;

    OrderRepository::create(
        &mut *conn,
        &prepared.id,
        prepared.user_id,
        address_id,
        prepared.status,
        prepared.payment_method,
        prepared.total,
    )
    .await?;

    for line in &prepared.lines {
        OrderItemRepository::create(&mut *conn, &prepared.id, line).await?;
    }

    if let Some(capture) = &prepared.capture {
        ReceiptRepository::create_preverified(
            &mut *conn,
            &prepared.id,
            &capture.reference,
            capture.captured_at,
        )
        .await?;
    }

    Ok(())
}

// =============================================================================
// Validation
// =============================================================================

/// Validate cart lines: non-empty cart, positive quantities, non-negative
/// cent-precision prices, present product references.
fn validate_items(inputs: &[CartItemInput]) -> Result<Vec<CartLine>, OrderError> {
    if inputs.is_empty() {
        return Err(OrderError::Validation("cart cannot be empty".to_owned()));
    }

    let mut lines = Vec::with_capacity(inputs.len());
    for (index, input) in inputs.iter().enumerate() {
        let position = index + 1;

        let product_id = input.product_id.trim();
        if product_id.is_empty() {
            return Err(OrderError::Validation(format!(
                "item {position}: product reference is required"
            )));
        }

        let product_name = input.product_name.trim();
        if product_name.is_empty() {
            return Err(OrderError::Validation(format!(
                "item {position}: product name is required"
            )));
        }
        if product_name.len() > MAX_PRODUCT_NAME_LENGTH {
            return Err(OrderError::Validation(format!(
                "item {position}: product name is too long"
            )));
        }

        if input.quantity < 1 {
            return Err(OrderError::Validation(format!(
                "item {position}: quantity must be at least 1"
            )));
        }

        let unit_price = Money::new(input.unit_price).map_err(|e| {
            OrderError::Validation(format!("item {position}: invalid unit price: {e}"))
        })?;

        lines.push(CartLine {
            product_id: product_id.to_owned(),
            product_name: product_name.to_owned(),
            quantity: input.quantity,
            unit_price,
        });
    }

    Ok(lines)
}

/// Recompute the cart total and check the declared amount against it.
///
/// The declared total is never trusted: the authoritative amount is always
/// `Σ quantity × unit_price` over the validated lines.
fn validate_total(lines: &[CartLine], declared: Decimal) -> Result<Money, OrderError> {
    let declared = Money::new(declared)
        .map_err(|e| OrderError::Validation(format!("invalid total amount: {e}")))?;

    let mut computed = Money::ZERO;
    for line in lines {
        let line_total = line
            .line_total()
            .ok_or_else(|| OrderError::Validation("cart total overflow".to_owned()))?;
        computed = computed
            .checked_add(line_total)
            .ok_or_else(|| OrderError::Validation("cart total overflow".to_owned()))?;
    }

    if computed != declared {
        return Err(OrderError::Validation(format!(
            "declared total {declared} does not match item total {computed}"
        )));
    }

    Ok(computed)
}

/// Validate the checkout address fields.
fn validate_address(input: &AddressInput) -> Result<NewAddress, OrderError> {
    fn required(value: &str, field: &str) -> Result<String, OrderError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(OrderError::Validation(format!("{field} is required")));
        }
        Ok(trimmed.to_owned())
    }

    let email = harbor_thread_core::Email::parse(input.email.trim())
        .map_err(|e| OrderError::Validation(format!("invalid contact email: {e}")))?;

    Ok(NewAddress {
        recipient_name: required(&input.recipient_name, "recipient name")?,
        email,
        street_address: required(&input.street_address, "street address")?,
        city: required(&input.city, "city")?,
        state_province: required(&input.state_province, "state/province")?,
        postal_code: required(&input.postal_code, "postal code")?,
        phone: required(&input.phone, "phone")?,
        is_default: input.is_default,
    })
}

/// Validate the optional gateway capture reference.
fn validate_capture(
    capture: Option<GatewayCapture>,
) -> Result<Option<GatewayCapture>, OrderError> {
    let Some(capture) = capture else {
        return Ok(None);
    };

    let reference = capture.reference.trim();
    if reference.is_empty() {
        return Err(OrderError::Validation(
            "transaction reference cannot be empty".to_owned(),
        ));
    }
    if reference.len() > MAX_TRANSACTION_REF_LENGTH {
        return Err(OrderError::Validation(
            "transaction reference is too long".to_owned(),
        ));
    }

    Ok(Some(GatewayCapture {
        reference: reference.to_owned(),
        captured_at: capture.captured_at,
    }))
}

/// Initial status for a new order.
///
/// Card payments with a gateway capture skip manual review and start in
/// `processing`; everything else waits in `pending` for receipt verification.
const fn initial_status(payment_method: PaymentMethod, has_capture: bool) -> OrderStatus {
    match (payment_method, has_capture) {
        (PaymentMethod::Card, true) => OrderStatus::Processing,
        _ => OrderStatus::Pending,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(quantity: u32, cents: i64) -> CartItemInput {
        CartItemInput {
            product_id: "prod-1".to_owned(),
            product_name: "Linen Shirt".to_owned(),
            quantity,
            unit_price: Decimal::new(cents, 2),
        }
    }

    fn address_input() -> AddressInput {
        AddressInput {
            recipient_name: "Jules Verne".to_owned(),
            email: "jules@example.com".to_owned(),
            street_address: "11 Quai Crauk".to_owned(),
            city: "Nantes".to_owned(),
            state_province: "Loire-Atlantique".to_owned(),
            postal_code: "44000".to_owned(),
            phone: "+33 2 40 00 00 00".to_owned(),
            is_default: false,
        }
    }

    #[test]
    fn test_validate_items_empty_cart() {
        let err = validate_items(&[]).unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
    }

    #[test]
    fn test_validate_items_zero_quantity() {
        let err = validate_items(&[item(0, 1000)]).unwrap_err();
        let OrderError::Validation(msg) = err else {
            panic!("expected validation error");
        };
        assert!(msg.contains("quantity"));
    }

    #[test]
    fn test_validate_items_negative_price() {
        let err = validate_items(&[item(1, -100)]).unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
    }

    #[test]
    fn test_validate_items_sub_cent_price() {
        let mut bad = item(1, 1000);
        bad.unit_price = Decimal::new(12345, 3);
        assert!(validate_items(&[bad]).is_err());
    }

    #[test]
    fn test_validate_items_blank_name() {
        let mut bad = item(1, 1000);
        bad.product_name = "   ".to_owned();
        assert!(validate_items(&[bad]).is_err());
    }

    #[test]
    fn test_validate_items_ok() {
        let lines = validate_items(&[item(1, 1000), item(2, 500)]).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].unit_price, Money::from_cents(1000));
        assert_eq!(lines[1].quantity, 2);
    }

    #[test]
    fn test_validate_total_matches_item_sum() {
        // qty 1 @ 10.00 + qty 2 @ 5.00 = 20.00
        let lines = validate_items(&[item(1, 1000), item(2, 500)]).unwrap();
        let total = validate_total(&lines, Decimal::new(2000, 2)).unwrap();
        assert_eq!(total, Money::from_cents(2000));
    }

    #[test]
    fn test_validate_total_rejects_mismatch() {
        let lines = validate_items(&[item(1, 1000), item(2, 500)]).unwrap();
        let err = validate_total(&lines, Decimal::new(1999, 2)).unwrap_err();
        let OrderError::Validation(msg) = err else {
            panic!("expected validation error");
        };
        assert!(msg.contains("does not match"));
    }

    #[test]
    fn test_validate_total_rejects_negative_declared() {
        let lines = validate_items(&[item(1, 1000)]).unwrap();
        assert!(validate_total(&lines, Decimal::new(-1000, 2)).is_err());
    }

    #[test]
    fn test_validate_total_scale_insensitive() {
        // "20" and "20.00" declare the same amount
        let lines = validate_items(&[item(2, 1000)]).unwrap();
        assert!(validate_total(&lines, Decimal::new(20, 0)).is_ok());
    }

    #[test]
    fn test_validate_address_ok() {
        let address = validate_address(&address_input()).unwrap();
        assert_eq!(address.city, "Nantes");
        assert!(!address.is_default);
    }

    #[test]
    fn test_validate_address_missing_city() {
        let mut input = address_input();
        input.city = " ".to_owned();
        let err = validate_address(&input).unwrap_err();
        let OrderError::Validation(msg) = err else {
            panic!("expected validation error");
        };
        assert!(msg.contains("city"));
    }

    #[test]
    fn test_validate_address_bad_email() {
        let mut input = address_input();
        input.email = "not-an-email".to_owned();
        assert!(validate_address(&input).is_err());
    }

    #[test]
    fn test_validate_capture_empty_reference() {
        let capture = GatewayCapture {
            reference: "  ".to_owned(),
            captured_at: None,
        };
        assert!(validate_capture(Some(capture)).is_err());
    }

    #[test]
    fn test_validate_capture_absent_is_ok() {
        assert!(validate_capture(None).unwrap().is_none());
    }

    #[test]
    fn test_initial_status_card_with_capture() {
        assert_eq!(
            initial_status(PaymentMethod::Card, true),
            OrderStatus::Processing
        );
    }

    #[test]
    fn test_initial_status_card_without_capture() {
        assert_eq!(
            initial_status(PaymentMethod::Card, false),
            OrderStatus::Pending
        );
    }

    #[test]
    fn test_initial_status_transfer_with_reference() {
        // A reference on a non-card method still goes through manual review
        assert_eq!(
            initial_status(PaymentMethod::BankTransfer, true),
            OrderStatus::Pending
        );
    }
}
