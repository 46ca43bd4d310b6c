//! Admin order management handlers.
//!
//! All handlers here require the admin role via [`RequireAdmin`]; a logged-in
//! customer gets 403, an anonymous caller 401.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use harbor_thread_core::OrderId;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::order::Order;
use crate::services::orders::OrderService;
use crate::services::payments::PaymentVerificationService;
use crate::state::AppState;

/// Admin order routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/orders/{id}/status", post(update_status))
        .route("/admin/orders/{id}/verify-payment", post(verify_payment))
        .route("/admin/orders/{id}/reject-payment", post(reject_payment))
}

/// Parse an order token from the path.
fn parse_order_id(raw: &str) -> Result<OrderId> {
    OrderId::parse(raw).map_err(|_| AppError::BadRequest("invalid order id".to_owned()))
}

// =============================================================================
// Input / Response Types
// =============================================================================

/// Input for a status transition: the explicit target status.
#[derive(Debug, Deserialize)]
struct StatusUpdateInput {
    /// Target status (snake_case, e.g. `"shipped"`).
    status: String,
}

/// Input for payment verification.
#[derive(Debug, Deserialize)]
struct VerifyPaymentInput {
    /// Optional verification note, recorded on the receipt.
    #[serde(default)]
    note: Option<String>,
}

/// Input for payment rejection.
#[derive(Debug, Deserialize)]
struct RejectPaymentInput {
    /// Required rejection reason, recorded on the receipt.
    reason: String,
}

/// Response carrying the updated order.
#[derive(Debug, Serialize)]
struct OrderActionResponse {
    success: bool,
    message: String,
    order: Order,
}

impl OrderActionResponse {
    fn new(message: &str, order: Order) -> Self {
        Self {
            success: true,
            message: message.to_owned(),
            order,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Move an order to an explicit target status.
#[instrument(skip_all, fields(admin_id = %admin.id, order_id = %id))]
async fn update_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<StatusUpdateInput>,
) -> Result<Json<OrderActionResponse>> {
    let order_id = parse_order_id(&id)?;

    let service = OrderService::new(state.pool());
    let order = service.update_status(&admin, &order_id, &input.status).await?;

    Ok(Json(OrderActionResponse::new("order status updated", order)))
}

/// Verify an order's payment.
#[instrument(skip_all, fields(admin_id = %admin.id, order_id = %id))]
async fn verify_payment(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<VerifyPaymentInput>,
) -> Result<Json<OrderActionResponse>> {
    let order_id = parse_order_id(&id)?;

    let service = PaymentVerificationService::new(state.pool());
    let order = service
        .verify_payment(&admin, &order_id, input.note.as_deref())
        .await?;

    Ok(Json(OrderActionResponse::new("payment verified", order)))
}

/// Reject an order's payment.
#[instrument(skip_all, fields(admin_id = %admin.id, order_id = %id))]
async fn reject_payment(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<RejectPaymentInput>,
) -> Result<Json<OrderActionResponse>> {
    let order_id = parse_order_id(&id)?;

    let service = PaymentVerificationService::new(state.pool());
    let order = service
        .reject_payment(&admin, &order_id, &input.reason)
        .await?;

    Ok(Json(OrderActionResponse::new("payment rejected", order)))
}
