//! Customer order handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use harbor_thread_core::{OrderId, OrderStatus};

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::order::Order;
use crate::routes::ApiMessage;
use crate::services::orders::{CreateOrderRequest, OrderDetail, OrderService};
use crate::services::payments::PaymentVerificationService;
use crate::state::AppState;

/// Customer order routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(create_order).get(list_orders))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/cancel", post(cancel_order))
        .route("/orders/{id}/receipt", post(submit_receipt))
}

/// Parse an order token from the path.
fn parse_order_id(raw: &str) -> Result<OrderId> {
    OrderId::parse(raw).map_err(|_| AppError::BadRequest("invalid order id".to_owned()))
}

// =============================================================================
// Input / Response Types
// =============================================================================

/// Response for a successful checkout.
#[derive(Debug, Serialize)]
struct CreateOrderResponse {
    success: bool,
    message: String,
    order_id: OrderId,
    status: OrderStatus,
}

/// Input for submitting payment evidence.
#[derive(Debug, Deserialize)]
struct SubmitReceiptInput {
    /// Opaque reference to the uploaded evidence (storage is external).
    receipt_image: String,
    /// Payment method the evidence belongs to.
    payment_method: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Place an order.
#[instrument(skip_all, fields(user_id = %user.id))]
async fn create_order(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(input): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>)> {
    let service = OrderService::new(state.pool());
    let order_id = service.create_order(&user, input).await?;

    // Read back the committed order for the response status
    let detail = service.get_order(&user, &order_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            success: true,
            message: "order placed".to_owned(),
            order_id,
            status: detail.order.status,
        }),
    ))
}

/// List orders: own orders for a customer, every order for an admin.
#[instrument(skip_all, fields(user_id = %user.id))]
async fn list_orders(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Order>>> {
    let service = OrderService::new(state.pool());
    let orders = service.list_orders(&user).await?;

    Ok(Json(orders))
}

/// Fetch one order with items and receipt.
#[instrument(skip_all, fields(user_id = %user.id, order_id = %id))]
async fn get_order(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OrderDetail>> {
    let order_id = parse_order_id(&id)?;

    let service = OrderService::new(state.pool());
    let detail = service.get_order(&user, &order_id).await?;

    Ok(Json(detail))
}

/// Cancel the caller's own pending order.
#[instrument(skip_all, fields(user_id = %user.id, order_id = %id))]
async fn cancel_order(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiMessage>> {
    let order_id = parse_order_id(&id)?;

    let service = OrderService::new(state.pool());
    service.cancel_own_order(&user, &order_id).await?;

    Ok(Json(ApiMessage::ok("order cancelled")))
}

/// Submit (or resubmit) payment evidence for the caller's own order.
#[instrument(skip_all, fields(user_id = %user.id, order_id = %id))]
async fn submit_receipt(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<SubmitReceiptInput>,
) -> Result<Json<ApiMessage>> {
    let order_id = parse_order_id(&id)?;

    let service = PaymentVerificationService::new(state.pool());
    service
        .submit_receipt(&user, &order_id, &input.receipt_image, &input.payment_method)
        .await?;

    Ok(Json(ApiMessage::ok("receipt submitted for review")))
}
