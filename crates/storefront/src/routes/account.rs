//! Account handlers: the caller's saved address book.

use axum::{Json, Router, extract::State, routing::get};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Address;
use crate::services::orders::OrderService;
use crate::state::AppState;

/// Account routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/account/addresses", get(list_addresses))
}

/// List the caller's saved shipping addresses, default first.
#[instrument(skip_all, fields(user_id = %user.id))]
async fn list_addresses(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Address>>> {
    let service = OrderService::new(state.pool());
    let addresses = service.list_addresses(&user).await?;

    Ok(Json(addresses))
}
