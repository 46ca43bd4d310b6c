//! HTTP route handlers.
//!
//! All handlers speak JSON. State-mutating endpoints respond with the
//! `{success, message, ...}` envelope; error responses use the same shape
//! via [`crate::error::AppError`].

pub mod account;
pub mod admin_orders;
pub mod auth;
pub mod orders;

use axum::Router;
use serde::Serialize;

use crate::state::AppState;

/// Plain acknowledgement body for mutations with no extra payload.
#[derive(Debug, Serialize)]
pub struct ApiMessage {
    pub success: bool,
    pub message: String,
}

impl ApiMessage {
    /// Successful acknowledgement with a short human-readable message.
    #[must_use]
    pub fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_owned(),
        }
    }
}

/// Build the full application router.
#[must_use]
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(account::routes())
        .merge(auth::routes())
        .merge(orders::routes())
        .merge(admin_orders::routes())
}
