//! Database operations for the storefront `PostgreSQL`.
//!
//! # Tables
//!
//! - `users` - Accounts and roles
//! - `user_addresses` - Shipping addresses
//! - `orders` - Placed orders and their lifecycle state
//! - `order_items` - Immutable line-item snapshots
//! - `payment_receipts` - Manually-submitted payment evidence
//! - `tower_sessions.session` - Session storage
//!
//! Repositories use the sqlx runtime query API over plain row structs; each
//! row struct converts into its domain model via `TryFrom`, surfacing invalid
//! stored data as [`RepositoryError::DataCorruption`].
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p harbor-thread-cli -- migrate
//! ```

pub mod addresses;
pub mod order_items;
pub mod orders;
pub mod receipts;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use order_items::OrderItemRepository;
pub use orders::OrderRepository;
pub use receipts::ReceiptRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// The pool is owned by the composition root and injected into `AppState`;
/// nothing in this crate creates a pool implicitly.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
