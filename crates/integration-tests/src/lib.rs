//! Shared support code for the integration test suite.
//!
//! The tests run against a live `PostgreSQL` instance named by
//! `TEST_DATABASE_URL` (falling back to `DATABASE_URL`) and are `#[ignore]`d
//! so `cargo test` stays green without one:
//!
//! ```bash
//! TEST_DATABASE_URL=postgres://localhost/ht_test cargo test -p harbor-thread-integration-tests -- --ignored
//! ```
//!
//! Each test creates its own throwaway users, so tests are independent and
//! can run against a shared database.

#![cfg_attr(not(test), forbid(unsafe_code))]
// Test support code: failures should panic with context, not propagate.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)]

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use harbor_thread_core::{UserId, UserRole};
use harbor_thread_storefront::models::CurrentUser;
use harbor_thread_storefront::services::orders::{
    AddressInput, CartItemInput, CreateOrderRequest, GatewayCapture,
};

/// Connect to the test database and apply migrations.
pub async fn test_pool() -> PgPool {
    dotenvy::dotenv().ok();

    let url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("set TEST_DATABASE_URL (or DATABASE_URL) to run integration tests");

    let pool = PgPool::connect(&url)
        .await
        .expect("failed to connect to test database");

    sqlx::migrate!("../storefront/migrations")
        .run(&pool)
        .await
        .expect("failed to apply migrations");

    pool
}

/// Insert a throwaway user with a unique email and return its session identity.
pub async fn create_test_user(pool: &PgPool, role: UserRole) -> CurrentUser {
    let email = format!("it-{}@test.harborandthread.com", Uuid::new_v4().simple());

    let (id,): (i32,) = sqlx::query_as(
        "INSERT INTO users (email, password_hash, role) VALUES ($1, NULL, $2) RETURNING id",
    )
    .bind(&email)
    .bind(role.to_string())
    .fetch_one(pool)
    .await
    .expect("failed to insert test user");

    CurrentUser {
        id: UserId::new(id),
        email: email.parse().unwrap(),
        role,
    }
}

/// A checkout address that passes validation.
#[must_use]
pub fn test_address() -> AddressInput {
    AddressInput {
        recipient_name: "Ada Byron".to_owned(),
        email: "ada@example.com".to_owned(),
        street_address: "12 St James's Square".to_owned(),
        city: "London".to_owned(),
        state_province: "Greater London".to_owned(),
        postal_code: "SW1Y 4JH".to_owned(),
        phone: "+44 20 0000 0000".to_owned(),
        is_default: false,
    }
}

/// A cart line input with a price in cents.
#[must_use]
pub fn test_item(product_id: &str, quantity: u32, price_cents: i64) -> CartItemInput {
    CartItemInput {
        product_id: product_id.to_owned(),
        product_name: format!("Product {product_id}"),
        quantity,
        unit_price: Decimal::new(price_cents, 2),
    }
}

/// A bank-transfer checkout request for the given items and declared total.
#[must_use]
pub fn transfer_checkout(items: Vec<CartItemInput>, total_cents: i64) -> CreateOrderRequest {
    CreateOrderRequest {
        address: test_address(),
        payment_method: "bank_transfer".to_owned(),
        items,
        total_amount: Decimal::new(total_cents, 2),
        transaction: None,
    }
}

/// A card checkout request with a gateway capture reference.
#[must_use]
pub fn card_checkout(
    items: Vec<CartItemInput>,
    total_cents: i64,
    reference: &str,
) -> CreateOrderRequest {
    CreateOrderRequest {
        address: test_address(),
        payment_method: "card".to_owned(),
        items,
        total_amount: Decimal::new(total_cents, 2),
        transaction: Some(GatewayCapture {
            reference: reference.to_owned(),
            captured_at: None,
        }),
    }
}

/// Count rows in `table` belonging to `user_id` via the given FK column.
pub async fn count_rows_for_user(pool: &PgPool, table: &str, user_id: UserId) -> i64 {
    let query = match table {
        "orders" => "SELECT COUNT(*) FROM orders WHERE user_id = $1",
        "user_addresses" => "SELECT COUNT(*) FROM user_addresses WHERE user_id = $1",
        "order_items" => {
            "SELECT COUNT(*) FROM order_items i JOIN orders o ON o.id = i.order_id \
             WHERE o.user_id = $1"
        }
        other => panic!("unsupported table: {other}"),
    };

    let (count,): (i64,) = sqlx::query_as(query)
        .bind(user_id.as_i32())
        .fetch_one(pool)
        .await
        .expect("count query failed");

    count
}
