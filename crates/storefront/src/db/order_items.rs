//! Order line item repository.
//!
//! Line items are write-once: they are inserted inside the order-creation
//! transaction and never updated afterwards.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use harbor_thread_core::{Money, OrderId, OrderItemId};

use super::RepositoryError;
use crate::models::order::{CartLine, OrderItem};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` order item queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: String,
    product_id: String,
    product_name: String,
    quantity: i32,
    price: Decimal,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let order_id = OrderId::parse(&row.order_id).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order token in database: {e}"))
        })?;
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!("invalid quantity in database: {}", row.quantity))
        })?;
        let price = Money::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price in database: {e}"))
        })?;

        Ok(Self {
            id: OrderItemId::new(row.id),
            order_id,
            product_id: row.product_id,
            product_name: row.product_name,
            quantity,
            price,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order line item database operations.
pub struct OrderItemRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderItemRepository<'a> {
    /// Create a new order item repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a line item on the caller's connection.
    ///
    /// Takes a raw connection so the insert joins the open order-creation
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails (including a
    /// check-constraint violation on a non-positive quantity).
    pub async fn create(
        conn: &mut PgConnection,
        order_id: &OrderId,
        line: &CartLine,
    ) -> Result<OrderItemId, RepositoryError> {
        let quantity = i32::try_from(line.quantity).map_err(|_| {
            RepositoryError::Conflict(format!("quantity out of range: {}", line.quantity))
        })?;

        let (id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO order_items (order_id, product_id, product_name, quantity, price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(order_id.as_str())
        .bind(&line.product_id)
        .bind(&line.product_name)
        .bind(quantity)
        .bind(line.unit_price.amount())
        .fetch_one(&mut *conn)
        .await?;

        Ok(OrderItemId::new(id))
    }

    /// List the line items of an order, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored data is invalid.
    pub async fn list_for_order(
        &self,
        order_id: &OrderId,
    ) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, order_id, product_id, product_name, quantity, price
            FROM order_items
            WHERE order_id = $1
            ORDER BY id ASC
            ",
        )
        .bind(order_id.as_str())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
