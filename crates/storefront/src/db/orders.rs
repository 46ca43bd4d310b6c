//! Order repository.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use harbor_thread_core::{
    AddressId, Money, OrderId, OrderStatus, PaymentMethod, PaymentStatus, UserId,
};

use super::RepositoryError;
use crate::models::order::Order;

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    user_id: i32,
    address_id: i32,
    status: String,
    payment_method: String,
    payment_status: String,
    total_amount: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let id = OrderId::parse(&row.id).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order token in database: {e}"))
        })?;
        let status = OrderStatus::from_str(&row.status)
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;
        let payment_method = PaymentMethod::from_str(&row.payment_method)
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;
        let payment_status = PaymentStatus::from_str(&row.payment_status)
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;
        let total_amount = Money::new(row.total_amount).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid total in database: {e}"))
        })?;

        Ok(Self {
            id,
            user_id: UserId::new(row.user_id),
            address_id: AddressId::new(row.address_id),
            status,
            payment_method,
            payment_status,
            total_amount,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_ORDER: &str = r"
    SELECT id, user_id, address_id, status, payment_method, payment_status,
           total_amount, created_at, updated_at
    FROM orders
";

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order row on the caller's connection.
    ///
    /// Takes a raw connection so the insert joins the open order-creation
    /// transaction together with the address and line items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order token collides.
    /// Returns `RepositoryError::Database` for other database errors.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        conn: &mut PgConnection,
        id: &OrderId,
        user_id: UserId,
        address_id: AddressId,
        status: OrderStatus,
        payment_method: PaymentMethod,
        total_amount: Money,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO orders
                (id, user_id, address_id, status, payment_method,
                 payment_status, total_amount)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(id.as_str())
        .bind(user_id.as_i32())
        .bind(address_id.as_i32())
        .bind(status.to_string())
        .bind(payment_method.to_string())
        .bind(PaymentStatus::Pending.to_string())
        .bind(total_amount.amount())
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("order token collision".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(())
    }

    /// Get an order by its token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored data is invalid.
    pub async fn get_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{SELECT_ORDER} WHERE id = $1"))
            .bind(id.as_str())
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored data is invalid.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "{SELECT_ORDER} WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// List every order in the store, newest first (admin view).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored data is invalid.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows =
            sqlx::query_as::<_, OrderRow>(&format!("{SELECT_ORDER} ORDER BY created_at DESC"))
                .fetch_all(self.pool)
                .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Set an order's fulfillment status, returning the updated order.
    ///
    /// Returns `None` if the order does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            UPDATE orders
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, address_id, status, payment_method,
                      payment_status, total_amount, created_at, updated_at
            ",
        )
        .bind(id.as_str())
        .bind(status.to_string())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Set an order's payment outcome and the fulfillment status it implies,
    /// returning the updated order.
    ///
    /// Returns `None` if the order does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_payment_outcome(
        &self,
        id: &OrderId,
        payment_status: PaymentStatus,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            UPDATE orders
            SET payment_status = $2, status = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, address_id, status, payment_method,
                      payment_status, total_amount, created_at, updated_at
            ",
        )
        .bind(id.as_str())
        .bind(payment_status.to_string())
        .bind(status.to_string())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Update an order's payment method (receipt resubmission may switch it).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_payment_method(
        &self,
        id: &OrderId,
        payment_method: PaymentMethod,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET payment_method = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id.as_str())
        .bind(payment_method.to_string())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
