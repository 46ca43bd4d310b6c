//! Payment receipt repository.
//!
//! Each order has at most one active receipt (unique on `order_id`).
//! Resubmission overwrites the evidence and resets the verification state.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use harbor_thread_core::{OrderId, ReceiptId, UserId};

use super::RepositoryError;
use crate::models::order::PaymentReceipt;

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` receipt queries.
#[derive(Debug, sqlx::FromRow)]
struct ReceiptRow {
    id: i32,
    order_id: String,
    receipt_image: String,
    upload_date: DateTime<Utc>,
    verified: bool,
    verified_date: Option<DateTime<Utc>>,
    verified_by: Option<i32>,
    notes: Option<String>,
}

impl TryFrom<ReceiptRow> for PaymentReceipt {
    type Error = RepositoryError;

    fn try_from(row: ReceiptRow) -> Result<Self, Self::Error> {
        let order_id = OrderId::parse(&row.order_id).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order token in database: {e}"))
        })?;

        Ok(Self {
            id: ReceiptId::new(row.id),
            order_id,
            receipt_image: row.receipt_image,
            upload_date: row.upload_date,
            verified: row.verified,
            verified_date: row.verified_date,
            verified_by: row.verified_by.map(UserId::new),
            notes: row.notes,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for payment receipt database operations.
pub struct ReceiptRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReceiptRepository<'a> {
    /// Create a new receipt repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a pre-verified receipt on the caller's connection.
    ///
    /// Used for card payments already captured by the gateway simulation:
    /// the transaction reference is recorded as the evidence and the row is
    /// born verified, so staff never see it in the review queue. `verified_by`
    /// stays NULL since no admin was involved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_preverified(
        conn: &mut PgConnection,
        order_id: &OrderId,
        transaction_ref: &str,
        captured_at: Option<DateTime<Utc>>,
    ) -> Result<ReceiptId, RepositoryError> {
        let (id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO payment_receipts
                (order_id, receipt_image, verified, verified_date)
            VALUES ($1, $2, TRUE, COALESCE($3, NOW()))
            RETURNING id
            ",
        )
        .bind(order_id.as_str())
        .bind(transaction_ref)
        .bind(captured_at)
        .fetch_one(&mut *conn)
        .await?;

        Ok(ReceiptId::new(id))
    }

    /// Create or replace the receipt for an order.
    ///
    /// Replacing resets the verification state: a resubmitted receipt always
    /// goes back through manual review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn upsert(
        &self,
        order_id: &OrderId,
        receipt_image: &str,
    ) -> Result<ReceiptId, RepositoryError> {
        let (id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO payment_receipts (order_id, receipt_image)
            VALUES ($1, $2)
            ON CONFLICT (order_id) DO UPDATE
            SET receipt_image = EXCLUDED.receipt_image,
                upload_date = NOW(),
                verified = FALSE,
                verified_date = NULL,
                verified_by = NULL,
                notes = NULL
            RETURNING id
            ",
        )
        .bind(order_id.as_str())
        .bind(receipt_image)
        .fetch_one(self.pool)
        .await?;

        Ok(ReceiptId::new(id))
    }

    /// Get the receipt for an order, if one was submitted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored data is invalid.
    pub async fn get_for_order(
        &self,
        order_id: &OrderId,
    ) -> Result<Option<PaymentReceipt>, RepositoryError> {
        let row = sqlx::query_as::<_, ReceiptRow>(
            r"
            SELECT id, order_id, receipt_image, upload_date, verified,
                   verified_date, verified_by, notes
            FROM payment_receipts
            WHERE order_id = $1
            ",
        )
        .bind(order_id.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Stamp the order's receipt as verified by an admin.
    ///
    /// Returns `false` when the order has no receipt row (e.g. cash on
    /// delivery); verification of the order itself still proceeds.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_verified(
        &self,
        order_id: &OrderId,
        admin_id: UserId,
        note: Option<&str>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE payment_receipts
            SET verified = TRUE,
                verified_date = NOW(),
                verified_by = $2,
                notes = $3
            WHERE order_id = $1
            ",
        )
        .bind(order_id.as_str())
        .bind(admin_id.as_i32())
        .bind(note)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Record a rejection on the order's receipt.
    ///
    /// Returns `false` when the order has no receipt row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_rejected(
        &self,
        order_id: &OrderId,
        admin_id: UserId,
        reason: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE payment_receipts
            SET verified = FALSE,
                verified_date = NOW(),
                verified_by = $2,
                notes = $3
            WHERE order_id = $1
            ",
        )
        .bind(order_id.as_str())
        .bind(admin_id.as_i32())
        .bind(reason)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
