//! Shipping address repository.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use harbor_thread_core::{AddressId, Email, UserId};

use super::RepositoryError;
use crate::models::address::{Address, NewAddress};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` address queries.
#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: i32,
    user_id: i32,
    recipient_name: String,
    email: String,
    street_address: String,
    city: String,
    state_province: String,
    postal_code: String,
    phone: String,
    is_default: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<AddressRow> for Address {
    type Error = RepositoryError;

    fn try_from(row: AddressRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: AddressId::new(row.id),
            user_id: UserId::new(row.user_id),
            recipient_name: row.recipient_name,
            email,
            street_address: row.street_address,
            city: row.city,
            state_province: row.state_province,
            postal_code: row.postal_code,
            phone: row.phone,
            is_default: row.is_default,
            created_at: row.created_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for shipping address database operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an address on the caller's connection.
    ///
    /// Takes a raw connection rather than the pool so the insert can join an
    /// open transaction (order creation writes the address atomically with
    /// the order). When `is_default` is set, sibling defaults for the same
    /// user are cleared first, keeping at most one default per user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn create(
        conn: &mut PgConnection,
        user_id: UserId,
        address: &NewAddress,
    ) -> Result<AddressId, RepositoryError> {
        if address.is_default {
            sqlx::query(
                r"
                UPDATE user_addresses
                SET is_default = FALSE
                WHERE user_id = $1 AND is_default = TRUE
                ",
            )
            .bind(user_id.as_i32())
            .execute(&mut *conn)
            .await?;
        }

        let (id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO user_addresses
                (user_id, recipient_name, email, street_address, city,
                 state_province, postal_code, phone, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            ",
        )
        .bind(user_id.as_i32())
        .bind(&address.recipient_name)
        .bind(address.email.as_str())
        .bind(&address.street_address)
        .bind(&address.city)
        .bind(&address.state_province)
        .bind(&address.postal_code)
        .bind(&address.phone)
        .bind(address.is_default)
        .fetch_one(&mut *conn)
        .await?;

        Ok(AddressId::new(id))
    }

    /// Get an address by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored data is invalid.
    pub async fn get_by_id(&self, id: AddressId) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(
            r"
            SELECT id, user_id, recipient_name, email, street_address, city,
                   state_province, postal_code, phone, is_default, created_at
            FROM user_addresses
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List all addresses saved by a user, default first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored data is invalid.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(
            r"
            SELECT id, user_id, recipient_name, email, street_address, city,
                   state_province, postal_code, phone, is_default, created_at
            FROM user_addresses
            WHERE user_id = $1
            ORDER BY is_default DESC, created_at DESC
            ",
        )
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
