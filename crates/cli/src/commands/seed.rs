//! Seed the database with demo data for local development.
//!
//! Creates a demo customer account (`demo@harborandthread.com`) so the order
//! flow can be exercised immediately after `ht-cli migrate`.

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};

use super::{CommandError, connect};

/// Demo customer email.
const DEMO_EMAIL: &str = "demo@harborandthread.com";

/// Demo customer password (development only).
const DEMO_PASSWORD: &str = "harbor-demo-1234";

/// Seed demo data.
///
/// Idempotent: re-running leaves existing rows untouched.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable.
pub async fn demo_data() -> Result<(), CommandError> {
    let pool = connect().await?;

    let existing: Option<(i32,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(DEMO_EMAIL)
        .fetch_optional(&pool)
        .await?;

    if let Some((id,)) = existing {
        tracing::info!("Demo customer already exists (id {id}), nothing to do");
        return Ok(());
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(DEMO_PASSWORD.as_bytes(), &salt)
        .map_err(|e| CommandError::InvalidInput(format!("password hash: {e}")))?
        .to_string();

    let (id,): (i32,) = sqlx::query_as(
        r"
        INSERT INTO users (email, password_hash, role)
        VALUES ($1, $2, 'user')
        RETURNING id
        ",
    )
    .bind(DEMO_EMAIL)
    .bind(&password_hash)
    .fetch_one(&pool)
    .await?;

    tracing::info!("Demo customer created (id {id})");
    tracing::info!("  Email: {DEMO_EMAIL}");
    tracing::info!("  Password: {DEMO_PASSWORD}");

    Ok(())
}
