//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! ht-cli admin create -e staff@harborandthread.com -p <password>
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string
//!   (falls back to `DATABASE_URL`)

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};

use harbor_thread_core::Email;

use super::{CommandError, connect};

/// Minimum admin password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Create a new admin user.
///
/// # Arguments
///
/// * `email` - Admin's email address
/// * `password` - Admin's password (hashed with argon2id before storage)
///
/// # Returns
///
/// The ID of the created admin user.
///
/// # Errors
///
/// Returns `CommandError::InvalidInput` for a bad email or weak password,
/// `CommandError::AlreadyExists` if the email is taken.
pub async fn create_user(email: &str, password: &str) -> Result<i32, CommandError> {
    let email =
        Email::parse(email).map_err(|e| CommandError::InvalidInput(format!("email: {e}")))?;

    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(CommandError::InvalidInput(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CommandError::InvalidInput(format!("password hash: {e}")))?
        .to_string();

    let pool = connect().await?;

    tracing::info!("Creating admin user: {}", email);

    // Check if user already exists
    let existing: Option<(i32,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(&pool)
        .await?;

    if existing.is_some() {
        return Err(CommandError::AlreadyExists(email.to_string()));
    }

    // Create the user
    let (user_id,): (i32,) = sqlx::query_as(
        r"
        INSERT INTO users (email, password_hash, role)
        VALUES ($1, $2, 'admin')
        RETURNING id
        ",
    )
    .bind(email.as_str())
    .bind(&password_hash)
    .fetch_one(&pool)
    .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user_id,
        email
    );

    Ok(user_id)
}
