//! User account model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use harbor_thread_core::{Email, UserId, UserRole};

/// A registered account, customer or staff.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Database ID.
    pub id: UserId,
    /// Unique email address.
    pub email: Email,
    /// Account role (`user` or `admin`).
    pub role: UserRole,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}
