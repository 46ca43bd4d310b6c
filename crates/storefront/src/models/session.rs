//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use harbor_thread_core::{Email, UserId, UserRole};

/// Session-stored caller identity.
///
/// Minimal data stored in the session to identify the logged-in user. This is
/// the only identity the services trust; client-supplied user ids are never
/// used for authorization decisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Account role.
    pub role: UserRole,
}

/// Session keys for authentication data.
pub mod session_keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}
