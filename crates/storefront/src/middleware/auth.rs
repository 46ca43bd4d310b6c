//! Authentication extractors: the authorization gate.
//!
//! Every state-mutating handler resolves the caller through one of these
//! extractors before touching a service. They distinguish "not logged in"
//! (401) from "logged in but not staff" (403), and they are the only source
//! of caller identity - handlers never read user ids from request bodies.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};

/// Extractor that requires a logged-in caller.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires a logged-in caller with the admin role.
///
/// Rejects with 401 when nobody is logged in and 403 when the caller is a
/// regular customer.
pub struct RequireAdmin(pub CurrentUser);

/// Rejection returned when the gate denies a request.
pub enum GateRejection {
    /// No resolvable caller (401).
    Unauthenticated,
    /// Caller resolved but lacks the required role (403).
    Forbidden,
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthenticated => (StatusCode::UNAUTHORIZED, "Authentication required"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Admin access required"),
        };

        (
            status,
            Json(json!({ "success": false, "message": message })),
        )
            .into_response()
    }
}

/// Read the current user out of the session, if any.
async fn resolve_caller(parts: &mut Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = GateRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = resolve_caller(parts)
            .await
            .ok_or(GateRejection::Unauthenticated)?;

        Ok(Self(user))
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = GateRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = resolve_caller(parts)
            .await
            .ok_or(GateRejection::Unauthenticated)?;

        if !user.role.is_admin() {
            return Err(GateRejection::Forbidden);
        }

        Ok(Self(user))
    }
}

/// Helper to set the current user in the session after login/signup.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}
