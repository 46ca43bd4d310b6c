//! Signup, login, and logout handlers.
//!
//! These populate and clear the session entry the authorization gate reads.
//! Credential storage details live in [`crate::services::auth`].

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::post,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::auth::{clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::routes::ApiMessage;
use crate::services::AuthService;
use crate::state::AppState;

/// Auth routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

/// Email/password credentials.
#[derive(Debug, Deserialize)]
struct CredentialsInput {
    email: String,
    password: String,
}

/// Register a new customer account and log it in.
#[instrument(skip_all)]
async fn signup(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<CredentialsInput>,
) -> Result<(StatusCode, Json<ApiMessage>)> {
    let service = AuthService::new(state.pool());
    let user = service.register(&input.email, &input.password).await?;

    let current = CurrentUser {
        id: user.id,
        email: user.email,
        role: user.role,
    };
    set_current_user(&session, &current)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((StatusCode::CREATED, Json(ApiMessage::ok("account created"))))
}

/// Log in with email and password.
#[instrument(skip_all)]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<CredentialsInput>,
) -> Result<Json<ApiMessage>> {
    let service = AuthService::new(state.pool());
    let user = service.login(&input.email, &input.password).await?;

    // Rotate the session id on privilege change
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let current = CurrentUser {
        id: user.id,
        email: user.email,
        role: user.role,
    };
    set_current_user(&session, &current)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(ApiMessage::ok("logged in")))
}

/// Log out the current session.
#[instrument(skip_all)]
async fn logout(session: Session) -> Result<Json<ApiMessage>> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(ApiMessage::ok("logged out")))
}
