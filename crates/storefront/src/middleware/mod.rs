//! HTTP middleware: the authorization gate, session layer, and request IDs.

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{RequireAdmin, RequireAuth};
pub use session::create_session_layer;
