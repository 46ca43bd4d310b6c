//! Business logic services.
//!
//! Services own validation and orchestration; repositories own SQL. All
//! authorization decisions are made against the session-resolved caller,
//! never against client-supplied identifiers.

pub mod auth;
pub mod notify;
pub mod orders;
pub mod payments;

pub use auth::AuthService;
pub use notify::Notifier;
pub use orders::OrderService;
pub use payments::PaymentVerificationService;
