//! Domain models for the storefront.

pub mod address;
pub mod order;
pub mod session;
pub mod user;

pub use address::{Address, NewAddress};
pub use order::{CartLine, Order, OrderItem, PaymentReceipt};
pub use session::{CurrentUser, session_keys};
pub use user::User;
