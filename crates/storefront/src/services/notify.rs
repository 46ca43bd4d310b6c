//! Order status notification dispatch.
//!
//! Delivery itself (email, push) is an external collaborator; this module is
//! the hook point that records the event for the dispatcher to pick up.
//! Notification is strictly best-effort: it runs after the status change is
//! persisted and can never fail the transition.

use harbor_thread_core::OrderStatus;

use crate::models::order::Order;

/// Best-effort dispatcher for order status change notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct Notifier;

impl Notifier {
    /// Create a new notifier.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Record an order status change for the owner to be notified about.
    pub fn order_status_changed(&self, order: &Order, previous: OrderStatus) {
        tracing::info!(
            target: "notifications",
            order_id = %order.id,
            user_id = %order.user_id,
            previous_status = %previous,
            new_status = %order.status,
            "order status notification queued"
        );
    }
}
