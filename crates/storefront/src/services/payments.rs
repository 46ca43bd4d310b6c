//! Manual payment verification service.
//!
//! Staff review the payment evidence customers upload for bank transfers and
//! either verify (order moves to `processing`) or reject (order is
//! cancelled). Customers submit or resubmit evidence only while their order
//! is still `pending`.

use std::str::FromStr;

use sqlx::PgPool;
use thiserror::Error;

use harbor_thread_core::{OrderId, OrderStatus, PaymentMethod, PaymentStatus};

use crate::db::{OrderRepository, ReceiptRepository, RepositoryError};
use crate::models::order::Order;
use crate::models::session::CurrentUser;
use crate::services::notify::Notifier;

/// Longest accepted verification note or rejection reason.
const MAX_NOTE_LENGTH: usize = 500;

/// Longest accepted evidence reference.
const MAX_EVIDENCE_LENGTH: usize = 1024;

/// Errors that can occur during payment verification operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Malformed or missing input, detected before any write.
    #[error("{0}")]
    Validation(String),

    /// The order does not exist (or is not visible to the caller).
    #[error("order not found")]
    NotFound,

    /// Store-level failure.
    #[error("persistence failure: {0}")]
    Persistence(#[from] RepositoryError),
}

/// Manual payment verification service.
pub struct PaymentVerificationService<'a> {
    orders: OrderRepository<'a>,
    receipts: ReceiptRepository<'a>,
    notifier: Notifier,
}

impl<'a> PaymentVerificationService<'a> {
    /// Create a new payment verification service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            receipts: ReceiptRepository::new(pool),
            notifier: Notifier::new(),
        }
    }

    /// Verify an order's payment (admin only; the route layer enforces the
    /// role).
    ///
    /// Sets `payment_status = verified` and moves the order to `processing`,
    /// stamping the receipt with the acting admin and the optional note.
    /// Verifying an already-`processing` order succeeds: the fields are
    /// written to the same values and a fresh audit line is emitted, so a
    /// double-submitted review never errors.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::NotFound` if the order is absent,
    /// `PaymentError::Validation` if the note is too long or the order is in
    /// a terminal state.
    pub async fn verify_payment(
        &self,
        admin: &CurrentUser,
        order_id: &OrderId,
        note: Option<&str>,
    ) -> Result<Order, PaymentError> {
        let note = validate_note(note)?;

        let order = self
            .orders
            .get_by_id(order_id)
            .await?
            .ok_or(PaymentError::NotFound)?;

        if order.status.is_terminal() {
            return Err(PaymentError::Validation(format!(
                "cannot verify payment for a {} order",
                order.status
            )));
        }

        // Verification moves a pending order into processing; an order whose
        // fulfillment is already further along keeps its stage.
        let target_status = if order.status == OrderStatus::Pending {
            OrderStatus::Processing
        } else {
            order.status
        };

        let updated = self
            .orders
            .update_payment_outcome(order_id, PaymentStatus::Verified, target_status)
            .await?
            .ok_or(PaymentError::NotFound)?;

        let had_receipt = self
            .receipts
            .mark_verified(order_id, admin.id, note)
            .await?;
        if !had_receipt {
            tracing::debug!(order_id = %order_id, "payment verified without a receipt on file");
        }

        tracing::info!(
            order_id = %order_id,
            previous_status = %order.status,
            new_status = %updated.status,
            admin_id = %admin.id,
            "payment verified"
        );

        if order.status != updated.status {
            self.notifier.order_status_changed(&updated, order.status);
        }

        Ok(updated)
    }

    /// Reject an order's payment (admin only; the route layer enforces the
    /// role). The reason is required and recorded on the receipt; the order
    /// is cancelled.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Validation` for an empty or oversized reason or
    /// a terminal order, `PaymentError::NotFound` if the order is absent.
    pub async fn reject_payment(
        &self,
        admin: &CurrentUser,
        order_id: &OrderId,
        reason: &str,
    ) -> Result<Order, PaymentError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(PaymentError::Validation(
                "rejection reason is required".to_owned(),
            ));
        }
        if reason.len() > MAX_NOTE_LENGTH {
            return Err(PaymentError::Validation(
                "rejection reason is too long".to_owned(),
            ));
        }

        let order = self
            .orders
            .get_by_id(order_id)
            .await?
            .ok_or(PaymentError::NotFound)?;

        if order.status.is_terminal() {
            return Err(PaymentError::Validation(format!(
                "cannot reject payment for a {} order",
                order.status
            )));
        }

        let updated = self
            .orders
            .update_payment_outcome(order_id, PaymentStatus::Rejected, OrderStatus::Cancelled)
            .await?
            .ok_or(PaymentError::NotFound)?;

        self.receipts
            .mark_rejected(order_id, admin.id, reason)
            .await?;

        tracing::info!(
            order_id = %order_id,
            previous_status = %order.status,
            new_status = %updated.status,
            admin_id = %admin.id,
            reason = %reason,
            "payment rejected"
        );

        self.notifier.order_status_changed(&updated, order.status);

        Ok(updated)
    }

    /// Submit (or resubmit) payment evidence for the caller's own order.
    ///
    /// Only the order owner may submit, and only while the order is still
    /// `pending`: an order already past manual review is decided and its
    /// evidence can no longer be swapped. Resubmission overwrites the prior
    /// evidence and resets the verification state, so the new receipt goes
    /// back through review.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::NotFound` if the order is absent or owned by
    /// another user (order data is never disclosed), and
    /// `PaymentError::Validation` for a non-`pending` order, an empty or
    /// oversized evidence reference, or an unknown payment method.
    pub async fn submit_receipt(
        &self,
        caller: &CurrentUser,
        order_id: &OrderId,
        evidence_reference: &str,
        payment_method: &str,
    ) -> Result<(), PaymentError> {
        let evidence = evidence_reference.trim();
        if evidence.is_empty() {
            return Err(PaymentError::Validation(
                "receipt reference is required".to_owned(),
            ));
        }
        if evidence.len() > MAX_EVIDENCE_LENGTH {
            return Err(PaymentError::Validation(
                "receipt reference is too long".to_owned(),
            ));
        }

        let payment_method = PaymentMethod::from_str(payment_method)
            .map_err(|e| PaymentError::Validation(e.to_string()))?;

        let order = self
            .orders
            .get_by_id(order_id)
            .await?
            .ok_or(PaymentError::NotFound)?;

        if order.user_id != caller.id {
            return Err(PaymentError::NotFound);
        }

        if order.status != OrderStatus::Pending {
            return Err(PaymentError::Validation(format!(
                "receipts can only be submitted while the order is pending, not {}",
                order.status
            )));
        }

        self.receipts.upsert(order_id, evidence).await?;
        self.orders
            .update_payment_method(order_id, payment_method)
            .await?;

        tracing::info!(
            order_id = %order_id,
            user_id = %caller.id,
            payment_method = %payment_method,
            "payment receipt submitted"
        );

        Ok(())
    }
}

/// Validate an optional admin note, normalizing blanks to `None`.
fn validate_note(note: Option<&str>) -> Result<Option<&str>, PaymentError> {
    match note.map(str::trim) {
        None | Some("") => Ok(None),
        Some(trimmed) if trimmed.len() > MAX_NOTE_LENGTH => Err(PaymentError::Validation(
            "verification note is too long".to_owned(),
        )),
        Some(trimmed) => Ok(Some(trimmed)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_note_absent() {
        assert_eq!(validate_note(None).unwrap(), None);
    }

    #[test]
    fn test_validate_note_blank_becomes_none() {
        assert_eq!(validate_note(Some("   ")).unwrap(), None);
    }

    #[test]
    fn test_validate_note_trims() {
        assert_eq!(
            validate_note(Some("  looks good  ")).unwrap(),
            Some("looks good")
        );
    }

    #[test]
    fn test_validate_note_too_long() {
        let long = "x".repeat(MAX_NOTE_LENGTH + 1);
        assert!(matches!(
            validate_note(Some(&long)),
            Err(PaymentError::Validation(_))
        ));
    }
}
