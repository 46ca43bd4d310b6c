//! End-to-end payment verification tests against a live `PostgreSQL`.
//!
//! Run with:
//! ```bash
//! TEST_DATABASE_URL=postgres://localhost/ht_test cargo test -p harbor-thread-integration-tests -- --ignored
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used)]

use harbor_thread_core::{OrderId, OrderStatus, PaymentStatus, UserRole};
use harbor_thread_storefront::services::orders::OrderService;
use harbor_thread_storefront::services::payments::{PaymentError, PaymentVerificationService};

use harbor_thread_integration_tests::{
    create_test_user, test_item, test_pool, transfer_checkout,
};

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn verify_payment_is_idempotent() {
    let pool = test_pool().await;
    let buyer = create_test_user(&pool, UserRole::User).await;
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let orders = OrderService::new(&pool);
    let payments = PaymentVerificationService::new(&pool);

    let order_id = orders
        .create_order(&buyer, transfer_checkout(vec![test_item("scarf-1", 1, 3500)], 3500))
        .await
        .unwrap();

    payments
        .submit_receipt(&buyer, &order_id, "uploads/receipt-1.jpg", "bank_transfer")
        .await
        .unwrap();

    let first = payments
        .verify_payment(&admin, &order_id, Some("checked against bank export"))
        .await
        .unwrap();
    assert_eq!(first.status, OrderStatus::Processing);
    assert_eq!(first.payment_status, PaymentStatus::Verified);

    // Second call on the already-processing order succeeds with the same state
    let second = payments.verify_payment(&admin, &order_id, None).await.unwrap();
    assert_eq!(second.status, OrderStatus::Processing);
    assert_eq!(second.payment_status, PaymentStatus::Verified);

    let detail = orders.get_order(&admin, &order_id).await.unwrap();
    let receipt = detail.receipt.unwrap();
    assert!(receipt.verified);
    assert_eq!(receipt.verified_by, Some(admin.id));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn verify_payment_unknown_order_is_not_found() {
    let pool = test_pool().await;
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let payments = PaymentVerificationService::new(&pool);

    let missing = OrderId::generate();
    let err = payments.verify_payment(&admin, &missing, None).await.unwrap_err();
    assert!(matches!(err, PaymentError::NotFound));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn reject_payment_requires_a_reason() {
    let pool = test_pool().await;
    let buyer = create_test_user(&pool, UserRole::User).await;
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let orders = OrderService::new(&pool);
    let payments = PaymentVerificationService::new(&pool);

    let order_id = orders
        .create_order(&buyer, transfer_checkout(vec![test_item("belt-1", 1, 2200)], 2200))
        .await
        .unwrap();

    for empty in ["", "   "] {
        let err = payments
            .reject_payment(&admin, &order_id, empty)
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Validation(_)));
    }

    // Order unchanged by the rejected attempts
    let detail = orders.get_order(&admin, &order_id).await.unwrap();
    assert_eq!(detail.order.status, OrderStatus::Pending);
    assert_eq!(detail.order.payment_status, PaymentStatus::Pending);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn reject_payment_cancels_the_order() {
    let pool = test_pool().await;
    let buyer = create_test_user(&pool, UserRole::User).await;
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let orders = OrderService::new(&pool);
    let payments = PaymentVerificationService::new(&pool);

    let order_id = orders
        .create_order(&buyer, transfer_checkout(vec![test_item("vest-1", 1, 5400)], 5400))
        .await
        .unwrap();
    payments
        .submit_receipt(&buyer, &order_id, "uploads/blurry.jpg", "bank_transfer")
        .await
        .unwrap();

    let updated = payments
        .reject_payment(&admin, &order_id, "amount does not match the invoice")
        .await
        .unwrap();
    assert_eq!(updated.status, OrderStatus::Cancelled);
    assert_eq!(updated.payment_status, PaymentStatus::Rejected);

    let detail = orders.get_order(&admin, &order_id).await.unwrap();
    let receipt = detail.receipt.unwrap();
    assert!(!receipt.verified);
    assert_eq!(
        receipt.notes.as_deref(),
        Some("amount does not match the invoice")
    );
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn resubmitted_receipt_resets_verification() {
    let pool = test_pool().await;
    let buyer = create_test_user(&pool, UserRole::User).await;
    let orders = OrderService::new(&pool);
    let payments = PaymentVerificationService::new(&pool);

    let order_id = orders
        .create_order(&buyer, transfer_checkout(vec![test_item("sock-9", 3, 700)], 2100))
        .await
        .unwrap();

    payments
        .submit_receipt(&buyer, &order_id, "uploads/first.jpg", "bank_transfer")
        .await
        .unwrap();
    payments
        .submit_receipt(&buyer, &order_id, "uploads/second.jpg", "bank_transfer")
        .await
        .unwrap();

    let detail = orders.get_order(&buyer, &order_id).await.unwrap();
    let receipt = detail.receipt.unwrap();
    assert_eq!(receipt.receipt_image, "uploads/second.jpg");
    assert!(!receipt.verified, "resubmission goes back through review");
    assert!(receipt.verified_by.is_none());
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn submit_receipt_is_owner_only() {
    let pool = test_pool().await;
    let buyer = create_test_user(&pool, UserRole::User).await;
    let stranger = create_test_user(&pool, UserRole::User).await;
    let orders = OrderService::new(&pool);
    let payments = PaymentVerificationService::new(&pool);

    let order_id = orders
        .create_order(&buyer, transfer_checkout(vec![test_item("coat-7", 1, 9900)], 9900))
        .await
        .unwrap();

    let err = payments
        .submit_receipt(&stranger, &order_id, "uploads/fake.jpg", "bank_transfer")
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::NotFound), "existence is hidden");
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn submit_receipt_rejected_once_order_is_decided() {
    let pool = test_pool().await;
    let buyer = create_test_user(&pool, UserRole::User).await;
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let orders = OrderService::new(&pool);
    let payments = PaymentVerificationService::new(&pool);

    let order_id = orders
        .create_order(&buyer, transfer_checkout(vec![test_item("hat-3", 1, 2600)], 2600))
        .await
        .unwrap();
    payments
        .submit_receipt(&buyer, &order_id, "uploads/ok.jpg", "bank_transfer")
        .await
        .unwrap();
    payments.verify_payment(&admin, &order_id, None).await.unwrap();

    // Order is processing now; swapping evidence is no longer allowed
    let err = payments
        .submit_receipt(&buyer, &order_id, "uploads/swap.jpg", "bank_transfer")
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::Validation(_)));
}
