//! End-to-end order lifecycle tests against a live `PostgreSQL`.
//!
//! Run with:
//! ```bash
//! TEST_DATABASE_URL=postgres://localhost/ht_test cargo test -p harbor-thread-integration-tests -- --ignored
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used)]

use harbor_thread_core::{OrderStatus, PaymentStatus, UserRole};
use harbor_thread_storefront::services::orders::{OrderError, OrderService};

use harbor_thread_integration_tests::{
    card_checkout, count_rows_for_user, create_test_user, test_item, test_pool, transfer_checkout,
};

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn create_order_without_capture_starts_pending() {
    let pool = test_pool().await;
    let buyer = create_test_user(&pool, UserRole::User).await;
    let service = OrderService::new(&pool);

    // qty 1 @ 10.00 + qty 2 @ 5.00 = 20.00
    let request = transfer_checkout(
        vec![test_item("shirt-1", 1, 1000), test_item("sock-2", 2, 500)],
        2000,
    );

    let order_id = service.create_order(&buyer, request).await.unwrap();
    let detail = service.get_order(&buyer, &order_id).await.unwrap();

    assert_eq!(detail.order.status, OrderStatus::Pending);
    assert_eq!(detail.order.payment_status, PaymentStatus::Pending);
    assert_eq!(detail.items.len(), 2);
    assert!(detail.receipt.is_none(), "no receipt without a capture");
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn create_order_with_card_capture_starts_processing() {
    let pool = test_pool().await;
    let buyer = create_test_user(&pool, UserRole::User).await;
    let service = OrderService::new(&pool);

    let request = card_checkout(vec![test_item("coat-1", 1, 12500)], 12500, "TR123");

    let order_id = service.create_order(&buyer, request).await.unwrap();
    let detail = service.get_order(&buyer, &order_id).await.unwrap();

    assert_eq!(detail.order.status, OrderStatus::Processing);

    let receipt = detail.receipt.expect("capture should create a receipt");
    assert!(receipt.verified, "gateway capture is pre-verified");
    assert_eq!(receipt.receipt_image, "TR123");
    assert!(receipt.verified_by.is_none(), "no admin involved");
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn malformed_cart_leaves_no_rows_behind() {
    let pool = test_pool().await;
    let buyer = create_test_user(&pool, UserRole::User).await;
    let service = OrderService::new(&pool);

    // Zero quantity fails validation
    let request = transfer_checkout(
        vec![test_item("shirt-1", 1, 1000), test_item("sock-2", 0, 500)],
        1000,
    );
    let err = service.create_order(&buyer, request).await.unwrap_err();
    assert!(matches!(err, OrderError::Validation(_)));

    // Total mismatch fails validation
    let request = transfer_checkout(vec![test_item("shirt-1", 1, 1000)], 999);
    let err = service.create_order(&buyer, request).await.unwrap_err();
    assert!(matches!(err, OrderError::Validation(_)));

    // Nothing was written for this user on either attempt
    assert_eq!(count_rows_for_user(&pool, "orders", buyer.id).await, 0);
    assert_eq!(count_rows_for_user(&pool, "user_addresses", buyer.id).await, 0);
    assert_eq!(count_rows_for_user(&pool, "order_items", buyer.id).await, 0);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn get_order_hides_other_users_orders() {
    let pool = test_pool().await;
    let buyer = create_test_user(&pool, UserRole::User).await;
    let stranger = create_test_user(&pool, UserRole::User).await;
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let service = OrderService::new(&pool);

    let order_id = service
        .create_order(&buyer, transfer_checkout(vec![test_item("hat-1", 1, 2500)], 2500))
        .await
        .unwrap();

    // Stranger sees nothing, not even existence
    let err = service.get_order(&stranger, &order_id).await.unwrap_err();
    assert!(matches!(err, OrderError::NotFound));

    // Owner and admin both see the order
    assert!(service.get_order(&buyer, &order_id).await.is_ok());
    assert!(service.get_order(&admin, &order_id).await.is_ok());
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn list_orders_scopes_by_role() {
    let pool = test_pool().await;
    let buyer = create_test_user(&pool, UserRole::User).await;
    let other = create_test_user(&pool, UserRole::User).await;
    let service = OrderService::new(&pool);

    service
        .create_order(&buyer, transfer_checkout(vec![test_item("tee-1", 1, 1500)], 1500))
        .await
        .unwrap();
    service
        .create_order(&other, transfer_checkout(vec![test_item("tee-2", 1, 1500)], 1500))
        .await
        .unwrap();

    let own = service.list_orders(&buyer).await.unwrap();
    assert_eq!(own.len(), 1);
    assert!(own.iter().all(|o| o.user_id == buyer.id));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn owner_can_cancel_only_while_pending() {
    let pool = test_pool().await;
    let buyer = create_test_user(&pool, UserRole::User).await;
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let service = OrderService::new(&pool);

    let order_id = service
        .create_order(&buyer, transfer_checkout(vec![test_item("bag-1", 1, 4500)], 4500))
        .await
        .unwrap();

    // Admin ships it; owner can no longer cancel
    service
        .update_status(&admin, &order_id, "shipped")
        .await
        .unwrap();
    let err = service.cancel_own_order(&buyer, &order_id).await.unwrap_err();
    assert!(matches!(err, OrderError::Validation(_)));

    // A fresh pending order cancels fine
    let pending_id = service
        .create_order(&buyer, transfer_checkout(vec![test_item("bag-2", 1, 4500)], 4500))
        .await
        .unwrap();
    let cancelled = service.cancel_own_order(&buyer, &pending_id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn update_status_rejects_unknown_targets() {
    let pool = test_pool().await;
    let buyer = create_test_user(&pool, UserRole::User).await;
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let service = OrderService::new(&pool);

    let order_id = service
        .create_order(&buyer, transfer_checkout(vec![test_item("cap-1", 1, 1800)], 1800))
        .await
        .unwrap();

    for bad in ["", "PENDING", "refunded", "ship", "in-transit"] {
        let err = service.update_status(&admin, &order_id, bad).await.unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)), "accepted {bad:?}");
    }

    // Order untouched by the rejected attempts
    let detail = service.get_order(&admin, &order_id).await.unwrap();
    assert_eq!(detail.order.status, OrderStatus::Pending);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set TEST_DATABASE_URL)"]
async fn update_status_refuses_terminal_sources() {
    let pool = test_pool().await;
    let buyer = create_test_user(&pool, UserRole::User).await;
    let admin = create_test_user(&pool, UserRole::Admin).await;
    let service = OrderService::new(&pool);

    let order_id = service
        .create_order(&buyer, transfer_checkout(vec![test_item("tie-1", 1, 3000)], 3000))
        .await
        .unwrap();

    service
        .update_status(&admin, &order_id, "completed")
        .await
        .unwrap();

    let err = service
        .update_status(&admin, &order_id, "pending")
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::Validation(_)));
}
