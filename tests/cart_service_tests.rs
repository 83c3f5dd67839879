/// Cart service tests
///
/// End-to-end: cart items go through the retrying inserter into the
/// in-memory cart store, with failures injected by `FlakyWriter`.
/// Run with: cargo test --test cart_service_tests
use cartretry::config::{ClassifierKind, InserterConfig};
use cartretry::{
    CartItem, CartService, FlakyWriter, InMemoryCartItemStore, InsertError, RetryPolicy,
    RetryingInserter, SerializationConflicts, WriteError,
};
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

#[tokio::test(start_paused = true)]
async fn test_add_item_after_serialization_conflicts() {
    let store = InMemoryCartItemStore::new();
    let writer = FlakyWriter::new(store.clone(), 2);
    let service = CartService::new(writer, RetryPolicy::default()).unwrap();

    let cart_id = Uuid::new_v4();
    let item = CartItem::new(cart_id, "sku-42", 3);

    let started = Instant::now();
    let id = service.add_item_to_cart(item.clone()).await.unwrap();

    assert_eq!(started.elapsed(), Duration::from_secs(3));
    assert_eq!(service.inserter().writer().calls(), 3);
    assert_eq!(store.get(&id).await, Some(item));
    assert_eq!(store.items_in_cart(cart_id).await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_add_item_gives_up_after_max_attempts() {
    let store = InMemoryCartItemStore::new();
    let writer = FlakyWriter::new(store.clone(), 10);
    let service = CartService::new(writer, RetryPolicy::default()).unwrap();

    let err = service
        .add_item_to_cart(CartItem::new(Uuid::new_v4(), "sku-42", 1))
        .await
        .unwrap_err();

    match err {
        InsertError::WriteFailed { attempts, source } => {
            assert_eq!(attempts, 3);
            assert!(source.is_serialization_failure());
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(service.inserter().writer().calls(), 3);
    assert!(store.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_constraint_violation_is_retried_by_default() {
    let store = InMemoryCartItemStore::new();
    let service = CartService::new(store.clone(), RetryPolicy::default()).unwrap();

    let started = Instant::now();
    let err = service
        .add_item_to_cart(CartItem::new(Uuid::new_v4(), "sku-42", 0))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        InsertError::WriteFailed {
            attempts: 3,
            source: WriteError::ConstraintViolation(_),
        }
    ));
    assert_eq!(started.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_constraint_violation_fails_fast_with_classifier() {
    let store = InMemoryCartItemStore::new();
    let inserter = RetryingInserter::new(store.clone(), RetryPolicy::default())
        .unwrap()
        .with_classifier(SerializationConflicts);
    let service = CartService::from_inserter(inserter);

    let started = Instant::now();
    let err = service
        .add_item_to_cart(CartItem::new(Uuid::new_v4(), "sku-42", 0))
        .await
        .unwrap_err();

    assert!(matches!(err, InsertError::NotRetryable { attempt: 1, .. }));
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_during_backoff() {
    let store = InMemoryCartItemStore::new();
    let writer = FlakyWriter::new(store.clone(), 1);
    let service = CartService::new(writer, RetryPolicy::default()).unwrap();

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let shutdown = async {
        let _ = rx.await;
    };

    let add = service.add_item_to_cart_until(CartItem::new(Uuid::new_v4(), "sku-42", 1), shutdown);
    let trigger = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let _ = tx.send(());
    };

    let (result, ()) = tokio::join!(add, trigger);

    assert!(matches!(result, Err(InsertError::Cancelled { attempts: 1, .. })));
    assert_eq!(service.inserter().writer().calls(), 1);
    assert!(store.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_service_from_config() {
    let config = InserterConfig::from_json(
        r#"{ "max_attempts": 4, "initial_delay_ms": 50, "classifier": "serialization_conflicts" }"#,
    )
    .unwrap();
    assert_eq!(config.classifier, ClassifierKind::SerializationConflicts);

    let store = InMemoryCartItemStore::new();
    let writer = FlakyWriter::new(store.clone(), 3);
    let inserter = RetryingInserter::new(writer, config.to_policy().unwrap())
        .unwrap()
        .with_classifier(config.classifier);
    let service = CartService::from_inserter(inserter);

    let started = Instant::now();
    let id = service
        .add_item_to_cart(CartItem::new(Uuid::new_v4(), "sku-7", 1))
        .await
        .unwrap();

    // 50 + 100 + 200
    assert_eq!(started.elapsed(), Duration::from_millis(350));
    assert!(store.get(&id).await.is_some());
}

#[tokio::test]
async fn test_invalid_policy_rejected() {
    let result = CartService::new(
        InMemoryCartItemStore::new(),
        RetryPolicy::new().backoff_multiplier(0.0),
    );

    assert!(matches!(result, Err(InsertError::InvalidPolicy(_))));
}
