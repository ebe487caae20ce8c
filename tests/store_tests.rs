use payment_emulator::models::{NewPayment, PaymentFilter, PaymentStatus};
use payment_emulator::store::{InMemoryPaymentStore, PaymentStore, StoreError};
use std::sync::Arc;

fn input(user_id: i64, email: &str) -> NewPayment {
    NewPayment {
        user_id,
        user_email: email.to_string(),
        amount: 99.99,
        currency: "EUR".to_string(),
    }
}

#[tokio::test]
async fn created_payment_carries_its_input_and_store_owned_fields() {
    let store = InMemoryPaymentStore::new();
    let id = store.create(&input(7, "seven@example.com")).await.unwrap();

    let payments = store
        .get_payments(&PaymentFilter::ByUser(7))
        .await
        .unwrap();

    assert_eq!(payments.len(), 1);
    let payment = &payments[0];
    assert_eq!(payment.id, id);
    assert_eq!(payment.user_id, 7);
    assert_eq!(payment.user_email, "seven@example.com");
    assert_eq!(payment.amount, 99.99);
    assert_eq!(payment.currency, "EUR");
    assert_eq!(payment.status, PaymentStatus::New);
    assert_eq!(payment.created_at, payment.updated_at);
}

#[tokio::test]
async fn status_write_bumps_updated_at() {
    let store = InMemoryPaymentStore::new();
    let id = store.create(&input(1, "a@example.com")).await.unwrap();
    let before = store.get_payments(&PaymentFilter::ByUser(1)).await.unwrap()[0].clone();

    store.update_status(id, PaymentStatus::Error).await.unwrap();

    let after = store.get_payments(&PaymentFilter::ByUser(1)).await.unwrap()[0].clone();
    assert_eq!(after.status, PaymentStatus::Error);
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at >= before.updated_at);
}

#[tokio::test]
async fn rows_affected_reflects_the_conditional_write() {
    let store = InMemoryPaymentStore::new();
    let id = store.create(&input(1, "a@example.com")).await.unwrap();

    // Non-terminal row: the write lands.
    assert_eq!(store.update_status(id, PaymentStatus::Canceled).await.unwrap(), 1);
    // Still non-terminal after cancel.
    assert_eq!(store.update_status(id, PaymentStatus::Failure).await.unwrap(), 1);
    // Terminal row: the write is refused, count says so.
    assert_eq!(store.update_status(id, PaymentStatus::New).await.unwrap(), 0);
    // Missing row: indistinguishable from terminal by the count alone.
    assert_eq!(store.update_status(id + 100, PaymentStatus::New).await.unwrap(), 0);
}

#[tokio::test]
async fn cancel_uses_the_same_conditional_contract() {
    let store = InMemoryPaymentStore::new();
    let id = store.create(&input(1, "a@example.com")).await.unwrap();

    assert_eq!(store.cancel(id).await.unwrap(), 1);
    assert_eq!(store.get_status(id).await.unwrap(), PaymentStatus::Canceled);

    store.update_status(id, PaymentStatus::Success).await.unwrap();
    assert_eq!(store.cancel(id).await.unwrap(), 0);
    assert_eq!(store.get_status(id).await.unwrap(), PaymentStatus::Success);
}

#[tokio::test]
async fn filters_are_disjoint_lookups() {
    let store = InMemoryPaymentStore::new();
    store.create(&input(1, "a@example.com")).await.unwrap();
    store.create(&input(2, "b@example.com")).await.unwrap();

    let by_email = store
        .get_payments(&PaymentFilter::ByEmail("a@example.com".to_string()))
        .await
        .unwrap();
    assert_eq!(by_email.len(), 1);
    assert_eq!(by_email[0].user_id, 1);

    let no_match = store
        .get_payments(&PaymentFilter::ByEmail("missing@example.com".to_string()))
        .await
        .unwrap();
    assert!(no_match.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_conditional_writes_admit_a_single_terminal_winner() {
    for _ in 0..50 {
        let store = Arc::new(InMemoryPaymentStore::new());
        let id = store.create(&input(1, "a@example.com")).await.unwrap();

        let mut handles = Vec::new();
        for status in [PaymentStatus::Success, PaymentStatus::Failure] {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.update_status(id, status).await.unwrap()
            }));
        }

        let mut landed = 0;
        for handle in handles {
            landed += handle.await.unwrap();
        }

        assert_eq!(landed, 1, "exactly one terminal write may land");
        assert!(store.get_status(id).await.unwrap().is_terminal());
    }
}

#[tokio::test]
async fn get_status_distinguishes_not_found() {
    let store = InMemoryPaymentStore::new();

    let err = store.get_status(1).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { id: 1 }));

    let id = store.create(&input(1, "a@example.com")).await.unwrap();
    assert_eq!(store.get_status(id).await.unwrap(), PaymentStatus::New);
}
