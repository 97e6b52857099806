//! End-to-end properties of the payment reconciliation flow, exercised against a real SQLite ledger.

mod support;

use std::{
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use chrono::{Duration, Utc};
use support::{prepare_test_env, seed_user};
use tradewizard_engine::{
    api::transaction_objects::TransactionStatusView,
    db_types::{NewSubscriptionDetail, NewTransaction, TransactionKind, TransactionStatus},
    events::{EventHandler, EventProducers, TransactionResolvedEvent},
    traits::PaymentLedgerError,
    PaymentFlowApi,
    SqliteDatabase,
};
use twz_common::Money;

fn purchase_for(user_id: &str, correlation_id: &str) -> NewTransaction {
    NewTransaction::purchase(user_id.to_string(), "robot-1".to_string(), Money::from_units(500), "KES".into(), "Mpesa")
        .with_correlation_id(correlation_id)
}

fn subscription_for(user_id: &str, correlation_id: &str) -> NewTransaction {
    let start = Utc::now();
    NewTransaction::subscription(
        user_id.to_string(),
        "plan-pro".to_string(),
        Money::from_units(2_000),
        "USD".into(),
        "Card",
        NewSubscriptionDetail { start_date: start, end_date: Some(start + Duration::days(30)) },
    )
    .with_correlation_id(correlation_id)
}

fn api_for(db: &SqliteDatabase) -> PaymentFlowApi<SqliteDatabase> {
    PaymentFlowApi::new(db.clone(), EventProducers::default())
}

#[tokio::test]
async fn callback_resolves_pending_transaction_exactly_once() {
    let db = prepare_test_env().await;
    let user = seed_user(&db, "alice").await;
    let api = api_for(&db);

    let created = api.create_transaction(purchase_for(&user.id, "CR123")).await.unwrap();
    assert_eq!(created.status, TransactionStatus::Pending);
    assert_eq!(created.correlation_id.as_deref(), Some("CR123"));

    // Callback arrives with the provider's success sentinel.
    let settled = api.reconcile_by_correlation_id("CR123", true).await.unwrap();
    assert_eq!(settled.unwrap().status, TransactionStatus::Completed);

    // A subsequent poll for the same correlation id is a no-op.
    let second = api.reconcile_by_correlation_id("CR123", true).await.unwrap();
    assert!(second.is_none());

    let stored = api.fetch_transaction(&created.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TransactionStatus::Completed);
}

#[tokio::test]
async fn conflicting_triggers_commit_first_wins() {
    let db = prepare_test_env().await;
    let user = seed_user(&db, "bob").await;
    let api = api_for(&db);

    let created = api.create_transaction(purchase_for(&user.id, "CR-race")).await.unwrap();

    // Callback says success, then a stale poller result claims failure.
    let winner = api.reconcile_by_correlation_id("CR-race", true).await.unwrap();
    assert!(winner.is_some());
    let loser = api.reconcile_by_correlation_id("CR-race", false).await.unwrap();
    assert!(loser.is_none(), "the losing trigger must be a no-op");

    let stored = api.fetch_transaction(&created.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TransactionStatus::Completed, "the final status is the first committer's");
}

#[tokio::test]
async fn status_never_returns_to_pending() {
    let db = prepare_test_env().await;
    let user = seed_user(&db, "carol").await;
    let api = api_for(&db);

    let created = api.create_transaction(purchase_for(&user.id, "CR-fail")).await.unwrap();
    api.reconcile_by_correlation_id("CR-fail", false).await.unwrap();

    let stored = api.fetch_transaction(&created.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TransactionStatus::Failed);

    // Even a "success" notification cannot resurrect a terminal transaction.
    let late = api.reconcile_by_correlation_id("CR-fail", true).await.unwrap();
    assert!(late.is_none());
    let stored = api.fetch_transaction(&created.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TransactionStatus::Failed);
}

#[tokio::test]
async fn gateway_outage_still_creates_pending_record() {
    let db = prepare_test_env().await;
    let user = seed_user(&db, "dave").await;
    let api = api_for(&db);

    // The initiation boundary synthesizes a local correlation id when the gateway is down.
    let synthetic = format!("twz-{}", uuid_like());
    let created = api.create_transaction(purchase_for(&user.id, &synthetic)).await.unwrap();

    let stored = api.fetch_transaction(&created.id).await.unwrap().unwrap();
    let view = TransactionStatusView::from(&stored);
    assert_eq!(view.status, TransactionStatus::Pending);
    assert!(!view.success);
    assert_eq!(view.correlation_id.as_deref(), Some(synthetic.as_str()));
}

#[tokio::test]
async fn duplicate_pending_correlation_id_is_rejected() {
    let db = prepare_test_env().await;
    let user = seed_user(&db, "erin").await;
    let api = api_for(&db);

    api.create_transaction(purchase_for(&user.id, "CR-dup")).await.unwrap();
    let err = api.create_transaction(purchase_for(&user.id, "CR-dup")).await.unwrap_err();
    assert!(matches!(err, PaymentLedgerError::DuplicateCorrelationId(_)));

    // Once the first attempt is terminal, the correlation id may appear on a new pending row.
    api.reconcile_by_correlation_id("CR-dup", false).await.unwrap();
    api.create_transaction(purchase_for(&user.id, "CR-dup")).await.unwrap();
}

#[tokio::test]
async fn successful_subscription_is_activated_and_cancellable() {
    let db = prepare_test_env().await;
    let user = seed_user(&db, "fred").await;
    let api = api_for(&db);

    let created = api.create_transaction(subscription_for(&user.id, "CR-sub")).await.unwrap();
    assert!(!created.is_active_subscription());

    api.reconcile_by_correlation_id("CR-sub", true).await.unwrap();
    let active = api.fetch_transaction(&created.id).await.unwrap().unwrap();
    assert_eq!(active.status, TransactionStatus::Completed);
    assert!(active.is_active_subscription());
    assert!(api.has_active_subscription(&user.id, "plan-pro").await.unwrap());
    assert_eq!(api.active_subscriptions_for_user(&user.id).await.unwrap().len(), 1);

    // The one legal terminal-to-terminal edge: explicit user cancellation.
    let cancelled = api.cancel_subscription(&created.id, &user.id).await.unwrap();
    assert_eq!(cancelled.status, TransactionStatus::Cancelled);
    assert!(!cancelled.is_active_subscription());
    assert!(!api.has_active_subscription(&user.id, "plan-pro").await.unwrap());
}

#[tokio::test]
async fn cancellation_guards() {
    let db = prepare_test_env().await;
    let user = seed_user(&db, "gina").await;
    let stranger = seed_user(&db, "mallory").await;
    let api = api_for(&db);

    // A pending subscription cannot be cancelled.
    let pending = api.create_transaction(subscription_for(&user.id, "CR-g1")).await.unwrap();
    let err = api.cancel_subscription(&pending.id, &user.id).await.unwrap_err();
    assert!(matches!(err, PaymentLedgerError::TransactionModificationForbidden(_)));

    // A purchase cannot be cancelled at all.
    let purchase = api.create_transaction(purchase_for(&user.id, "CR-g2")).await.unwrap();
    api.reconcile_by_correlation_id("CR-g2", true).await.unwrap();
    let err = api.cancel_subscription(&purchase.id, &user.id).await.unwrap_err();
    assert!(matches!(err, PaymentLedgerError::TransactionModificationForbidden(_)));

    // Somebody else's subscription looks like it does not exist.
    api.reconcile_by_correlation_id("CR-g1", true).await.unwrap();
    let err = api.cancel_subscription(&pending.id, &stranger.id).await.unwrap_err();
    assert!(matches!(err, PaymentLedgerError::TransactionNotFound(_)));
}

#[tokio::test]
async fn resolved_event_fires_once_per_transaction() {
    let db = prepare_test_env().await;
    let user = seed_user(&db, "hugo").await;

    let count = Arc::new(AtomicU64::new(0));
    let c2 = count.clone();
    let handler = EventHandler::new(
        8,
        Arc::new(move |_ev: TransactionResolvedEvent| {
            let count = c2.clone();
            Box::pin(async move {
                count.fetch_add(1, Ordering::SeqCst);
            }) as Pin<Box<dyn std::future::Future<Output = ()> + Send>>
        }),
    );
    let mut producers = EventProducers::default();
    producers.transaction_resolved_producer.push(handler.subscribe());
    let handler_task = tokio::spawn(handler.start_handler());

    let api = PaymentFlowApi::new(db.clone(), producers);
    api.create_transaction(purchase_for(&user.id, "CR-ev")).await.unwrap();
    api.reconcile_by_correlation_id("CR-ev", true).await.unwrap();
    // The no-op attempt must not fire a second event.
    api.reconcile_by_correlation_id("CR-ev", true).await.unwrap();

    // Dropping the api drops the last producer, which lets the handler drain and shut down.
    drop(api);
    handler_task.await.unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn user_listing_filters_by_kind() {
    let db = prepare_test_env().await;
    let user = seed_user(&db, "ivy").await;
    let api = api_for(&db);

    api.create_transaction(purchase_for(&user.id, "CR-l1")).await.unwrap();
    api.create_transaction(subscription_for(&user.id, "CR-l2")).await.unwrap();

    let all = api.transactions_for_user(&user.id, None).await.unwrap();
    assert_eq!(all.len(), 2);
    let purchases = api.transactions_for_user(&user.id, Some(TransactionKind::Purchase)).await.unwrap();
    assert_eq!(purchases.len(), 1);
    assert_eq!(purchases[0].kind, TransactionKind::Purchase);
    let subs = api.transactions_for_user(&user.id, Some(TransactionKind::Subscription)).await.unwrap();
    assert_eq!(subs.len(), 1);
    assert!(subs[0].subscription.is_some(), "subscription rows carry their extension record");
}

fn uuid_like() -> String {
    format!("{:08x}", rand::random::<u32>())
}
