//! The background status poller: one detached task per initiated payment.
//!
//! The poller is one of the two mutating reconciliation triggers (the other being the provider callback). It
//! sleeps a fixed interval between gateway status queries, gives up after a bounded number of attempts, and
//! funnels every outcome through `PaymentFlowApi::reconcile_by_correlation_id`, so it can never clobber a
//! callback that committed first.

use log::*;
use tokio::task::JoinHandle;
use tradewizard_engine::{
    events::EventProducers,
    traits::{GatewayPollResult, PaymentGatewayClient},
    PaymentFlowApi,
    SqliteDatabase,
};

use crate::{config::ReconcilerConfig, integrations::PaymentGateways};

/// Everything a request handler needs to launch a poller without holding the server's wiring.
#[derive(Clone)]
pub struct ReconcilerHandle {
    db: SqliteDatabase,
    producers: EventProducers,
    config: ReconcilerConfig,
}

impl ReconcilerHandle {
    pub fn new(db: SqliteDatabase, producers: EventProducers, config: ReconcilerConfig) -> Self {
        Self { db, producers, config }
    }

    pub fn spawn_poller(&self, gateway: PaymentGateways, transaction_id: String, correlation_id: String) -> JoinHandle<()> {
        start_status_poller(self.db.clone(), self.producers.clone(), gateway, transaction_id, correlation_id, self.config)
    }
}

/// Starts the status poller for a single pending transaction. Do not await the returned JoinHandle from a
/// request path; the task is detached and self-terminates after the attempt bound.
pub fn start_status_poller(
    db: SqliteDatabase,
    producers: EventProducers,
    gateway: PaymentGateways,
    transaction_id: String,
    correlation_id: String,
    config: ReconcilerConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let api = PaymentFlowApi::new(db, producers);
        info!(
            "🕰️ Status poller started for transaction [{transaction_id}] (correlation id {correlation_id}, provider {})",
            gateway.provider()
        );
        for attempt in 1..=config.max_poll_attempts {
            tokio::time::sleep(config.poll_interval).await;
            let final_attempt = attempt == config.max_poll_attempts;
            let result = match gateway.query(&correlation_id).await {
                Ok(result) => result,
                Err(e) => {
                    // A gateway hiccup means "not resolved yet", never a poller failure.
                    debug!("🕰️ Attempt {attempt}: gateway query failed for {correlation_id}. {e}");
                    GatewayPollResult::unresolved()
                },
            };
            if result.resolved || (final_attempt && config.force_resolve_on_exhaustion) {
                // A forced resolution maps an inconclusive answer to failure; it never guesses success.
                match api.reconcile_by_correlation_id(&correlation_id, result.succeeded).await {
                    Ok(Some(tx)) => {
                        if result.resolved {
                            info!("🕰️ Transaction [{transaction_id}] resolved to {} by the poller", tx.status);
                        } else {
                            warn!(
                                "🕰️ Polling exhausted for transaction [{transaction_id}] without a provider answer. \
                                 Forced resolution to {}.",
                                tx.status
                            );
                        }
                    },
                    Ok(None) => {
                        debug!("🕰️ Transaction [{transaction_id}] was already settled by another trigger");
                    },
                    Err(e) => {
                        error!("🕰️ Could not reconcile correlation id {correlation_id}. {e}");
                    },
                }
                return;
            }
            trace!("🕰️ Attempt {attempt}/{}: {correlation_id} still unresolved", config.max_poll_attempts);
        }
        info!(
            "🕰️ Status poller for transaction [{transaction_id}] gave up after {} attempts",
            config.max_poll_attempts
        );
    })
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use daraja_tools::DarajaConfig;
    use sqlx::{migrate::MigrateDatabase, Sqlite};
    use tradewizard_engine::{
        db_types::{NewTransaction, NewUser, TransactionStatus},
        helpers::hash_password,
        traits::UserManagement,
        PaymentFlowApi,
    };
    use twz_common::Money;

    use super::*;
    use crate::integrations::{CardGateway, MpesaGateway};

    async fn test_db() -> SqliteDatabase {
        let _ = env_logger::try_init();
        let url = format!("sqlite://{}/twz_server_test_{}.db", std::env::temp_dir().display(), rand::random::<u64>());
        let _ = Sqlite::drop_database(&url).await;
        Sqlite::create_database(&url).await.expect("Error creating database");
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error connecting to database");
        db.run_migrations().await.expect("Error running migrations");
        db
    }

    async fn seed_pending_transaction(db: &SqliteDatabase, correlation_id: &str) -> String {
        let email = format!("poller-{}@example.com", rand::random::<u32>());
        let user = db
            .insert_user(NewUser::new("Poller".into(), email, hash_password("pw")))
            .await
            .expect("Error inserting test user");
        let tx = NewTransaction::purchase(user.id, "robot-1".into(), Money::from_units(10), "USD".into(), "Card")
            .with_correlation_id(correlation_id);
        let api = PaymentFlowApi::new(db.clone(), EventProducers::default());
        api.create_transaction(tx).await.expect("Error creating transaction").id
    }

    fn fast_config(max_poll_attempts: u32, force_resolve_on_exhaustion: bool) -> ReconcilerConfig {
        ReconcilerConfig {
            poll_interval: Duration::from_millis(5),
            max_poll_attempts,
            force_resolve_on_exhaustion,
        }
    }

    /// A gateway that can never be reached; every query errors, which the poller treats as "not resolved yet".
    fn unreachable_gateway() -> PaymentGateways {
        let config = DarajaConfig { api_url: "http://127.0.0.1:1".into(), ..Default::default() };
        PaymentGateways::Mpesa(MpesaGateway::new(config).expect("Error building gateway"))
    }

    #[tokio::test]
    async fn card_payments_settle_on_the_first_poll() {
        let db = test_db().await;
        let tx_id = seed_pending_transaction(&db, "card-poll-1").await;

        let handle = start_status_poller(
            db.clone(),
            EventProducers::default(),
            PaymentGateways::Card(CardGateway::new()),
            tx_id.clone(),
            "card-poll-1".into(),
            fast_config(3, true),
        );
        handle.await.unwrap();

        let api = PaymentFlowApi::new(db, EventProducers::default());
        let settled = api.fetch_transaction(&tx_id).await.unwrap().unwrap();
        assert_eq!(settled.status, TransactionStatus::Completed);
    }

    #[tokio::test]
    async fn exhausted_polling_forces_a_failed_resolution() {
        let db = test_db().await;
        let tx_id = seed_pending_transaction(&db, "mpesa-poll-1").await;

        let handle = start_status_poller(
            db.clone(),
            EventProducers::default(),
            unreachable_gateway(),
            tx_id.clone(),
            "mpesa-poll-1".into(),
            fast_config(3, true),
        );
        handle.await.unwrap();

        let api = PaymentFlowApi::new(db, EventProducers::default());
        let settled = api.fetch_transaction(&tx_id).await.unwrap().unwrap();
        assert_eq!(settled.status, TransactionStatus::Failed, "a forced resolution never guesses success");
    }

    #[tokio::test]
    async fn exhaustion_without_forced_resolution_leaves_the_transaction_pending() {
        let db = test_db().await;
        let tx_id = seed_pending_transaction(&db, "mpesa-poll-2").await;

        let handle = start_status_poller(
            db.clone(),
            EventProducers::default(),
            unreachable_gateway(),
            tx_id.clone(),
            "mpesa-poll-2".into(),
            fast_config(2, false),
        );
        // The poller must terminate after its attempt bound even though the gateway never answers.
        handle.await.unwrap();

        let api = PaymentFlowApi::new(db, EventProducers::default());
        let tx = api.fetch_transaction(&tx_id).await.unwrap().unwrap();
        assert_eq!(tx.status, TransactionStatus::Pending);
    }

    #[tokio::test]
    async fn poller_is_a_noop_when_the_callback_wins() {
        let db = test_db().await;
        let tx_id = seed_pending_transaction(&db, "card-poll-2").await;

        // The callback settles the transaction as failed before the poller gets a look in.
        let api = PaymentFlowApi::new(db.clone(), EventProducers::default());
        api.reconcile_by_correlation_id("card-poll-2", false).await.unwrap();

        let handle = start_status_poller(
            db.clone(),
            EventProducers::default(),
            PaymentGateways::Card(CardGateway::new()),
            tx_id.clone(),
            "card-poll-2".into(),
            fast_config(3, true),
        );
        handle.await.unwrap();

        // The stale poller result (success) must not overwrite the committed outcome.
        let tx = api.fetch_transaction(&tx_id).await.unwrap().unwrap();
        assert_eq!(tx.status, TransactionStatus::Failed);
    }
}
