use thiserror::Error;

use crate::db_types::{NewTransaction, Transaction, TransactionKind};

/// The storage contract for the payment transaction ledger.
///
/// This behaviour includes:
/// * Persisting new `Pending` transactions as they are initiated.
/// * The guarded transition that moves a transaction out of `Pending` exactly once, regardless of how many
///   triggers (poller, provider callback) attempt it.
/// * The read queries backing verification and the user-facing listings.
///
/// Every mutation is a single conditional update, safe under the store's row-level atomicity. No transaction row
/// is ever deleted.
#[allow(async_fn_in_trait)]
pub trait PaymentLedgerDatabase {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Persist a brand-new transaction with `Pending` status, including the subscription extension record when
    /// the kind calls for one. Fails with [`PaymentLedgerError::TransactionAlreadyExists`] if the id is taken,
    /// and with [`PaymentLedgerError::DuplicateCorrelationId`] if another *pending* transaction already carries
    /// the same correlation id.
    async fn insert_transaction(&self, tx: NewTransaction) -> Result<Transaction, PaymentLedgerError>;

    /// Fetch a transaction by its id, with the subscription extension attached when present.
    async fn fetch_transaction(&self, id: &str) -> Result<Option<Transaction>, PaymentLedgerError>;

    /// Fetch a transaction by the provider correlation id.
    async fn fetch_transaction_by_correlation_id(
        &self,
        correlation_id: &str,
    ) -> Result<Option<Transaction>, PaymentLedgerError>;

    /// The reconciler's single mutation: move the transaction for `correlation_id` out of `Pending`, to
    /// `Completed` when `succeeded` is true and `Failed` otherwise. For subscriptions, a successful settlement
    /// also activates the extension record.
    ///
    /// The update is conditional on the persisted status still being `Pending`; if no such row exists (unknown
    /// id, or a competing trigger already committed) the call returns `Ok(None)` and changes nothing.
    async fn settle_pending_transaction(
        &self,
        correlation_id: &str,
        succeeded: bool,
    ) -> Result<Option<Transaction>, PaymentLedgerError>;

    /// User-initiated cancellation of a completed subscription. Independent of the reconciler triggers: the only
    /// legal terminal-to-terminal edge. Fails if the transaction is not a subscription owned by `user_id`, or is
    /// not currently `Completed`.
    async fn cancel_subscription(&self, id: &str, user_id: &str) -> Result<Transaction, PaymentLedgerError>;

    /// All transactions for the user, optionally filtered by kind, newest first.
    async fn transactions_for_user(
        &self,
        user_id: &str,
        kind: Option<TransactionKind>,
    ) -> Result<Vec<Transaction>, PaymentLedgerError>;

    /// Completed subscriptions whose extension record is active and unexpired.
    async fn active_subscriptions_for_user(&self, user_id: &str) -> Result<Vec<Transaction>, PaymentLedgerError>;

    /// Whether the user holds an active, unexpired subscription to the given plan.
    async fn has_active_subscription(&self, user_id: &str, plan_id: &str) -> Result<bool, PaymentLedgerError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), PaymentLedgerError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentLedgerError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("Cannot insert transaction, since it already exists with id {0}")]
    TransactionAlreadyExists(String),
    #[error("A pending transaction already exists for correlation id {0}")]
    DuplicateCorrelationId(String),
    #[error("The requested transaction {0} does not exist")]
    TransactionNotFound(String),
    #[error("The requested transaction change is forbidden. {0}")]
    TransactionModificationForbidden(String),
}

impl From<sqlx::Error> for PaymentLedgerError {
    fn from(e: sqlx::Error) -> Self {
        PaymentLedgerError::DatabaseError(e.to_string())
    }
}
