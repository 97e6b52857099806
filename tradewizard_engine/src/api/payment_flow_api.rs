use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewTransaction, Transaction, TransactionKind},
    events::{EventProducers, TransactionResolvedEvent},
    traits::{PaymentLedgerDatabase, PaymentLedgerError},
};

/// `PaymentFlowApi` is the transaction reconciler: it owns the state machine that moves a ledger record from
/// `Pending` to a terminal state, driven by three independent triggers: the synchronous verify call (read-only),
/// the background status poller, and the inbound provider callback.
///
/// Both mutating triggers funnel into [`Self::reconcile_by_correlation_id`], so whichever commits first wins and
/// the loser's attempt is a no-op. The guard lives in the storage layer as a conditional update; this API adds
/// the event fan-out and the logging around it.
pub struct PaymentFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for PaymentFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentFlowApi")
    }
}

impl<B> PaymentFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> PaymentFlowApi<B>
where B: PaymentLedgerDatabase
{
    /// Persist a brand-new `Pending` transaction.
    ///
    /// The correlation id should already be set: either the gateway's, or a synthetic fallback when the gateway
    /// was unreachable (gateway unavailability is non-fatal to record creation; the transaction simply stays
    /// `Pending` until reconciliation).
    pub async fn create_transaction(&self, tx: NewTransaction) -> Result<Transaction, PaymentLedgerError> {
        let transaction = self.db.insert_transaction(tx).await?;
        debug!(
            "🔄️💰️ Transaction [{}] created for user {} ({} {} via {})",
            transaction.id, transaction.user_id, transaction.amount, transaction.currency, transaction.payment_method
        );
        Ok(transaction)
    }

    /// The single mutation entry point shared by the poller and the callback handler.
    ///
    /// If a `Pending` transaction exists for `correlation_id`, it transitions to `Completed` (activating the
    /// subscription extension where applicable) or `Failed`, and a [`TransactionResolvedEvent`] is fired.
    /// If no matching pending record exists (already terminal, or an unknown id), this is a silent no-op and
    /// `Ok(None)` is returned. Duplicate and late notifications are expected, never errors.
    pub async fn reconcile_by_correlation_id(
        &self,
        correlation_id: &str,
        succeeded: bool,
    ) -> Result<Option<Transaction>, PaymentLedgerError> {
        trace!("🔄️💰️ Reconciling correlation id {correlation_id} (succeeded: {succeeded})");
        let settled = self.db.settle_pending_transaction(correlation_id, succeeded).await?;
        match &settled {
            Some(tx) => {
                info!("🔄️💰️ Transaction [{}] resolved to {} via correlation id {correlation_id}", tx.id, tx.status);
                self.call_transaction_resolved_hook(tx).await;
            },
            None => {
                debug!("🔄️💰️ No pending transaction for correlation id {correlation_id}. Nothing to do.");
            },
        }
        Ok(settled)
    }

    async fn call_transaction_resolved_hook(&self, transaction: &Transaction) {
        for emitter in &self.producers.transaction_resolved_producer {
            debug!("🔄️💰️ Notifying transaction resolved hook subscribers");
            let event = TransactionResolvedEvent::new(transaction.clone());
            emitter.publish_event(event).await;
        }
    }

    /// Fetch a transaction by id. Used by the verify endpoint; purely a read, it can never race a transition.
    pub async fn fetch_transaction(&self, id: &str) -> Result<Option<Transaction>, PaymentLedgerError> {
        self.db.fetch_transaction(id).await
    }

    pub async fn fetch_transaction_by_correlation_id(
        &self,
        correlation_id: &str,
    ) -> Result<Option<Transaction>, PaymentLedgerError> {
        self.db.fetch_transaction_by_correlation_id(correlation_id).await
    }

    /// Explicit user cancellation of a completed subscription, the only terminal-to-terminal edge.
    pub async fn cancel_subscription(&self, id: &str, user_id: &str) -> Result<Transaction, PaymentLedgerError> {
        let cancelled = self.db.cancel_subscription(id, user_id).await?;
        info!("🔄️💰️ Subscription [{}] cancelled by user {user_id}", cancelled.id);
        Ok(cancelled)
    }

    pub async fn transactions_for_user(
        &self,
        user_id: &str,
        kind: Option<TransactionKind>,
    ) -> Result<Vec<Transaction>, PaymentLedgerError> {
        self.db.transactions_for_user(user_id, kind).await
    }

    pub async fn active_subscriptions_for_user(&self, user_id: &str) -> Result<Vec<Transaction>, PaymentLedgerError> {
        self.db.active_subscriptions_for_user(user_id).await
    }

    pub async fn has_active_subscription(&self, user_id: &str, plan_id: &str) -> Result<bool, PaymentLedgerError> {
        self.db.has_active_subscription(user_id, plan_id).await
    }
}
