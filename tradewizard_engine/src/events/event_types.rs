use serde::{Deserialize, Serialize};

use crate::db_types::Transaction;

/// Fired exactly once per transaction, when the reconciler commits the transition out of `Pending`.
/// Subscribers (the notification fan-out, primarily) receive the post-transition record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionResolvedEvent {
    pub transaction: Transaction,
}

impl TransactionResolvedEvent {
    pub fn new(transaction: Transaction) -> Self {
        Self { transaction }
    }
}
