use serde::{Deserialize, Serialize};

use crate::db_types::{Transaction, TransactionStatus};

/// The read-only answer to a verification request. `success` is derived from the persisted status; verification
/// never contacts the gateway and never transitions state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionStatusView {
    pub transaction_id: String,
    pub status: TransactionStatus,
    pub success: bool,
    pub message: String,
    pub correlation_id: Option<String>,
}

impl From<&Transaction> for TransactionStatusView {
    fn from(tx: &Transaction) -> Self {
        let (success, message) = match tx.status {
            TransactionStatus::Pending => (false, "Payment is still being processed".to_string()),
            TransactionStatus::Completed => (true, "Payment completed successfully".to_string()),
            TransactionStatus::Failed => (false, "Payment failed".to_string()),
            TransactionStatus::Cancelled => (false, "Subscription has been cancelled".to_string()),
        };
        Self { transaction_id: tx.id.clone(), status: tx.status, success, message, correlation_id: tx.correlation_id.clone() }
    }
}
