use thiserror::Error;

use crate::db_types::PaymentMethodDetails;
use twz_common::Money;

/// A charge instruction handed to a payment provider client.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    /// The local transaction id; shown to the payer as the account reference where the provider supports it.
    pub transaction_id: String,
    pub amount: Money,
    pub currency: String,
    pub description: String,
    pub method: PaymentMethodDetails,
}

/// A successfully submitted charge. The correlation id is the provider's handle for the attempt and the join key
/// for all later status queries and callbacks.
#[derive(Debug, Clone)]
pub struct ChargeResult {
    pub correlation_id: String,
}

/// The answer to a status query. `resolved` is false while the provider still considers the attempt in flight;
/// `succeeded` is only meaningful once `resolved` is true.
#[derive(Debug, Clone, Copy, Default)]
pub struct GatewayPollResult {
    pub resolved: bool,
    pub succeeded: bool,
}

impl GatewayPollResult {
    pub fn unresolved() -> Self {
        Self::default()
    }

    pub fn resolved(succeeded: bool) -> Self {
        Self { resolved: true, succeeded }
    }
}

/// The client contract for a payment provider.
///
/// Implementations submit charges and answer status queries; they never touch the ledger. Errors from `charge`
/// are recoverable at the initiation boundary (a synthetic correlation id is substituted), and errors from
/// `query` are treated by the poller as "not yet resolved".
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayClient: Clone {
    /// A short provider label for logs ("mpesa", "card").
    fn provider(&self) -> &'static str;

    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeResult, GatewayError>;

    async fn query(&self, correlation_id: &str) -> Result<GatewayPollResult, GatewayError>;
}

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("The payment gateway could not be reached: {0}")]
    Unavailable(String),
    #[error("The payment gateway rejected the charge: {0}")]
    Rejected(String),
    #[error("The charge request was invalid: {0}")]
    InvalidRequest(String),
}
