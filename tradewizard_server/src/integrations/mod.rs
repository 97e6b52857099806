pub mod card;
pub mod mpesa;

use tradewizard_engine::traits::{ChargeRequest, ChargeResult, GatewayError, GatewayPollResult, PaymentGatewayClient};

pub use card::CardGateway;
pub use mpesa::MpesaGateway;

/// The set of configured payment providers, as one concrete type so the background poller does not need to be
/// generic over the gateway it polls.
#[derive(Clone)]
pub enum PaymentGateways {
    Mpesa(MpesaGateway),
    Card(CardGateway),
}

impl PaymentGatewayClient for PaymentGateways {
    fn provider(&self) -> &'static str {
        match self {
            PaymentGateways::Mpesa(g) => g.provider(),
            PaymentGateways::Card(g) => g.provider(),
        }
    }

    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeResult, GatewayError> {
        match self {
            PaymentGateways::Mpesa(g) => g.charge(request).await,
            PaymentGateways::Card(g) => g.charge(request).await,
        }
    }

    async fn query(&self, correlation_id: &str) -> Result<GatewayPollResult, GatewayError> {
        match self {
            PaymentGateways::Mpesa(g) => g.query(correlation_id).await,
            PaymentGateways::Card(g) => g.query(correlation_id).await,
        }
    }
}
