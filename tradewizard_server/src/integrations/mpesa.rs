use daraja_tools::{helpers::normalize_msisdn, DarajaApi, DarajaConfig};
use log::*;
use tradewizard_engine::{
    db_types::PaymentMethodDetails,
    traits::{ChargeRequest, ChargeResult, GatewayError, GatewayPollResult, PaymentGatewayClient},
};

use crate::errors::ServerError;

/// The M-Pesa STK push gateway, backed by the Daraja API client.
#[derive(Clone)]
pub struct MpesaGateway {
    api: DarajaApi,
}

impl MpesaGateway {
    pub fn new(config: DarajaConfig) -> Result<Self, ServerError> {
        let api = DarajaApi::new(config).map_err(|e| ServerError::InitializeError(e.to_string()))?;
        Ok(Self { api })
    }
}

impl PaymentGatewayClient for MpesaGateway {
    fn provider(&self) -> &'static str {
        "mpesa"
    }

    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeResult, GatewayError> {
        let PaymentMethodDetails::Mpesa { phone_number } = &request.method else {
            return Err(GatewayError::InvalidRequest("The M-Pesa gateway only handles mobile money charges".into()));
        };
        let msisdn = normalize_msisdn(phone_number);
        debug!("📱️ Sending STK push for transaction [{}] to {msisdn}", request.transaction_id);
        let response = self
            .api
            .stk_push(&msisdn, request.amount, "TradeWizard", &request.description)
            .await
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;
        if response.is_accepted() {
            info!(
                "📱️ STK push for transaction [{}] accepted. Checkout request id: {}",
                request.transaction_id, response.checkout_request_id
            );
            Ok(ChargeResult { correlation_id: response.checkout_request_id })
        } else {
            warn!("📱️ STK push for transaction [{}] rejected: {}", request.transaction_id, response.response_description);
            Err(GatewayError::Rejected(response.response_description))
        }
    }

    async fn query(&self, correlation_id: &str) -> Result<GatewayPollResult, GatewayError> {
        let response =
            self.api.stk_query(correlation_id).await.map_err(|e| GatewayError::Unavailable(e.to_string()))?;
        trace!("📱️ STK query for {correlation_id}: resolved={}", response.is_resolved());
        Ok(GatewayPollResult { resolved: response.is_resolved(), succeeded: response.is_successful() })
    }
}
