use log::*;
use tradewizard_engine::{
    db_types::PaymentMethodDetails,
    traits::{ChargeRequest, ChargeResult, GatewayError, GatewayPollResult, PaymentGatewayClient},
};

/// A stand-in card processor. It validates the shape of the card details and approves every structurally valid
/// charge immediately; swap it for a real PSP client to take card payments in production.
#[derive(Clone, Default)]
pub struct CardGateway;

impl CardGateway {
    pub fn new() -> Self {
        Self
    }
}

impl PaymentGatewayClient for CardGateway {
    fn provider(&self) -> &'static str {
        "card"
    }

    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeResult, GatewayError> {
        let PaymentMethodDetails::Card { card_number, expiry, cvv } = &request.method else {
            return Err(GatewayError::InvalidRequest("The card gateway only handles card charges".into()));
        };
        let digits: String = card_number.chars().filter(|c| !c.is_whitespace()).collect();
        let valid = digits.len() >= 13
            && digits.len() <= 19
            && digits.chars().all(|c| c.is_ascii_digit())
            && !expiry.is_empty()
            && (3..=4).contains(&cvv.len())
            && cvv.chars().all(|c| c.is_ascii_digit());
        if !valid {
            return Err(GatewayError::Rejected("Invalid card details".into()));
        }
        let correlation_id = format!("card-{}", uuid::Uuid::new_v4());
        debug!("💳️ Card charge for transaction [{}] accepted as {correlation_id}", request.transaction_id);
        Ok(ChargeResult { correlation_id })
    }

    async fn query(&self, correlation_id: &str) -> Result<GatewayPollResult, GatewayError> {
        // The stand-in processor settles instantly.
        trace!("💳️ Card status query for {correlation_id}");
        Ok(GatewayPollResult::resolved(true))
    }
}

#[cfg(test)]
mod test {
    use tradewizard_engine::traits::ChargeRequest;
    use twz_common::Money;

    use super::*;

    fn charge_with(card_number: &str, expiry: &str, cvv: &str) -> ChargeRequest {
        ChargeRequest {
            transaction_id: "tx-1".into(),
            amount: Money::from_units(100),
            currency: "USD".into(),
            description: "test".into(),
            method: PaymentMethodDetails::Card {
                card_number: card_number.into(),
                expiry: expiry.into(),
                cvv: cvv.into(),
            },
        }
    }

    #[tokio::test]
    async fn valid_card_is_approved() {
        let gateway = CardGateway::new();
        let result = gateway.charge(&charge_with("4242 4242 4242 4242", "12/29", "123")).await.unwrap();
        assert!(result.correlation_id.starts_with("card-"));
        let poll = gateway.query(&result.correlation_id).await.unwrap();
        assert!(poll.resolved && poll.succeeded);
    }

    #[tokio::test]
    async fn malformed_cards_are_rejected() {
        let gateway = CardGateway::new();
        for (number, expiry, cvv) in
            [("1234", "12/29", "123"), ("4242424242424242", "", "123"), ("4242424242424242", "12/29", "12x")]
        {
            let err = gateway.charge(&charge_with(number, expiry, cvv)).await.unwrap_err();
            assert!(matches!(err, GatewayError::Rejected(_)), "{number}/{expiry}/{cvv} should be rejected");
        }
    }
}
