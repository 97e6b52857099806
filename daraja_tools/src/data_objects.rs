//! Wire types for the Daraja API. Field names follow the provider's PascalCase JSON exactly, so every struct
//! carries serde rename attributes rather than leaking provider casing into the rest of the codebase.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub expires_in: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StkPushRequest {
    #[serde(rename = "BusinessShortCode")]
    pub business_short_code: String,
    #[serde(rename = "Password")]
    pub password: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "TransactionType")]
    pub transaction_type: String,
    /// Whole currency units. Daraja rejects fractional amounts.
    #[serde(rename = "Amount")]
    pub amount: i64,
    #[serde(rename = "PartyA")]
    pub party_a: String,
    #[serde(rename = "PartyB")]
    pub party_b: String,
    #[serde(rename = "PhoneNumber")]
    pub phone_number: String,
    #[serde(rename = "CallBackURL")]
    pub callback_url: String,
    #[serde(rename = "AccountReference")]
    pub account_reference: String,
    #[serde(rename = "TransactionDesc")]
    pub transaction_desc: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StkPushResponse {
    #[serde(rename = "MerchantRequestID")]
    pub merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    #[serde(rename = "ResponseCode")]
    pub response_code: String,
    #[serde(rename = "ResponseDescription")]
    pub response_description: String,
    #[serde(rename = "CustomerMessage")]
    pub customer_message: String,
}

impl StkPushResponse {
    pub fn is_accepted(&self) -> bool {
        self.response_code == "0"
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StkQueryRequest {
    #[serde(rename = "BusinessShortCode")]
    pub business_short_code: String,
    #[serde(rename = "Password")]
    pub password: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
}

/// Response to an STK status query. `result_code` is only present once the customer has responded to the
/// push prompt; while the prompt is still open, Daraja omits it.
#[derive(Debug, Clone, Deserialize)]
pub struct StkQueryResponse {
    #[serde(rename = "ResponseCode")]
    pub response_code: String,
    #[serde(rename = "ResponseDescription")]
    pub response_description: String,
    #[serde(rename = "MerchantRequestID", default)]
    pub merchant_request_id: Option<String>,
    #[serde(rename = "CheckoutRequestID", default)]
    pub checkout_request_id: Option<String>,
    #[serde(rename = "ResultCode", default)]
    pub result_code: Option<String>,
    #[serde(rename = "ResultDesc", default)]
    pub result_desc: Option<String>,
}

impl StkQueryResponse {
    /// The transaction has reached a final state at the provider.
    pub fn is_resolved(&self) -> bool {
        self.result_code.is_some()
    }

    /// Result code "0" is the provider's success sentinel.
    pub fn is_successful(&self) -> bool {
        self.result_code.as_deref() == Some("0")
    }
}

//--------------------------------------   STK callback envelope   ----------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StkCallbackEnvelope {
    #[serde(rename = "Body")]
    pub body: StkCallbackBody,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StkCallbackBody {
    #[serde(rename = "stkCallback")]
    pub stk_callback: StkCallback,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StkCallback {
    #[serde(rename = "MerchantRequestID")]
    pub merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    #[serde(rename = "ResultCode")]
    pub result_code: i64,
    #[serde(rename = "ResultDesc")]
    pub result_desc: String,
    #[serde(rename = "CallbackMetadata", default)]
    pub callback_metadata: Option<CallbackMetadata>,
}

impl StkCallback {
    pub fn is_successful(&self) -> bool {
        self.result_code == 0
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CallbackMetadata {
    #[serde(rename = "Item")]
    pub item: Vec<CallbackItem>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CallbackItem {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value", default)]
    pub value: Option<serde_json::Value>,
}

#[cfg(test)]
mod test {
    use super::*;

    const SUCCESS_CALLBACK: &str = r#"{
        "Body": {
            "stkCallback": {
                "MerchantRequestID": "29115-34620561-1",
                "CheckoutRequestID": "ws_CO_191220191020363925",
                "ResultCode": 0,
                "ResultDesc": "The service request is processed successfully.",
                "CallbackMetadata": {
                    "Item": [
                        { "Name": "Amount", "Value": 500.00 },
                        { "Name": "MpesaReceiptNumber", "Value": "NLJ7RT61SV" },
                        { "Name": "PhoneNumber", "Value": 254708374149 }
                    ]
                }
            }
        }
    }"#;

    const FAILURE_CALLBACK: &str = r#"{
        "Body": {
            "stkCallback": {
                "MerchantRequestID": "29115-34620561-1",
                "CheckoutRequestID": "ws_CO_191220191020363925",
                "ResultCode": 1032,
                "ResultDesc": "Request cancelled by user."
            }
        }
    }"#;

    #[test]
    fn deserialize_success_callback() {
        let envelope: StkCallbackEnvelope = serde_json::from_str(SUCCESS_CALLBACK).unwrap();
        let cb = envelope.body.stk_callback;
        assert!(cb.is_successful());
        assert_eq!(cb.checkout_request_id, "ws_CO_191220191020363925");
        assert_eq!(cb.callback_metadata.unwrap().item.len(), 3);
    }

    #[test]
    fn deserialize_failure_callback() {
        let envelope: StkCallbackEnvelope = serde_json::from_str(FAILURE_CALLBACK).unwrap();
        let cb = envelope.body.stk_callback;
        assert!(!cb.is_successful());
        assert_eq!(cb.result_code, 1032);
        assert!(cb.callback_metadata.is_none());
    }

    #[test]
    fn query_response_resolution() {
        let pending: StkQueryResponse = serde_json::from_str(
            r#"{"ResponseCode": "0", "ResponseDescription": "The transaction is being processed"}"#,
        )
        .unwrap();
        assert!(!pending.is_resolved());
        assert!(!pending.is_successful());

        let done: StkQueryResponse = serde_json::from_str(
            r#"{"ResponseCode": "0", "ResponseDescription": "ok", "ResultCode": "0", "ResultDesc": "done"}"#,
        )
        .unwrap();
        assert!(done.is_resolved());
        assert!(done.is_successful());
    }
}
