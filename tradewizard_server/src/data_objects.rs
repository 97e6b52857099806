use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tradewizard_engine::db_types::{PaymentMethodDetails, RequestStatus, TransactionKind, User};
use twz_common::Money;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

//--------------------------------------        Auth          ---------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserView,
}

/// The public shape of a user record. Never exposes the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

//--------------------------------------      Payments        ---------------------------------------------------------
/// The payment initiation body. The charge instrument is a tagged variant, so malformed or mixed-up payloads are
/// rejected during deserialization and the core only ever sees a well-typed request.
#[derive(Debug, Clone, Deserialize)]
pub struct InitiatePaymentRequest {
    pub amount: Money,
    pub currency: String,
    /// Robot id for purchases, plan id for subscriptions.
    pub item_id: String,
    pub kind: TransactionKind,
    #[serde(flatten)]
    pub details: PaymentMethodDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiatePaymentResponse {
    pub success: bool,
    pub message: String,
    pub transaction_id: String,
    pub correlation_id: String,
}

//--------------------------------------        Chat          ---------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
pub struct NewConversationRequest {
    #[serde(default)]
    pub title: Option<String>,
}

//--------------------------------------    Robot requests    ---------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRobotRequest {
    pub status: RequestStatus,
}

//--------------------------------------    Notifications     ---------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNotificationRequest {
    pub user_id: String,
    pub message: String,
    pub kind: String,
    #[serde(default)]
    pub related_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn initiate_request_flattens_method_details() {
        let body = r#"{
            "amount": 50000,
            "currency": "KES",
            "item_id": "robot-1",
            "kind": "Purchase",
            "method": "mpesa",
            "phone_number": "0712345678"
        }"#;
        let req: InitiatePaymentRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.kind, TransactionKind::Purchase);
        assert_eq!(req.details, PaymentMethodDetails::Mpesa { phone_number: "0712345678".into() });
        assert_eq!(req.amount, Money::from_units(500));
    }

    #[test]
    fn initiate_request_rejects_unknown_method() {
        let body = r#"{
            "amount": 100,
            "currency": "USD",
            "item_id": "plan-1",
            "kind": "Subscription",
            "method": "cheque"
        }"#;
        assert!(serde_json::from_str::<InitiatePaymentRequest>(body).is_err());
    }
}
