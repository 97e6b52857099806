use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::{Days, TimeZone, Utc};
use tradewizard_engine::{
    db_types::{Role, Transaction, TransactionKind, TransactionStatus},
    events::EventProducers,
    PaymentFlowApi,
};
use twz_common::Money;

use super::{
    helpers::{authed_request, issue_token, public_request},
    mocks::MockLedger,
};
use crate::{
    auth::JwtClaims,
    payment_routes::{MpesaCallbackRoute, VerifyPaymentRoute},
};

const OWNER_ID: &str = "user-1";

fn pending_transaction(status: TransactionStatus) -> Transaction {
    Transaction {
        id: "tx-1".to_string(),
        user_id: OWNER_ID.to_string(),
        item_id: "robot-1".to_string(),
        kind: TransactionKind::Purchase,
        amount: Money::from_units(500),
        currency: "KES".to_string(),
        payment_method: "Mpesa".to_string(),
        correlation_id: Some("CR123".to_string()),
        status,
        created_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
        subscription: None,
    }
}

fn token_for(sub: &str, roles: Vec<Role>) -> String {
    issue_token(
        JwtClaims { sub: sub.to_string(), name: "Test User".to_string(), roles },
        Utc::now() + Days::new(1),
    )
}

fn configure_verify(cfg: &mut ServiceConfig) {
    let mut ledger = MockLedger::new();
    ledger.expect_fetch_transaction().returning(move |id| {
        if id == "tx-1" {
            Ok(Some(pending_transaction(TransactionStatus::Completed)))
        } else {
            Ok(None)
        }
    });
    let api = PaymentFlowApi::new(ledger, EventProducers::default());
    cfg.service(VerifyPaymentRoute::<MockLedger>::new()).app_data(web::Data::new(api));
}

#[actix_web::test]
async fn verify_own_transaction() {
    let _ = env_logger::try_init().ok();
    let token = token_for(OWNER_ID, vec![Role::User]);
    let (status, body) =
        authed_request(&token, TestRequest::get().uri("/payments/verify/tx-1"), configure_verify).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let view: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(view["success"], true);
    assert_eq!(view["status"], "Completed");
    assert_eq!(view["transaction_id"], "tx-1");
}

#[actix_web::test]
async fn verify_foreign_transaction_is_forbidden() {
    let _ = env_logger::try_init().ok();
    let token = token_for("somebody-else", vec![Role::User]);
    let (status, _) =
        authed_request(&token, TestRequest::get().uri("/payments/verify/tx-1"), configure_verify).await.unwrap();
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn admins_can_verify_any_transaction() {
    let _ = env_logger::try_init().ok();
    let token = token_for("admin-1", vec![Role::User, Role::Admin]);
    let (status, _) =
        authed_request(&token, TestRequest::get().uri("/payments/verify/tx-1"), configure_verify).await.unwrap();
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn verify_unknown_transaction_is_not_found() {
    let _ = env_logger::try_init().ok();
    let token = token_for(OWNER_ID, vec![Role::User]);
    let (status, _) =
        authed_request(&token, TestRequest::get().uri("/payments/verify/nope"), configure_verify).await.unwrap();
    assert_eq!(status, StatusCode::NOT_FOUND);
}

//------------------------------------------  Callback endpoint  ------------------------------------------------------

fn configure_callback(cfg: &mut ServiceConfig) {
    let mut ledger = MockLedger::new();
    ledger.expect_settle_pending_transaction().returning(|correlation_id, succeeded| {
        if correlation_id == "CR123" {
            let status = if succeeded { TransactionStatus::Completed } else { TransactionStatus::Failed };
            Ok(Some(pending_transaction(status)))
        } else {
            // Unknown or already-terminal correlation ids are silent no-ops.
            Ok(None)
        }
    });
    let api = PaymentFlowApi::new(ledger, EventProducers::default());
    cfg.service(MpesaCallbackRoute::<MockLedger>::new()).app_data(web::Data::new(api));
}

fn stk_callback_body(result_code: i64) -> serde_json::Value {
    serde_json::json!({
        "Body": {
            "stkCallback": {
                "MerchantRequestID": "29115-34620561-1",
                "CheckoutRequestID": "CR123",
                "ResultCode": result_code,
                "ResultDesc": "whatever the provider says"
            }
        }
    })
}

#[actix_web::test]
async fn successful_callback_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/callback/mpesa").set_json(stk_callback_body(0));
    let (status, body) = public_request(req, configure_callback).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let ack: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(ack["success"], true);
}

#[actix_web::test]
async fn late_callback_is_still_http_200() {
    let _ = env_logger::try_init().ok();
    let mut payload = stk_callback_body(0);
    payload["Body"]["stkCallback"]["CheckoutRequestID"] = "CR-unknown".into();
    let req = TestRequest::post().uri("/callback/mpesa").set_json(payload);
    let (status, body) = public_request(req, configure_callback).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let ack: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(ack["success"], true);
    assert_eq!(ack["message"], "Already processed");
}

#[actix_web::test]
async fn malformed_callback_gets_negative_ack_not_an_error() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/callback/mpesa").set_payload("this is not json");
    let (status, body) = public_request(req, configure_callback).await.unwrap();
    assert_eq!(status, StatusCode::OK, "the provider must always receive HTTP 200");
    let ack: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(ack["success"], false);
}
