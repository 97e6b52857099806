use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::Utc;
use tradewizard_engine::{
    db_types::{NewUser, User},
    helpers::hash_password,
    traits::AccountApiError,
    AccountsApi,
};

use super::{helpers::public_request, mocks::MockUsers};
use crate::{
    auth::TokenIssuer,
    endpoint_tests::helpers::get_auth_config,
    routes::{AuthLoginRoute, AuthRegisterRoute},
};

fn stored_user() -> User {
    let now = Utc::now();
    User {
        id: "user-1".to_string(),
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
        password_hash: hash_password("hunter2"),
        is_admin: false,
        created_at: now,
        updated_at: now,
    }
}

fn configure(cfg: &mut ServiceConfig) {
    let mut users = MockUsers::new();
    users.expect_insert_user().returning(|new_user: NewUser| {
        if new_user.email == "alice@example.com" {
            Err(AccountApiError::EmailAlreadyRegistered(new_user.email))
        } else {
            let now = Utc::now();
            Ok(User {
                id: new_user.id,
                name: new_user.name,
                email: new_user.email,
                password_hash: new_user.password_hash,
                is_admin: new_user.is_admin,
                created_at: now,
                updated_at: now,
            })
        }
    });
    users.expect_fetch_user_by_email().returning(|email| {
        if email == "alice@example.com" {
            Ok(Some(stored_user()))
        } else {
            Ok(None)
        }
    });
    let api = AccountsApi::new(users);
    cfg.service(AuthRegisterRoute::<MockUsers>::new())
        .service(AuthLoginRoute::<MockUsers>::new())
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(TokenIssuer::new(&get_auth_config())));
}

#[actix_web::test]
async fn register_new_user() {
    let _ = env_logger::try_init().ok();
    let body = serde_json::json!({ "name": "Bob", "email": "bob@example.com", "password": "s3cret" });
    let req = TestRequest::post().uri("/auth/register").set_json(body);
    let (status, body) = public_request(req, configure).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let user: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(user["email"], "bob@example.com");
    assert!(user.get("password_hash").is_none(), "the password hash must never be exposed");
}

#[actix_web::test]
async fn register_duplicate_email_is_rejected() {
    let _ = env_logger::try_init().ok();
    let body = serde_json::json!({ "name": "Alice", "email": "alice@example.com", "password": "hunter2" });
    let req = TestRequest::post().uri("/auth/register").set_json(body);
    let (status, _) = public_request(req, configure).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn register_requires_all_fields() {
    let _ = env_logger::try_init().ok();
    let body = serde_json::json!({ "name": "", "email": "x@example.com", "password": "pw" });
    let req = TestRequest::post().uri("/auth/register").set_json(body);
    let (status, _) = public_request(req, configure).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn login_issues_a_token() {
    let _ = env_logger::try_init().ok();
    let body = serde_json::json!({ "email": "alice@example.com", "password": "hunter2" });
    let req = TestRequest::post().uri("/auth/login").set_json(body);
    let (status, body) = public_request(req, configure).await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let response: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(response["token_type"], "bearer");
    assert!(!response["access_token"].as_str().unwrap().is_empty());
    assert_eq!(response["user"]["id"], "user-1");
}

#[actix_web::test]
async fn login_with_wrong_password_is_unauthorized() {
    let _ = env_logger::try_init().ok();
    let body = serde_json::json!({ "email": "alice@example.com", "password": "wrong" });
    let req = TestRequest::post().uri("/auth/login").set_json(body);
    let (status, _) = public_request(req, configure).await.unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn login_with_unknown_email_is_unauthorized() {
    let _ = env_logger::try_init().ok();
    let body = serde_json::json!({ "email": "nobody@example.com", "password": "hunter2" });
    let req = TestRequest::post().uri("/auth/login").set_json(body);
    let (status, _) = public_request(req, configure).await.unwrap();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
