use actix_jwt_auth_middleware::{Authority, AuthenticationService};
use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use chrono::{DateTime, Utc};
use jwt_compact::{alg::Hs256, AlgorithmExt, Claims, Header};
use log::debug;
use twz_common::Secret;

use crate::{
    auth::{build_token_signer, JwtClaims},
    config::AuthConfig,
};

// Creates a test `AuthConfig` for issuing tokens. DO NOT re-use this secret anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig { jwt_secret: Secret::new("test-secret-test-secret-test-secret!".to_string()) }
}

pub fn issue_token(claims: JwtClaims, expiry: DateTime<Utc>) -> String {
    let config = get_auth_config();
    let header = Header::empty().with_token_type("JWT");
    let signer = Hs256;
    let mut claims = Claims::new(claims);
    claims.expiration = Some(expiry);
    signer.token(&header, &claims, &config.hs256_key()).expect("Failed to sign token")
}

/// Issue a request against an app wrapped in the JWT authentication service.
pub async fn authed_request(
    auth_header: &str,
    req: TestRequest,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let mut req = req;
    if !auth_header.is_empty() {
        req = req.insert_header(("access_token", auth_header));
    }
    let req = req.to_request();
    let config = get_auth_config();
    let authority = Authority::<JwtClaims, Hs256, _, _>::new()
        .refresh_authorizer(|| async move { Ok(()) })
        .enable_header_tokens(true)
        .algorithm(Hs256)
        .verifying_key(config.hs256_key())
        .token_signer(Some(build_token_signer(&config)))
        .build()
        .expect("Failed to build authority");
    let app = App::new().wrap(AuthenticationService::new(authority)).configure(configure);

    let service = test::init_service(app).await;
    debug!("Making authenticated request");
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

/// Issue a request against an app with no authentication middleware (the public routes).
pub async fn public_request(
    req: TestRequest,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    let (_, res) =
        test::try_call_service(&service, req.to_request()).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}
