use std::time::Duration;

use actix_jwt_auth_middleware::{FromRequest, TokenSigner};
use jwt_compact::{alg::Hs256, Header};
use serde::{Deserialize, Serialize};
use tradewizard_engine::db_types::{Role, Roles, User};

use crate::{config::AuthConfig, errors::AuthError};

/// The claims carried in every access token. Extracted from the request by the JWT middleware and injected into
/// handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRequest)]
pub struct JwtClaims {
    /// The authenticated user's id.
    pub sub: String,
    pub name: String,
    pub roles: Roles,
}

impl JwtClaims {
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }

    /// True when the claims holder may read records owned by `user_id`.
    pub fn may_access(&self, user_id: &str) -> bool {
        self.sub == user_id || self.is_admin()
    }
}

pub fn build_token_signer(config: &AuthConfig) -> TokenSigner<JwtClaims, Hs256> {
    let header = Header::empty().with_token_type("JWT");
    TokenSigner::new()
        .signing_key(config.hs256_key())
        .algorithm(Hs256)
        .header(header)
        .build()
        .expect("Failed to build token signer")
}

pub struct TokenIssuer {
    signer: TokenSigner<JwtClaims, Hs256>,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let signer = build_token_signer(config);
        Self { signer }
    }

    /// Issue a new access token for the given user. Tokens are valid for 24 hours and do not refresh.
    pub fn issue_token(&self, user: &User, duration: Option<Duration>) -> Result<String, AuthError> {
        let claim = JwtClaims { sub: user.id.clone(), name: user.name.clone(), roles: user.roles() };
        let duration = duration.unwrap_or_else(|| Duration::from_secs(60 * 60 * 24));
        let token =
            self.signer.create_signed_token(&claim, duration).map_err(|e| AuthError::ValidationError(format!("{e:?}")))?;
        Ok(token)
    }
}
