//! Bearer token authentication.
//!
//! Users sign in with the identity provider, which hands out HS256-signed JWTs. The `sub` claim carries the
//! marketplace user id and `exp` the expiry time. The server shares the signing secret with the identity provider
//! (`BSW_JWT_SECRET`) and only ever validates tokens. [`TokenIssuer`] exists for local development and tests.
//!
//! Handlers that need a signed-in user take an [`AuthenticatedUser`] argument. Extraction fails with a 401 response
//! when the token is missing, malformed, expired or not signed with the shared secret.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode,
    encode,
    errors::ErrorKind as JwtErrorKind,
    Algorithm,
    DecodingKey,
    EncodingKey,
    Header,
    Validation,
};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The marketplace user id
    pub sub: String,
    /// Expiry, in seconds since the Unix epoch
    pub exp: i64,
}

impl JwtClaims {
    pub fn new(user_id: i64, valid_for: Duration) -> Self {
        Self { sub: user_id.to_string(), exp: (Utc::now() + valid_for).timestamp() }
    }

    pub fn user_id(&self) -> Result<i64, AuthError> {
        self.sub.parse::<i64>().ok().filter(|id| *id > 0).ok_or(AuthError::InvalidSubject)
    }
}

pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(config: &AuthConfig) -> Self {
        let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.leeway = 0;
        Self { key, validation }
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation).map_err(|e| match e.kind() {
            JwtErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            _ => AuthError::ValidationError(e.to_string()),
        })?;
        Ok(data.claims)
    }
}

pub struct TokenIssuer {
    key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { key: EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes()) }
    }

    /// Issues an access token for `user_id`. Tokens are valid for a day unless `valid_for` says otherwise.
    pub fn issue_token(&self, user_id: i64, valid_for: Option<Duration>) -> Result<String, AuthError> {
        let claims = JwtClaims::new(user_id, valid_for.unwrap_or_else(|| Duration::hours(24)));
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &JwtClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.key).map_err(|e| AuthError::ValidationError(e.to_string()))
    }
}

/// The signed-in user making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: i64,
}

impl FromRequest for AuthenticatedUser {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).map_err(|e| {
            debug!("💻️ Rejected request to {}. {e}", req.path());
            ServerError::from(e)
        }))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AuthError> {
    let validator = req.app_data::<web::Data<TokenValidator>>().ok_or(AuthError::MissingConfiguration)?;
    let value = req.headers().get(header::AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let value = value.to_str().map_err(|_| AuthError::PoorlyFormattedToken)?;
    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::PoorlyFormattedToken)?;
    let claims = validator.validate(token)?;
    let id = claims.user_id()?;
    trace!("💻️ Authenticated user #{id}");
    Ok(AuthenticatedUser { id })
}
