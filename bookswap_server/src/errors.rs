use std::collections::BTreeMap;

use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use bookswap_engine::{ErrorKind, MarketplaceError};
use log::error;
use serde_json::{json, Value};
use thiserror::Error;

/// Per-field validation messages for a request body or query string.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("The request contained invalid values.")]
    ValidationFailed(FieldErrors),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("{0}")]
    Marketplace(#[from] MarketplaceError),
}

impl ServerError {
    pub fn validation<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(field.into(), vec![message.into()]);
        Self::ValidationFailed(fields)
    }

    /// The `kind` label in the error body.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequestBody(_) | Self::InvalidRequestPath(_) => "bad_request",
            Self::ValidationFailed(_) => "validation",
            Self::AuthenticationError(AuthError::MissingConfiguration) => "internal",
            Self::AuthenticationError(_) => "unauthenticated",
            Self::Marketplace(e) => match e.kind() {
                ErrorKind::Validation => "validation",
                ErrorKind::NotFound => "not_found",
                ErrorKind::Forbidden => "forbidden",
                ErrorKind::InvalidTransition => "invalid_transition",
                ErrorKind::Conflict => "conflict",
                ErrorKind::DependencyFailure => "internal",
            },
            Self::InitializeError(_) | Self::IOError(_) | Self::ConfigurationError(_) | Self::Unspecified(_) => {
                "internal"
            },
        }
    }

    /// The message clients get to see. Backend details of internal failures stay in the server log.
    fn public_message(&self) -> String {
        match self {
            Self::Marketplace(MarketplaceError::DatabaseError(_)) |
            Self::InitializeError(_) |
            Self::IOError(_) |
            Self::ConfigurationError(_) |
            Self::Unspecified(_) => "An internal error occurred. Please try again later.".to_string(),
            _ => self.to_string(),
        }
    }

    fn body(&self) -> Value {
        let mut body = json!({ "error": self.public_message(), "kind": self.kind() });
        match self {
            Self::ValidationFailed(fields) => {
                body["fields"] = json!(fields);
            },
            Self::Marketplace(MarketplaceError::InvalidInput { field, message }) => {
                body["fields"] = json!({ field: [message] });
            },
            Self::Marketplace(MarketplaceError::ListingQuotaExceeded { current_listings, max_listings }) => {
                body["current_listings"] = json!(current_listings);
                body["max_listings"] = json!(max_listings);
            },
            _ => {},
        }
        body
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::AuthenticationError(AuthError::MissingConfiguration) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::Marketplace(e) => match e.kind() {
                ErrorKind::Validation | ErrorKind::InvalidTransition => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Forbidden => StatusCode::FORBIDDEN,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::DependencyFailure => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            error!("💻️ Request failed with an internal error. {self}");
        }
        HttpResponse::build(self.status_code()).insert_header(ContentType::json()).body(self.body().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("No access token was provided. Send it in the Authorization header as a Bearer token.")]
    MissingToken,
    #[error("The Authorization header is not in the 'Bearer <token>' format.")]
    PoorlyFormattedToken,
    #[error("The access token has expired.")]
    ExpiredToken,
    #[error("The access token is invalid. {0}")]
    ValidationError(String),
    #[error("The access token subject is not a user id.")]
    InvalidSubject,
    #[error("Token validation has not been configured on the server.")]
    MissingConfiguration,
}
