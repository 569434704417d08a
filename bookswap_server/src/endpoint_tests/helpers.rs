use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::Duration;
use log::debug;
use serde_json::Value;

use crate::{
    auth::{TokenIssuer, TokenValidator},
    config::AuthConfig,
    server::configure_extractors,
};

// Creates a test `AuthConfig` for issuing tokens. DO NOT re-use this secret anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new("9c41e07bd25a4f3e8d6b1a0c7f2e5d38")
}

pub fn issue_token(user_id: i64, valid_for: Option<Duration>) -> String {
    TokenIssuer::new(&get_auth_config()).issue_token(user_id, valid_for).expect("Failed to sign token")
}

/// An `Authorization` header value carrying a valid token for `user_id`.
pub fn bearer(user_id: i64) -> String {
    format!("Bearer {}", issue_token(user_id, None))
}

/// Runs `req` against an app built from `configure`, with token validation and the JSON extractor configuration in
/// place. Returns the status and the body, parsed as JSON when possible.
pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, Value)
where F: FnOnce(&mut ServiceConfig) {
    let validator = TokenValidator::new(&get_auth_config());
    let app = App::new().app_data(web::Data::new(validator)).configure(configure_extractors).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::call_service(&service, req.to_request()).await.into_parts();
    let status = res.status();
    let bytes = res.into_body().try_into_bytes().unwrap();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    debug!("Response: {status} {body}");
    (status, body)
}

/// `send_request` on behalf of `user_id`.
pub async fn send_as<F>(user_id: i64, req: TestRequest, configure: F) -> (StatusCode, Value)
where F: FnOnce(&mut ServiceConfig) {
    send_request(req.insert_header(("Authorization", bearer(user_id))), configure).await
}
