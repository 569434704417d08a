use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use bookswap_engine::AccountApi;
use chrono::{Duration, Utc};

use super::{
    helpers::{get_auth_config, issue_token, send_as, send_request},
    mocks::{tier, user, MockAccounts},
};
use crate::{
    auth::{JwtClaims, TokenIssuer},
    config::AuthConfig,
    routes::{health, MyAccountRoute, TiersRoute},
};

fn configure(db: MockAccounts) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(health)
            .service(MyAccountRoute::<MockAccounts>::new())
            .service(TiersRoute::<MockAccounts>::new())
            .app_data(web::Data::new(AccountApi::new(db)));
    }
}

async fn account_request(auth_header: Option<String>) -> (StatusCode, serde_json::Value) {
    let mut req = TestRequest::get().uri("/account");
    if let Some(header) = auth_header {
        req = req.insert_header(("Authorization", header));
    }
    // Any call to the mock fails the test, since none are expected
    send_request(req, configure(MockAccounts::new())).await
}

#[actix_web::test]
async fn health_needs_no_token() {
    let _ = env_logger::try_init();
    let (status, body) = send_request(TestRequest::get().uri("/health"), configure(MockAccounts::new())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn fetch_my_account_no_headers() {
    let _ = env_logger::try_init();
    let (status, body) = account_request(None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "unauthenticated");
    assert_eq!(
        body["error"],
        "Authentication Error. No access token was provided. Send it in the Authorization header as a Bearer token."
    );
}

#[actix_web::test]
async fn fetch_my_account_wrong_scheme() {
    let _ = env_logger::try_init();
    let token = issue_token(1, None);
    let (status, body) = account_request(Some(format!("Basic {token}"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("'Bearer <token>'"), "was: {body}");
}

#[actix_web::test]
async fn fetch_my_account_expired_token() {
    let _ = env_logger::try_init();
    let token = issue_token(1, Some(Duration::hours(-1)));
    let (status, body) = account_request(Some(format!("Bearer {token}"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication Error. The access token has expired.");
}

#[actix_web::test]
async fn fetch_my_account_forged_token() {
    let _ = env_logger::try_init();
    let forger = TokenIssuer::new(&AuthConfig::new("not the secret the server knows"));
    let token = forger.issue_token(1, None).unwrap();
    let (status, body) = account_request(Some(format!("Bearer {token}"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().starts_with("Authentication Error. The access token is invalid."));
}

#[actix_web::test]
async fn fetch_my_account_without_a_user_id() {
    let _ = env_logger::try_init();
    let claims = JwtClaims { sub: "admin".into(), exp: (Utc::now() + Duration::hours(1)).timestamp() };
    let token = TokenIssuer::new(&get_auth_config()).sign(&claims).unwrap();
    let (status, body) = account_request(Some(format!("Bearer {token}"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication Error. The access token subject is not a user id.");
}

#[actix_web::test]
async fn fetch_my_account() {
    let _ = env_logger::try_init();
    let mut db = MockAccounts::new();
    db.expect_fetch_user().withf(|id| *id == 7).returning(|id| Ok(Some(user(id, 3))));
    db.expect_fetch_tier().withf(|id| *id == 3).returning(|id| Ok(Some(tier(id, "Pro", 25))));
    let (status, body) = send_as(7, TestRequest::get().uri("/account"), configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 7);
    assert_eq!(body["tier"]["name"], "Pro");
    assert_eq!(body["tier"]["max_listings"], 25);
}

#[actix_web::test]
async fn fetch_my_account_unknown_user() {
    let _ = env_logger::try_init();
    let mut db = MockAccounts::new();
    db.expect_fetch_user().returning(|_| Ok(None));
    let (status, body) = send_as(404, TestRequest::get().uri("/account"), configure(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User #404 does not exist");
}

#[actix_web::test]
async fn fetch_tiers() {
    let _ = env_logger::try_init();
    let mut db = MockAccounts::new();
    db.expect_fetch_tiers()
        .returning(|| Ok(vec![tier(1, "Buyer", 0), tier(2, "Basic", 5), tier(3, "Pro", 25), tier(4, "Premium", 100)]));
    let (status, body) = send_as(1, TestRequest::get().uri("/tiers"), configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    let tiers = body.as_array().unwrap();
    assert_eq!(tiers.len(), 4);
    assert_eq!(tiers[0]["max_listings"], 0);
}
