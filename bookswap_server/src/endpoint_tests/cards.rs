use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use bookswap_engine::{traits::MarketplaceError, CardApi};
use chrono::{Datelike, Utc};
use serde_json::json;

use super::{
    helpers::send_as,
    mocks::{card, MockCards},
};
use crate::routes::{AddCardRoute, DeleteCardRoute, MyCardsRoute, SetDefaultCardRoute};

fn configure(db: MockCards) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(MyCardsRoute::<MockCards>::new())
            .service(AddCardRoute::<MockCards>::new())
            .service(DeleteCardRoute::<MockCards>::new())
            .service(SetDefaultCardRoute::<MockCards>::new())
            .app_data(web::Data::new(CardApi::new(db)));
    }
}

fn card_details(number: &str) -> serde_json::Value {
    json!({
        "card_number": number,
        "cardholder_name": "Ada Lovelace",
        "expiry_month": 12,
        "expiry_year": Utc::now().year() + 2
    })
}

#[actix_web::test]
async fn my_cards_never_show_the_token() {
    let _ = env_logger::try_init();
    let mut db = MockCards::new();
    db.expect_fetch_cards_for_user().returning(|user_id| Ok(vec![card(2, user_id, true), card(1, user_id, false)]));
    let (status, body) = send_as(8, TestRequest::get().uri("/cards"), configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    let cards = body.as_array().unwrap();
    assert_eq!(cards.len(), 2);
    assert_eq!(cards[0]["is_default"], true);
    assert!(cards.iter().all(|c| c.get("payment_token").is_none()));
}

#[actix_web::test]
async fn add_card() {
    let _ = env_logger::try_init();
    let mut db = MockCards::new();
    db.expect_insert_card()
        .withf(|c| c.user_id == 8 && c.last_four == "1111" && c.cardholder_name == "Ada Lovelace")
        .returning(|c| Ok(card(3, c.user_id, false)));
    let req = TestRequest::post().uri("/cards").set_json(card_details("4111 1111 1111 1111"));
    let (status, body) = send_as(8, req, configure(db)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["card_type"], "visa");
    assert_eq!(body["last_four"], "1111");
    assert!(body.get("card_number").is_none());
    assert!(body.get("payment_token").is_none());
}

#[actix_web::test]
async fn add_card_with_a_typo() {
    let _ = env_logger::try_init();
    let req = TestRequest::post().uri("/cards").set_json(card_details("4111 1111 1111 1112"));
    let (status, body) = send_as(8, req, configure(MockCards::new())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"]["card_number"][0], "Card number is not valid");
}

#[actix_web::test]
async fn add_expired_card() {
    let _ = env_logger::try_init();
    let mut details = card_details("4111 1111 1111 1111");
    details["expiry_year"] = json!(2019);
    let req = TestRequest::post().uri("/cards").set_json(details);
    let (status, body) = send_as(8, req, configure(MockCards::new())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"]["expiry_year"][0], "Card has expired");
}

#[actix_web::test]
async fn delete_card() {
    let _ = env_logger::try_init();
    let mut db = MockCards::new();
    db.expect_delete_card().withf(|user_id, card_id| *user_id == 8 && *card_id == 2).returning(|_, _| Ok(()));
    let (status, body) = send_as(8, TestRequest::delete().uri("/cards/2"), configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Card #2 deleted.");

    // Another user's card looks exactly like a card that does not exist
    let mut db = MockCards::new();
    db.expect_delete_card().returning(|_, card_id| Err(MarketplaceError::CardNotFound(card_id)));
    let (status, body) = send_as(9, TestRequest::delete().uri("/cards/2"), configure(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Card #2 does not exist");
}

#[actix_web::test]
async fn set_default_card() {
    let _ = env_logger::try_init();
    let mut db = MockCards::new();
    db.expect_set_default_card().returning(|user_id, card_id| Ok(card(card_id, user_id, true)));
    let (status, body) = send_as(8, TestRequest::post().uri("/cards/1/default"), configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1);
    assert_eq!(body["is_default"], true);
}
