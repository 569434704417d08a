//! Order endpoints, run against a throwaway SQLite database so that the checkout transaction, the state machine and the
//! notification hook all take part.
use std::time::Duration;

use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use bookswap_engine::{
    events::EventProducers,
    test_utils::prepare_env::{
        prepare_test_env,
        random_db_path,
        seed_product,
        seed_user,
        tear_down,
        BASIC_TIER,
        BUYER_TIER,
    },
    traits::NotificationManagement,
    NotificationApi,
    OrderFlowApi,
    SqliteDatabase,
};
use serde_json::{json, Value};

use super::helpers::send_as;
use crate::{
    routes::{
        AcceptOrderRoute,
        CompleteOrderRoute,
        CreateOrderRoute,
        MyNotificationsRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        OrderInTransitRoute,
        RejectOrderRoute,
        ShipOrderRoute,
    },
    server::start_event_hooks,
};

fn configure(db: SqliteDatabase, producers: EventProducers) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(AcceptOrderRoute::<SqliteDatabase>::new())
            .service(RejectOrderRoute::<SqliteDatabase>::new())
            .service(ShipOrderRoute::<SqliteDatabase>::new())
            .service(OrderInTransitRoute::<SqliteDatabase>::new())
            .service(CompleteOrderRoute::<SqliteDatabase>::new())
            .service(MyNotificationsRoute::<SqliteDatabase>::new())
            .app_data(web::Data::new(NotificationApi::new(db.clone())))
            .app_data(web::Data::new(OrderFlowApi::new(db, producers)));
    }
}

struct Market {
    db: SqliteDatabase,
    producers: EventProducers,
    seller: i64,
    buyer: i64,
    product: i64,
}

impl Market {
    async fn new() -> Self {
        let db = prepare_test_env(&random_db_path()).await;
        let seller = seed_user(&db, "Sam Seller", BASIC_TIER).await;
        let buyer = seed_user(&db, "Bea Buyer", BUYER_TIER).await;
        let product = seed_product(&db, &seller, "Organic Chemistry", 4550).await;
        let producers = start_event_hooks(16, &db);
        Self { db, producers, seller: seller.id, buyer: buyer.id, product: product.id }
    }

    async fn send(&self, user_id: i64, req: TestRequest) -> (StatusCode, Value) {
        send_as(user_id, req, configure(self.db.clone(), self.producers.clone())).await
    }

    async fn post(&self, user_id: i64, path: &str) -> (StatusCode, Value) {
        self.send(user_id, TestRequest::post().uri(path)).await
    }

    async fn checkout(&self) -> (StatusCode, Value) {
        let body = json!({
            "product_id": self.product,
            "shipping_address": "12 Dorm Row, Room 4B",
            "payment": { "payment_method": "cash_on_delivery" }
        });
        self.send(self.buyer, TestRequest::post().uri("/orders").set_json(body)).await
    }

    /// Notifications are written by a hook running in its own task, so give it a moment to catch up.
    async fn wait_for_notifications(&self, user_id: i64, count: usize) -> usize {
        let mut found = 0;
        for _ in 0..50 {
            found = self.db.fetch_notifications(user_id, false).await.map(|n| n.len()).unwrap_or_default();
            if found >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        found
    }
}

#[actix_web::test]
async fn order_lifecycle() {
    let market = Market::new().await;
    let (status, order) = market.checkout().await;
    assert_eq!(status, StatusCode::CREATED, "was: {order}");
    assert_eq!(order["order_status"], "pending");
    assert_eq!(order["tracking_status"], "order_placed");
    assert_eq!(order["total_amount"], 4550);
    assert_eq!(order["payment"]["payment_status"], "pending");
    assert_eq!(order["payment"]["payment_method"], "cash_on_delivery");
    let id = order["id"].as_i64().unwrap();

    // Only the seller may accept, and nothing ships before it is accepted
    let (status, body) = market.post(market.buyer, &format!("/orders/{id}/accept")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "forbidden");
    let (status, body) = market.post(market.seller, &format!("/orders/{id}/ship")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "invalid_transition");
    assert_eq!(body["error"], format!("Cannot ship order #{id} while it is pending (order_placed)"));

    let (status, body) = market.post(market.seller, &format!("/orders/{id}/accept")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order_status"], "accepted");
    assert_eq!(body["tracking_status"], "preparing");
    assert!(body["accepted_at"].is_string());

    let (status, body) = market.post(market.seller, &format!("/orders/{id}/ship")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tracking_status"], "shipped");

    let (status, body) = market.post(market.seller, &format!("/orders/{id}/in-transit")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tracking_status"], "in_transit");

    let (status, body) = market.post(market.seller, &format!("/orders/{id}/complete")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("Only the buyer may complete"), "was: {body}");

    let (status, body) = market.post(market.buyer, &format!("/orders/{id}/complete")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order_status"], "completed");
    assert_eq!(body["tracking_status"], "delivered");
    assert_eq!(body["payment"]["payment_status"], "completed");
    assert!(body["payment"]["transaction_id"].is_string());
    assert_eq!(body["product"]["status"], "sold");
    assert_eq!(body["product"]["buyer_id"], market.buyer);

    // A completed order is final
    let (status, _) = market.post(market.seller, &format!("/orders/{id}/reject")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Seller hears about the order and its completion. Buyer hears about accept, ship and in-transit.
    assert_eq!(market.wait_for_notifications(market.seller, 2).await, 2);
    assert_eq!(market.wait_for_notifications(market.buyer, 3).await, 3);
    let (status, body) = market.send(market.buyer, TestRequest::get().uri("/notifications")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["notification_type"], "order_in_transit");
    assert_eq!(body[0]["order_id"], id);

    tear_down(market.db).await;
}

#[actix_web::test]
async fn rejected_orders_fail_the_payment() {
    let market = Market::new().await;
    let (_, order) = market.checkout().await;
    let id = order["id"].as_i64().unwrap();
    let (status, body) = market.post(market.seller, &format!("/orders/{id}/reject")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order_status"], "rejected");
    assert_eq!(body["payment"]["payment_status"], "failed");
    assert_eq!(body["product"]["status"], "selling");

    let (status, body) = market.post(market.seller, &format!("/orders/{id}/accept")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "invalid_transition");
    tear_down(market.db).await;
}

#[actix_web::test]
async fn checkout_rules() {
    let market = Market::new().await;
    let own_book = json!({
        "product_id": market.product,
        "shipping_address": "The seller's flat",
        "payment": { "payment_method": "cash_on_delivery" }
    });
    let (status, body) = market.send(market.seller, TestRequest::post().uri("/orders").set_json(own_book)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "You cannot buy your own product");

    let no_address = json!({
        "product_id": market.product,
        "shipping_address": "   ",
        "payment": { "payment_method": "cash_on_delivery" }
    });
    let (status, body) = market.send(market.buyer, TestRequest::post().uri("/orders").set_json(no_address)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"]["shipping_address"][0], "Shipping address is required");

    let missing = json!({
        "product_id": 9999,
        "shipping_address": "12 Dorm Row",
        "payment": { "payment_method": "cash_on_delivery" }
    });
    let (status, body) = market.send(market.buyer, TestRequest::post().uri("/orders").set_json(missing)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Product #9999 is not available for purchase");

    // Nothing was written by the failed attempts
    let (status, body) = market.send(market.buyer, TestRequest::get().uri("/orders")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    tear_down(market.db).await;
}

#[actix_web::test]
async fn listing_orders() {
    let market = Market::new().await;
    let (_, order) = market.checkout().await;
    let id = order["id"].as_i64().unwrap();

    let (status, body) = market.send(market.seller, TestRequest::get().uri("/orders?role=seller")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["buyer"]["id"], market.buyer);

    let (_, body) = market.send(market.seller, TestRequest::get().uri("/orders?role=buyer")).await;
    assert_eq!(body, json!([]));
    let (_, body) = market.send(market.buyer, TestRequest::get().uri("/orders?status=accepted,completed")).await;
    assert_eq!(body, json!([]));
    let (_, body) = market.send(market.buyer, TestRequest::get().uri("/orders?status=pending")).await;
    assert_eq!(body[0]["id"], id);

    let (status, body) = market.send(market.buyer, TestRequest::get().uri("/orders?status=lost")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"]["status"][0], "Unknown status: lost");

    let (status, body) = market.send(market.buyer, TestRequest::get().uri(&format!("/orders/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["seller"]["id"], market.seller);

    // Strangers get nothing, not even the order's state
    let (status, body) = market.send(4242, TestRequest::get().uri(&format!("/orders/{id}"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], format!("Forbidden. You are not a party to order #{id}"));
    tear_down(market.db).await;
}
