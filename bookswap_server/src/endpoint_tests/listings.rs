use actix_web::{
    http::{header::ContentType, StatusCode},
    test::TestRequest,
    web,
    web::ServiceConfig,
};
use bookswap_engine::{db_types::Money, traits::MarketplaceError, ListingApi};
use serde_json::json;

use super::{
    helpers::send_as,
    mocks::{product, tier, user, MockListings},
};
use crate::routes::{
    CreateProductRoute,
    DeleteProductRoute,
    ListingQuotaRoute,
    ProductByIdRoute,
    SearchProductsRoute,
    UpdateProductRoute,
};

fn configure(db: MockListings) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(ListingQuotaRoute::<MockListings>::new())
            .service(SearchProductsRoute::<MockListings>::new())
            .service(ProductByIdRoute::<MockListings>::new())
            .service(CreateProductRoute::<MockListings>::new())
            .service(UpdateProductRoute::<MockListings>::new())
            .service(DeleteProductRoute::<MockListings>::new())
            .app_data(web::Data::new(ListingApi::new(db)));
    }
}

/// A seller on the Basic tier, which allows five listings.
fn basic_seller(db: &mut MockListings, seller_id: i64) {
    db.expect_fetch_user().withf(move |id| *id == seller_id).returning(|id| Ok(Some(user(id, 2))));
    db.expect_fetch_tier().withf(|id| *id == 2).returning(|id| Ok(Some(tier(id, "Basic", 5))));
}

fn new_book() -> serde_json::Value {
    json!({
        "name": "Linear Algebra Done Right",
        "author": "Sheldon Axler",
        "price": 3500,
        "year_of_publication": 2015
    })
}

#[actix_web::test]
async fn listing_quota() {
    let _ = env_logger::try_init();
    let mut db = MockListings::new();
    basic_seller(&mut db, 7);
    db.expect_count_active_listings().withf(|id| *id == 7).returning(|_| Ok(3));
    let (status, body) = send_as(7, TestRequest::get().uri("/listings/quota"), configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_listings"], 3);
    assert_eq!(body["max_listings"], 5);
    assert_eq!(body["can_create"], true);
    assert_eq!(body["tier"]["name"], "Basic");
}

#[actix_web::test]
async fn create_listing() {
    let _ = env_logger::try_init();
    let mut db = MockListings::new();
    basic_seller(&mut db, 7);
    db.expect_insert_product_within_quota()
        .withf(|seller_id, p, tier| *seller_id == 7 && p.price == Money::from_cents(3500) && tier.max_listings == 5)
        .returning(|seller_id, p, _| {
            let mut listed = product(21, seller_id);
            listed.name = p.name;
            listed.author = p.author;
            listed.price = p.price;
            Ok(listed)
        });
    let req = TestRequest::post().uri("/products").set_json(new_book());
    let (status, body) = send_as(7, req, configure(db)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 21);
    assert_eq!(body["seller_id"], 7);
    assert_eq!(body["price"], 3500);
    assert_eq!(body["status"], "selling");
}

#[actix_web::test]
async fn create_listing_over_quota() {
    let _ = env_logger::try_init();
    let mut db = MockListings::new();
    basic_seller(&mut db, 7);
    db.expect_insert_product_within_quota()
        .returning(|_, _, tier| {
            Err(MarketplaceError::ListingQuotaExceeded { current_listings: 5, max_listings: tier.max_listings })
        });
    let req = TestRequest::post().uri("/products").set_json(new_book());
    let (status, body) = send_as(7, req, configure(db)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "validation");
    assert_eq!(body["current_listings"], 5);
    assert_eq!(body["max_listings"], 5);
    assert!(body["error"].as_str().unwrap().contains("Upgrade your tier"), "was: {body}");
}

#[actix_web::test]
async fn buyers_cannot_list() {
    let _ = env_logger::try_init();
    let mut db = MockListings::new();
    db.expect_fetch_user().returning(|id| Ok(Some(user(id, 1))));
    db.expect_fetch_tier().returning(|id| Ok(Some(tier(id, "Buyer", 0))));
    db.expect_insert_product_within_quota()
        .returning(|_, _, _| Err(MarketplaceError::ListingQuotaExceeded { current_listings: 0, max_listings: 0 }));
    let req = TestRequest::post().uri("/products").set_json(new_book());
    let (status, body) = send_as(8, req, configure(db)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["max_listings"], 0);
}

#[actix_web::test]
async fn create_listing_without_a_price() {
    let _ = env_logger::try_init();
    let book = json!({ "name": "Topology", "author": "James Munkres", "price": 0 });
    let req = TestRequest::post().uri("/products").set_json(book);
    let (status, body) = send_as(7, req, configure(MockListings::new())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"]["price"][0], "Price must be greater than zero");
}

#[actix_web::test]
async fn create_listing_with_unknown_fields() {
    let _ = env_logger::try_init();
    let mut book = new_book();
    book["seller_id"] = json!(1);
    let req = TestRequest::post().uri("/products").set_json(book);
    let (status, body) = send_as(7, req, configure(MockListings::new())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["body"][0].as_str().unwrap().contains("seller_id"), "was: {body}");
}

#[actix_web::test]
async fn create_listing_with_broken_json() {
    let _ = env_logger::try_init();
    let req = TestRequest::post().uri("/products").insert_header(ContentType::json()).set_payload("{name: Topology");
    let (status, body) = send_as(7, req, configure(MockListings::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "bad_request");
}

#[actix_web::test]
async fn update_someone_elses_listing() {
    let _ = env_logger::try_init();
    let mut db = MockListings::new();
    db.expect_fetch_product().returning(|id| Ok(Some(product(id, 99))));
    let req = TestRequest::patch().uri("/products/4").set_json(json!({ "price": 1000 }));
    let (status, body) = send_as(7, req, configure(db)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "forbidden");
}

#[actix_web::test]
async fn update_listing() {
    let _ = env_logger::try_init();
    let mut db = MockListings::new();
    db.expect_fetch_product().returning(|id| Ok(Some(product(id, 7))));
    db.expect_update_product()
        .withf(|id, update| *id == 4 && update.price == Some(Money::from_cents(1000)) && update.name.is_none())
        .returning(|id, update| {
            let mut p = product(id, 7);
            p.price = update.price.unwrap_or(p.price);
            Ok(p)
        });
    let req = TestRequest::patch().uri("/products/4").set_json(json!({ "price": 1000 }));
    let (status, body) = send_as(7, req, configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"], 1000);
}

#[actix_web::test]
async fn update_cannot_touch_the_status() {
    let _ = env_logger::try_init();
    let req = TestRequest::patch().uri("/products/4").set_json(json!({ "status": "sold", "buyer_id": 8 }));
    let (status, body) = send_as(7, req, configure(MockListings::new())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "validation");
}

#[actix_web::test]
async fn delete_listing_in_use() {
    let _ = env_logger::try_init();
    let mut db = MockListings::new();
    db.expect_fetch_product().returning(|id| Ok(Some(product(id, 7))));
    db.expect_delete_product().returning(|id| Err(MarketplaceError::ProductInUse(id)));
    let (status, body) = send_as(7, TestRequest::delete().uri("/products/4"), configure(db)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Product #4 is referenced by an order and cannot be deleted");
}

#[actix_web::test]
async fn product_by_id() {
    let _ = env_logger::try_init();
    let mut db = MockListings::new();
    db.expect_fetch_product().returning(|id| Ok((id == 4).then(|| product(id, 7))));
    let (status, body) = send_as(8, TestRequest::get().uri("/products/4"), configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["author"], "Walter Rudin");

    let mut db = MockListings::new();
    db.expect_fetch_product().returning(|_| Ok(None));
    let (status, body) = send_as(8, TestRequest::get().uri("/products/5"), configure(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");

    let (status, _) = send_as(8, TestRequest::get().uri("/products/rudin"), configure(MockListings::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn search_products() {
    let _ = env_logger::try_init();
    let mut db = MockListings::new();
    db.expect_search_products()
        .withf(|q| {
            q.search.as_deref() == Some("analysis") &&
                q.max_price == Some(Money::from_cents(5000)) &&
                q.limit == Some(10)
        })
        .returning(|_| Ok(vec![product(4, 7), product(5, 9)]));
    let req = TestRequest::get().uri("/products?search=analysis&max_price=5000&limit=10");
    let (status, body) = send_as(8, req, configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn search_products_with_bad_paging() {
    let _ = env_logger::try_init();
    let req = TestRequest::get().uri("/products?limit=500&min_price=900&max_price=100");
    let (status, body) = send_as(8, req, configure(MockListings::new())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"]["limit"][0], "Must be between 1 and 100");
    assert_eq!(body["fields"]["max_price"][0], "Must not be less than min_price");

    let req = TestRequest::get().uri("/products?colour=red");
    let (status, body) = send_as(8, req, configure(MockListings::new())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["query"][0].as_str().unwrap().contains("colour"), "was: {body}");
}
