use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use bookswap_engine::{
    db_types::{ListKind, ProductStatus},
    ItemListApi,
};
use serde_json::json;

use super::{
    helpers::send_as,
    mocks::{list_item, product, MockItemLists},
};
use crate::routes::{
    AddToCartRoute,
    AddToWishlistRoute,
    CartCountRoute,
    ClearCartRoute,
    ClearWishlistRoute,
    MyCartRoute,
    MyWishlistRoute,
    RemoveFromCartRoute,
    RemoveFromWishlistRoute,
    WishlistCountRoute,
};

fn configure(db: MockItemLists) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(AddToCartRoute::<MockItemLists>::new())
            .service(RemoveFromCartRoute::<MockItemLists>::new())
            .service(ClearCartRoute::<MockItemLists>::new())
            .service(CartCountRoute::<MockItemLists>::new())
            .service(MyCartRoute::<MockItemLists>::new())
            .service(AddToWishlistRoute::<MockItemLists>::new())
            .service(RemoveFromWishlistRoute::<MockItemLists>::new())
            .service(ClearWishlistRoute::<MockItemLists>::new())
            .service(WishlistCountRoute::<MockItemLists>::new())
            .service(MyWishlistRoute::<MockItemLists>::new())
            .app_data(web::Data::new(ItemListApi::new(db)));
    }
}

fn add_product(path: &str, product_id: i64) -> TestRequest {
    TestRequest::post().uri(path).set_json(json!({ "product_id": product_id }))
}

#[actix_web::test]
async fn add_to_cart() {
    let _ = env_logger::try_init();
    let mut db = MockItemLists::new();
    db.expect_fetch_product().returning(|id| Ok(Some(product(id, 3))));
    db.expect_fetch_item().returning(|_, _, _| Ok(None));
    db.expect_insert_item()
        .withf(|kind, user_id, product_id| *kind == ListKind::Cart && *user_id == 8 && *product_id == 5)
        .times(1)
        .returning(|_, user_id, product_id| Ok(list_item(1, user_id, product_id)));
    let (status, body) = send_as(8, add_product("/carts/add-product", 5), configure(db)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["product_id"], 5);
    assert_eq!(body["quantity"], 1);
}

#[actix_web::test]
async fn add_to_cart_twice() {
    let _ = env_logger::try_init();
    let mut db = MockItemLists::new();
    db.expect_fetch_product().returning(|id| Ok(Some(product(id, 3))));
    db.expect_fetch_item().returning(|_, user_id, product_id| Ok(Some(list_item(1, user_id, product_id))));
    db.expect_insert_item().never();
    let (status, body) = send_as(8, add_product("/carts/add-product", 5), configure(db)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "conflict");
    assert_eq!(body["error"], "Product #5 is already in your cart");
}

#[actix_web::test]
async fn add_own_book_to_wishlist() {
    let _ = env_logger::try_init();
    let mut db = MockItemLists::new();
    db.expect_fetch_product().returning(|id| Ok(Some(product(id, 8))));
    let (status, body) = send_as(8, add_product("/wishlist/add-product", 5), configure(db)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "You cannot add your own product to your wishlist");
}

#[actix_web::test]
async fn add_sold_book_to_wishlist() {
    let _ = env_logger::try_init();
    let mut db = MockItemLists::new();
    db.expect_fetch_product().returning(|id| {
        let mut sold = product(id, 3);
        sold.status = ProductStatus::Sold;
        Ok(Some(sold))
    });
    let (status, body) = send_as(8, add_product("/wishlist/add-product", 5), configure(db)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Product #5 is not available for purchase");
}

#[actix_web::test]
async fn add_nothing() {
    let _ = env_logger::try_init();
    let (status, body) = send_as(8, add_product("/carts/add-product", 0), configure(MockItemLists::new())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"]["product_id"][0], "Must be a product id");
    let req = TestRequest::post().uri("/wishlist/add-product").set_json(json!({}));
    let (status, body) = send_as(8, req, configure(MockItemLists::new())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["body"][0].as_str().unwrap().contains("product_id"), "was: {body}");
}

#[actix_web::test]
async fn remove_from_cart() {
    let _ = env_logger::try_init();
    let mut db = MockItemLists::new();
    db.expect_remove_item().returning(|_, _, product_id| Ok(product_id == 5));
    let req = TestRequest::delete().uri("/carts/remove-product/5");
    let (status, body) = send_as(8, req, configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let mut db = MockItemLists::new();
    db.expect_remove_item().returning(|_, _, product_id| Ok(product_id == 5));
    let req = TestRequest::delete().uri("/wishlist/remove-product/6");
    let (status, body) = send_as(8, req, configure(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Product #6 is not in your wishlist");
}

#[actix_web::test]
async fn counts_and_clearing() {
    let _ = env_logger::try_init();
    let mut db = MockItemLists::new();
    db.expect_count_items().withf(|kind, _| *kind == ListKind::Wishlist).returning(|_, _| Ok(3));
    let (status, body) = send_as(8, TestRequest::get().uri("/wishlist/count"), configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "count": 3 }));

    let mut db = MockItemLists::new();
    db.expect_clear_items().withf(|kind, user_id| *kind == ListKind::Cart && *user_id == 8).returning(|_, _| Ok(2));
    let (status, body) = send_as(8, TestRequest::delete().uri("/carts/clear"), configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "updated": 2 }));
}

#[actix_web::test]
async fn my_cart_skips_missing_products() {
    let _ = env_logger::try_init();
    let mut db = MockItemLists::new();
    db.expect_fetch_items().returning(|_, user_id| Ok(vec![list_item(1, user_id, 5), list_item(2, user_id, 6)]));
    db.expect_fetch_product().returning(|id| Ok((id == 5).then(|| product(id, 3))));
    let (status, body) = send_as(8, TestRequest::get().uri("/carts"), configure(db)).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["item_id"], 1);
    assert_eq!(entries[0]["product"]["id"], 5);
}
