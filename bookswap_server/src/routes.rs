//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate function or the engine. Keep this module neat and
//! tidy 🙏
//!
//! Every route under `/api` requires a bearer token. Handlers take an [`AuthenticatedUser`] argument, which does the
//! checking, and act on behalf of that user only. There is no way to act on another user's cart, cards or inbox.
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. For this reason, any long, non-cpu-bound operation (e.g. I/O,
//! database operations, etc.) should be expressed as futures or asynchronous functions. Async handlers get executed
//! concurrently by worker threads and thus don’t block execution.
use actix_web::{get, web, HttpResponse, Responder};
use bookswap_engine::{
    db_types::{ListKind, NewProduct, ProductUpdate},
    helpers::CardDetails,
    listing_objects::ProductQueryFilter,
    order_lifecycle::OrderAction,
    order_objects::NewOrderRequest,
    traits::{
        AccountManagement,
        CardManagement,
        ItemListManagement,
        ListingManagement,
        MarketplaceDatabase,
        NotificationManagement,
    },
    AccountApi,
    CardApi,
    ItemListApi,
    ListingApi,
    NotificationApi,
    OrderFlowApi,
};
use log::*;

use crate::{
    auth::AuthenticatedUser,
    data_objects::{
        validate_product_filter,
        CountResponse,
        JsonResponse,
        ListItemRequest,
        NotificationParams,
        OrderListParams,
        UpdatedResponse,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro.
// `route!(name => Method "/path" impl Trait1, Trait2)` registers the handler `name::<B>` where `B` implements all the
// listed backend traits.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:path),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<B>(core::marker::PhantomData<fn() -> B>);}
        paste::paste! { impl<B> [<$name:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> B>)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B>
        where
            B: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Accounts  ----------------------------------------------------
route!(tiers => Get "/tiers" impl AccountManagement);
pub async fn tiers<B: AccountManagement>(
    _user: AuthenticatedUser,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let tiers = api.tiers().await?;
    Ok(HttpResponse::Ok().json(tiers))
}

route!(my_account => Get "/account" impl AccountManagement);
/// The signed-in user's profile, including their tier and its listing allowance.
pub async fn my_account<B: AccountManagement>(
    user: AuthenticatedUser,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET account for user #{}", user.id);
    let profile = api.profile(user.id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

//----------------------------------------------   Listings  ----------------------------------------------------
route!(listing_quota => Get "/listings/quota" impl AccountManagement, ListingManagement);
/// Reports how many active listings the user has, how many their tier allows, and whether they can list another book.
pub async fn listing_quota<B>(
    user: AuthenticatedUser,
    api: web::Data<ListingApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: AccountManagement + ListingManagement,
{
    let quota = api.listing_quota(user.id).await?;
    Ok(HttpResponse::Ok().json(quota))
}

route!(search_products => Get "/products" impl AccountManagement, ListingManagement);
/// Browse and search the catalogue. See [`ProductQueryFilter`] for the query parameters. Only books that are still for
/// sale are returned unless `status` says otherwise.
pub async fn search_products<B>(
    _user: AuthenticatedUser,
    query: web::Query<ProductQueryFilter>,
    api: web::Data<ListingApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: AccountManagement + ListingManagement,
{
    let query = query.into_inner();
    validate_product_filter(&query)?;
    debug!("💻️ GET products. {query}");
    let products = api.search(query).await?;
    Ok(HttpResponse::Ok().json(products))
}

route!(product_by_id => Get "/products/{id}" impl AccountManagement, ListingManagement);
pub async fn product_by_id<B>(
    _user: AuthenticatedUser,
    path: web::Path<i64>,
    api: web::Data<ListingApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: AccountManagement + ListingManagement,
{
    let product = api.product(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(create_product => Post "/products" impl AccountManagement, ListingManagement);
/// Lists a book for sale. The seller's tier limits how many of their books may be for sale at once. When the limit is
/// reached the response is a 422 that includes `current_listings` and `max_listings`.
pub async fn create_product<B>(
    user: AuthenticatedUser,
    body: web::Json<NewProduct>,
    api: web::Data<ListingApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: AccountManagement + ListingManagement,
{
    debug!("💻️ POST product for user #{}", user.id);
    let product = api.create_listing(user.id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(product))
}

route!(update_product => Patch "/products/{id}" impl AccountManagement, ListingManagement);
/// Changes a listing. Only the fields in [`ProductUpdate`] may be sent. Anything else fails the request.
pub async fn update_product<B>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    body: web::Json<ProductUpdate>,
    api: web::Data<ListingApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: AccountManagement + ListingManagement,
{
    let product_id = path.into_inner();
    debug!("💻️ PATCH product #{product_id} for user #{}", user.id);
    let product = api.update_listing(user.id, product_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(delete_product => Delete "/products/{id}" impl AccountManagement, ListingManagement);
pub async fn delete_product<B>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    api: web::Data<ListingApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: AccountManagement + ListingManagement,
{
    let product_id = path.into_inner();
    debug!("💻️ DELETE product #{product_id} for user #{}", user.id);
    api.delete_listing(user.id, product_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Product #{product_id} deleted."))))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl MarketplaceDatabase);
/// Checkout. The signed-in user buys one book. The order and its payment record are created together or not at all.
pub async fn create_order<B: MarketplaceDatabase>(
    user: AuthenticatedUser,
    body: web::Json<NewOrderRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    debug!("💻️ POST order for product #{} by user #{}", request.product_id, user.id);
    let order = api.create_order(user.id, request).await?;
    Ok(HttpResponse::Created().json(order))
}

route!(my_orders => Get "/orders" impl MarketplaceDatabase);
/// The orders the user is a party to, newest first. Filter with `?role=buyer|seller` and `?status=pending,accepted`.
pub async fn my_orders<B: MarketplaceDatabase>(
    user: AuthenticatedUser,
    query: web::Query<OrderListParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let statuses = query.statuses()?;
    debug!("💻️ GET orders for user #{}", user.id);
    let orders = api.orders_for_user(user.id, query.role, &statuses).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{id}" impl MarketplaceDatabase);
pub async fn order_by_id<B: MarketplaceDatabase>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order = api.order_for_user(user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(accept_order => Post "/orders/{id}/accept" impl MarketplaceDatabase);
pub async fn accept_order<B: MarketplaceDatabase>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    move_order(user, path.into_inner(), OrderAction::Accept, api.as_ref()).await
}

route!(reject_order => Post "/orders/{id}/reject" impl MarketplaceDatabase);
pub async fn reject_order<B: MarketplaceDatabase>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    move_order(user, path.into_inner(), OrderAction::Reject, api.as_ref()).await
}

route!(ship_order => Post "/orders/{id}/ship" impl MarketplaceDatabase);
pub async fn ship_order<B: MarketplaceDatabase>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    move_order(user, path.into_inner(), OrderAction::Ship, api.as_ref()).await
}

route!(order_in_transit => Post "/orders/{id}/in-transit" impl MarketplaceDatabase);
pub async fn order_in_transit<B: MarketplaceDatabase>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    move_order(user, path.into_inner(), OrderAction::MarkInTransit, api.as_ref()).await
}

route!(complete_order => Post "/orders/{id}/complete" impl MarketplaceDatabase);
pub async fn complete_order<B: MarketplaceDatabase>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    move_order(user, path.into_inner(), OrderAction::Complete, api.as_ref()).await
}

async fn move_order<B: MarketplaceDatabase>(
    user: AuthenticatedUser,
    order_id: i64,
    action: OrderAction,
    api: &OrderFlowApi<B>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST {action} order #{order_id} by user #{}", user.id);
    let order = match action {
        OrderAction::Accept => api.accept_order(user.id, order_id).await,
        OrderAction::Reject => api.reject_order(user.id, order_id).await,
        OrderAction::Ship => api.ship_order(user.id, order_id).await,
        OrderAction::MarkInTransit => api.mark_in_transit(user.id, order_id).await,
        OrderAction::Complete => api.complete_order(user.id, order_id).await,
    }?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Cart  ----------------------------------------------------
route!(add_to_cart => Post "/carts/add-product" impl ItemListManagement, ListingManagement);
pub async fn add_to_cart<B>(
    user: AuthenticatedUser,
    body: web::Json<ListItemRequest>,
    api: web::Data<ItemListApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: ItemListManagement + ListingManagement,
{
    add_list_item(ListKind::Cart, user, body.into_inner(), api.as_ref()).await
}

route!(remove_from_cart => Delete "/carts/remove-product/{product_id}" impl ItemListManagement, ListingManagement);
pub async fn remove_from_cart<B>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    api: web::Data<ItemListApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: ItemListManagement + ListingManagement,
{
    remove_list_item(ListKind::Cart, user, path.into_inner(), api.as_ref()).await
}

route!(clear_cart => Delete "/carts/clear" impl ItemListManagement, ListingManagement);
pub async fn clear_cart<B>(user: AuthenticatedUser, api: web::Data<ItemListApi<B>>) -> Result<HttpResponse, ServerError>
where B: ItemListManagement + ListingManagement {
    clear_list(ListKind::Cart, user, api.as_ref()).await
}

route!(cart_count => Get "/carts/count" impl ItemListManagement, ListingManagement);
pub async fn cart_count<B>(user: AuthenticatedUser, api: web::Data<ItemListApi<B>>) -> Result<HttpResponse, ServerError>
where B: ItemListManagement + ListingManagement {
    count_list(ListKind::Cart, user, api.as_ref()).await
}

route!(my_cart => Get "/carts" impl ItemListManagement, ListingManagement);
pub async fn my_cart<B>(user: AuthenticatedUser, api: web::Data<ItemListApi<B>>) -> Result<HttpResponse, ServerError>
where B: ItemListManagement + ListingManagement {
    list_items(ListKind::Cart, user, api.as_ref()).await
}

//----------------------------------------------   Wishlist  ----------------------------------------------------
route!(add_to_wishlist => Post "/wishlist/add-product" impl ItemListManagement, ListingManagement);
pub async fn add_to_wishlist<B>(
    user: AuthenticatedUser,
    body: web::Json<ListItemRequest>,
    api: web::Data<ItemListApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: ItemListManagement + ListingManagement,
{
    add_list_item(ListKind::Wishlist, user, body.into_inner(), api.as_ref()).await
}

route!(
    remove_from_wishlist => Delete "/wishlist/remove-product/{product_id}" impl ItemListManagement, ListingManagement
);
pub async fn remove_from_wishlist<B>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    api: web::Data<ItemListApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: ItemListManagement + ListingManagement,
{
    remove_list_item(ListKind::Wishlist, user, path.into_inner(), api.as_ref()).await
}

route!(clear_wishlist => Delete "/wishlist/clear" impl ItemListManagement, ListingManagement);
pub async fn clear_wishlist<B>(
    user: AuthenticatedUser,
    api: web::Data<ItemListApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: ItemListManagement + ListingManagement,
{
    clear_list(ListKind::Wishlist, user, api.as_ref()).await
}

route!(wishlist_count => Get "/wishlist/count" impl ItemListManagement, ListingManagement);
pub async fn wishlist_count<B>(
    user: AuthenticatedUser,
    api: web::Data<ItemListApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: ItemListManagement + ListingManagement,
{
    count_list(ListKind::Wishlist, user, api.as_ref()).await
}

route!(my_wishlist => Get "/wishlist" impl ItemListManagement, ListingManagement);
pub async fn my_wishlist<B>(
    user: AuthenticatedUser,
    api: web::Data<ItemListApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: ItemListManagement + ListingManagement,
{
    list_items(ListKind::Wishlist, user, api.as_ref()).await
}

async fn add_list_item<B>(
    kind: ListKind,
    user: AuthenticatedUser,
    request: ListItemRequest,
    api: &ItemListApi<B>,
) -> Result<HttpResponse, ServerError>
where
    B: ItemListManagement + ListingManagement,
{
    request.validate()?;
    debug!("💻️ Adding product #{} to the {kind} of user #{}", request.product_id, user.id);
    let item = api.add_item(kind, user.id, request.product_id).await?;
    Ok(HttpResponse::Created().json(item))
}

async fn remove_list_item<B>(
    kind: ListKind,
    user: AuthenticatedUser,
    product_id: i64,
    api: &ItemListApi<B>,
) -> Result<HttpResponse, ServerError>
where
    B: ItemListManagement + ListingManagement,
{
    debug!("💻️ Removing product #{product_id} from the {kind} of user #{}", user.id);
    api.remove_item(kind, user.id, product_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Product #{product_id} removed from your {kind}."))))
}

async fn clear_list<B>(
    kind: ListKind,
    user: AuthenticatedUser,
    api: &ItemListApi<B>,
) -> Result<HttpResponse, ServerError>
where
    B: ItemListManagement + ListingManagement,
{
    let updated = api.clear(kind, user.id).await?;
    Ok(HttpResponse::Ok().json(UpdatedResponse { updated }))
}

async fn count_list<B>(
    kind: ListKind,
    user: AuthenticatedUser,
    api: &ItemListApi<B>,
) -> Result<HttpResponse, ServerError>
where
    B: ItemListManagement + ListingManagement,
{
    let count = api.count(kind, user.id).await?;
    Ok(HttpResponse::Ok().json(CountResponse { count }))
}

async fn list_items<B>(
    kind: ListKind,
    user: AuthenticatedUser,
    api: &ItemListApi<B>,
) -> Result<HttpResponse, ServerError>
where
    B: ItemListManagement + ListingManagement,
{
    let items = api.items(kind, user.id).await?;
    Ok(HttpResponse::Ok().json(items))
}

//----------------------------------------------   Cards  ----------------------------------------------------
route!(my_cards => Get "/cards" impl CardManagement);
/// The user's saved cards, default card first. Only the card type, last four digits and expiry are ever returned.
pub async fn my_cards<B: CardManagement>(
    user: AuthenticatedUser,
    api: web::Data<CardApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let cards = api.cards(user.id).await?;
    Ok(HttpResponse::Ok().json(cards))
}

route!(add_card => Post "/cards" impl CardManagement);
pub async fn add_card<B: CardManagement>(
    user: AuthenticatedUser,
    body: web::Json<CardDetails>,
    api: web::Data<CardApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST card for user #{}", user.id);
    let card = api.add_card(user.id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(card))
}

route!(delete_card => Delete "/cards/{id}" impl CardManagement);
pub async fn delete_card<B: CardManagement>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    api: web::Data<CardApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let card_id = path.into_inner();
    debug!("💻️ DELETE card #{card_id} for user #{}", user.id);
    api.delete_card(user.id, card_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Card #{card_id} deleted."))))
}

route!(set_default_card => Post "/cards/{id}/default" impl CardManagement);
pub async fn set_default_card<B: CardManagement>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    api: web::Data<CardApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let card = api.set_default(user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(card))
}

//----------------------------------------------   Notifications  ----------------------------------------------------
route!(my_notifications => Get "/notifications" impl NotificationManagement);
/// The user's inbox, newest first. Pass `?unread_only=true` to skip notifications that have been read.
pub async fn my_notifications<B: NotificationManagement>(
    user: AuthenticatedUser,
    query: web::Query<NotificationParams>,
    api: web::Data<NotificationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let notifications = api.notifications(user.id, query.unread_only).await?;
    Ok(HttpResponse::Ok().json(notifications))
}

route!(unread_count => Get "/notifications/unread-count" impl NotificationManagement);
pub async fn unread_count<B: NotificationManagement>(
    user: AuthenticatedUser,
    api: web::Data<NotificationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let count = api.unread_count(user.id).await?;
    Ok(HttpResponse::Ok().json(CountResponse { count }))
}

route!(mark_notification_read => Post "/notifications/{id}/read" impl NotificationManagement);
pub async fn mark_notification_read<B: NotificationManagement>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    api: web::Data<NotificationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let notification = api.mark_read(user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(notification))
}

route!(mark_all_notifications_read => Post "/notifications/read-all" impl NotificationManagement);
pub async fn mark_all_notifications_read<B: NotificationManagement>(
    user: AuthenticatedUser,
    api: web::Data<NotificationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let updated = api.mark_all_read(user.id).await?;
    Ok(HttpResponse::Ok().json(UpdatedResponse { updated }))
}

route!(delete_notification => Delete "/notifications/{id}" impl NotificationManagement);
pub async fn delete_notification<B: NotificationManagement>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    api: web::Data<NotificationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let notification_id = path.into_inner();
    api.delete(user.id, notification_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Notification #{notification_id} deleted."))))
}
