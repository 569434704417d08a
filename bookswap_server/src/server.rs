use std::{path::Path, time::Duration};

use actix_web::{
    dev::Server,
    error::{JsonPayloadError, PathError, QueryPayloadError},
    http::KeepAlive,
    middleware::Logger,
    web,
    web::ServiceConfig,
    App,
    HttpRequest,
    HttpServer,
};
use bookswap_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    notifier::{logging_hook, notification_hook},
    AccountApi,
    CardApi,
    ItemListApi,
    ListingApi,
    NotificationApi,
    OrderFlowApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    auth::TokenValidator,
    config::ServerConfig,
    errors::ServerError,
    routes::{
        health,
        AcceptOrderRoute,
        AddCardRoute,
        AddToCartRoute,
        AddToWishlistRoute,
        CartCountRoute,
        ClearCartRoute,
        ClearWishlistRoute,
        CompleteOrderRoute,
        CreateOrderRoute,
        CreateProductRoute,
        DeleteCardRoute,
        DeleteNotificationRoute,
        DeleteProductRoute,
        ListingQuotaRoute,
        MarkAllNotificationsReadRoute,
        MarkNotificationReadRoute,
        MyAccountRoute,
        MyCardsRoute,
        MyCartRoute,
        MyNotificationsRoute,
        MyOrdersRoute,
        MyWishlistRoute,
        OrderByIdRoute,
        OrderInTransitRoute,
        ProductByIdRoute,
        RejectOrderRoute,
        RemoveFromCartRoute,
        RemoveFromWishlistRoute,
        SearchProductsRoute,
        SetDefaultCardRoute,
        ShipOrderRoute,
        TiersRoute,
        UnreadCountRoute,
        UpdateProductRoute,
        WishlistCountRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = connect_database(&config).await?;
    let producers = start_event_hooks(config.event_buffer_size, &db);
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Opens the connection pool and, if configured to, brings the schema up to date.
pub async fn connect_database(config: &ServerConfig) -> Result<SqliteDatabase, ServerError> {
    create_database_dir(&config.database_url)?;
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_db_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    } else {
        info!("🗃️ BSW_RUN_MIGRATIONS is off. Assuming the database schema is up to date.");
    }
    Ok(db)
}

/// SQLite creates a missing database file, but not the directory it lives in.
fn create_database_dir(url: &str) -> Result<(), ServerError> {
    let path = url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }
    match Path::new(path).parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
            info!("🗃️ Creating database directory {}", dir.display());
            std::fs::create_dir_all(dir)?;
            Ok(())
        },
        _ => Ok(()),
    }
}

/// Registers the standard order event hooks: the notification inbox and the log. Each hook runs in its own task, so a
/// slow or failing hook never holds up an order operation.
pub fn start_event_hooks(buffer_size: usize, db: &SqliteDatabase) -> EventProducers {
    let mut hooks = EventHooks::default();
    hooks.add_order_event_handler(notification_hook(db.clone())).add_order_event_handler(logging_hook());
    let handlers = EventHandlers::new(buffer_size, hooks);
    let producers = handlers.producers();
    handlers.start_handlers();
    producers
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let auth = config.auth.clone();
    let srv = HttpServer::new(move || {
        let accounts_api = AccountApi::new(db.clone());
        let listing_api = ListingApi::new(db.clone());
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        let item_list_api = ItemListApi::new(db.clone());
        let card_api = CardApi::new(db.clone());
        let notification_api = NotificationApi::new(db.clone());
        let validator = TokenValidator::new(&auth);
        let api_scope = web::scope("/api")
            .service(TiersRoute::<SqliteDatabase>::new())
            .service(MyAccountRoute::<SqliteDatabase>::new())
            .service(ListingQuotaRoute::<SqliteDatabase>::new())
            .service(SearchProductsRoute::<SqliteDatabase>::new())
            .service(ProductByIdRoute::<SqliteDatabase>::new())
            .service(CreateProductRoute::<SqliteDatabase>::new())
            .service(UpdateProductRoute::<SqliteDatabase>::new())
            .service(DeleteProductRoute::<SqliteDatabase>::new())
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(AcceptOrderRoute::<SqliteDatabase>::new())
            .service(RejectOrderRoute::<SqliteDatabase>::new())
            .service(ShipOrderRoute::<SqliteDatabase>::new())
            .service(OrderInTransitRoute::<SqliteDatabase>::new())
            .service(CompleteOrderRoute::<SqliteDatabase>::new())
            .service(AddToCartRoute::<SqliteDatabase>::new())
            .service(RemoveFromCartRoute::<SqliteDatabase>::new())
            .service(ClearCartRoute::<SqliteDatabase>::new())
            .service(CartCountRoute::<SqliteDatabase>::new())
            .service(MyCartRoute::<SqliteDatabase>::new())
            .service(AddToWishlistRoute::<SqliteDatabase>::new())
            .service(RemoveFromWishlistRoute::<SqliteDatabase>::new())
            .service(ClearWishlistRoute::<SqliteDatabase>::new())
            .service(WishlistCountRoute::<SqliteDatabase>::new())
            .service(MyWishlistRoute::<SqliteDatabase>::new())
            .service(MyCardsRoute::<SqliteDatabase>::new())
            .service(AddCardRoute::<SqliteDatabase>::new())
            .service(DeleteCardRoute::<SqliteDatabase>::new())
            .service(SetDefaultCardRoute::<SqliteDatabase>::new())
            .service(MyNotificationsRoute::<SqliteDatabase>::new())
            .service(UnreadCountRoute::<SqliteDatabase>::new())
            .service(MarkAllNotificationsReadRoute::<SqliteDatabase>::new())
            .service(MarkNotificationReadRoute::<SqliteDatabase>::new())
            .service(DeleteNotificationRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("bookswap::access_log"))
            .configure(configure_extractors)
            .app_data(web::Data::new(accounts_api))
            .app_data(web::Data::new(listing_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(item_list_api))
            .app_data(web::Data::new(card_api))
            .app_data(web::Data::new(notification_api))
            .app_data(web::Data::new(validator))
            .service(health)
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Makes the body, query and path extractors fail with the same JSON error body as the handlers do.
///
/// A body that is not JSON at all is a bad request (400). A JSON body that does not fit the expected shape, e.g. an
/// unknown or missing field, fails validation (422).
pub fn configure_extractors(cfg: &mut ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .app_data(web::PathConfig::default().error_handler(path_error));
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let err = match err {
        JsonPayloadError::Deserialize(e) if e.is_data() => ServerError::validation("body", e.to_string()),
        e => ServerError::InvalidRequestBody(e.to_string()),
    };
    debug!("💻️ {err}");
    err.into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ServerError::validation("query", err.to_string()).into()
}

fn path_error(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    ServerError::InvalidRequestPath(err.to_string()).into()
}
