use std::time::Duration;

use bookswap_engine::{
    db_types::{NewProduct, NewUser, Product, User},
    events::{EventHandlers, EventHooks},
    notifier::{logging_hook, notification_hook},
    AccountManagement,
    CardApi,
    ItemListApi,
    ListingApi,
    MarketplaceDatabase,
    NotificationApi,
    NotificationManagement,
    OrderFlowApi,
    SqliteDatabase,
};
use bsw_common::Money;
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub const BUYER_TIER: i64 = 1;
pub const BASIC_TIER: i64 = 2;
pub const PRO_TIER: i64 = 3;

pub fn random_db_path() -> String {
    let dir = std::env::temp_dir();
    format!("sqlite://{}/bookswap_it_{}.db", dir.display(), rand::random::<u64>())
}

pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    Sqlite::create_database(url).await.expect("Error creating database");
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    db.migrate().await.expect("Error running DB migrations");
    debug!("🚀️ Test database ready at {url}");
    db
}

/// Every API in the marketplace, wired to one fresh database, with the notification hook running.
pub struct Marketplace {
    pub db: SqliteDatabase,
    pub listings: ListingApi<SqliteDatabase>,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub lists: ItemListApi<SqliteDatabase>,
    pub cards: CardApi<SqliteDatabase>,
    pub inbox: NotificationApi<SqliteDatabase>,
}

impl Marketplace {
    pub async fn new() -> Self {
        let db = prepare_test_env(&random_db_path()).await;
        let mut hooks = EventHooks::default();
        hooks.add_order_event_handler(notification_hook(db.clone()));
        hooks.add_order_event_handler(logging_hook());
        let handlers = EventHandlers::new(16, hooks);
        let producers = handlers.producers();
        handlers.start_handlers();
        Self {
            listings: ListingApi::new(db.clone()),
            orders: OrderFlowApi::new(db.clone(), producers),
            lists: ItemListApi::new(db.clone()),
            cards: CardApi::new(db.clone()),
            inbox: NotificationApi::new(db.clone()),
            db,
        }
    }

    pub async fn user(&self, name: &str, tier_id: i64) -> User {
        let email = format!("{}@campus.example", name.to_lowercase());
        self.db.insert_user(NewUser::new(name.to_string(), email).with_tier(tier_id)).await.expect("Error adding user")
    }

    pub async fn listing(&self, seller: &User, name: &str, cents: i64) -> Product {
        let product = NewProduct::new(name, "J. Smith", Money::from_cents(cents));
        self.listings.create_listing(seller.id, product).await.expect("Error creating listing")
    }

    /// Opens a separate pool on the same database file. Reads through it only see what other connections have
    /// committed.
    pub async fn observer(&self) -> SqliteDatabase {
        SqliteDatabase::new_with_url(self.db.url(), 1).await.expect("Error opening a second connection")
    }

    /// Notifications are stored by a background task, so give it a moment to catch up.
    pub async fn wait_for_notifications(&self, user_id: i64, count: usize) -> usize {
        let mut found = 0;
        for _ in 0..100 {
            found = self.db.fetch_notifications(user_id, false).await.expect("Error fetching notifications").len();
            if found >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        found
    }

    pub async fn tear_down(mut self) {
        let url = self.db.url().to_string();
        if let Err(e) = self.db.close().await {
            warn!("🚀️ Failed to close database: {e}");
        }
        if let Err(e) = Sqlite::drop_database(&url).await {
            warn!("🚀️ Failed to drop database {url}: {e}");
        }
    }
}
