//! Throwaway SQLite databases for tests, plus a few seeding helpers.
use std::path::Path;

use bsw_common::Money;
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::{
    db_types::{NewProduct, NewUser, Product, Tier, User},
    traits::{AccountManagement, ListingManagement, MarketplaceDatabase},
    SqliteDatabase,
};

pub const BUYER_TIER: i64 = 1;
pub const BASIC_TIER: i64 = 2;
pub const PRO_TIER: i64 = 3;
pub const PREMIUM_TIER: i64 = 4;

/// Creates a fresh database at `url`, runs the migrations and returns a connection to it.
pub async fn prepare_test_env(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    db.migrate().await.expect("Error running DB migrations");
    info!("🚀️ Migrations complete");
    db
}

pub fn random_db_path() -> String {
    let dir = std::env::temp_dir();
    format!("sqlite://{}/bookswap_test_{}.db", dir.display(), rand::random::<u64>())
}

pub async fn create_database<P: AsRef<Path>>(path: P) {
    let p = path.as_ref().as_os_str().to_str().expect("Database path is not valid UTF-8");
    if Sqlite::database_exists(p).await.unwrap_or(false) {
        if let Err(e) = Sqlite::drop_database(p).await {
            warn!("Error dropping database {p}: {e:?}");
        }
    }
    Sqlite::create_database(p).await.expect("Error creating database");
    info!("Created Sqlite database {p}");
}

/// Closes the pool and deletes the database file.
pub async fn tear_down(mut db: SqliteDatabase) {
    if let Err(e) = db.close().await {
        warn!("Error closing database: {e}");
    }
    if let Err(e) = Sqlite::drop_database(db.url()).await {
        warn!("Error dropping database {}: {e:?}", db.url());
    }
}

/// Registers a user on the given tier, with an email address derived from the name.
pub async fn seed_user(db: &SqliteDatabase, name: &str, tier_id: i64) -> User {
    let email = format!("{}@campus.example", name.to_lowercase().replace(' ', "."));
    let user = NewUser::new(name.to_string(), email).with_tier(tier_id);
    db.insert_user(user).await.expect("Error inserting user")
}

/// Lists a book for `seller`, respecting the seller's listing quota.
pub async fn seed_product(db: &SqliteDatabase, seller: &User, name: &str, cents: i64) -> Product {
    let tier = seed_tier(db, seller.tier_id).await;
    let product = NewProduct::new(name, "A. Author", Money::from_cents(cents));
    db.insert_product_within_quota(seller.id, product, &tier).await.expect("Error inserting product")
}

pub async fn seed_tier(db: &SqliteDatabase, tier_id: i64) -> Tier {
    db.fetch_tier(tier_id).await.expect("Error fetching tier").expect("Tier does not exist")
}
