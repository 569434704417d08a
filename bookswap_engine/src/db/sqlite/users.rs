use log::debug;
use sqlx::SqliteConnection;

use super::is_unique_violation;
use crate::{
    db_types::{NewUser, Tier, User},
    traits::MarketplaceError,
};

/// The tier new users are placed on when none is given.
pub const DEFAULT_TIER_ID: i64 = 1;

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, MarketplaceError> {
    let result = sqlx::query_as("INSERT INTO users (name, email, tier_id) VALUES (?, ?, ?) RETURNING *")
        .bind(user.name)
        .bind(user.email.to_lowercase())
        .bind(user.tier_id.unwrap_or(DEFAULT_TIER_ID))
        .fetch_one(conn)
        .await;
    match result {
        Ok(user) => Ok(user),
        Err(e) if is_unique_violation(&e) => {
            Err(MarketplaceError::invalid_input("email", "An account with this email address already exists"))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = ?").bind(user_id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_tier(tier_id: i64, conn: &mut SqliteConnection) -> Result<Option<Tier>, sqlx::Error> {
    let tier = sqlx::query_as("SELECT * FROM tiers WHERE id = ?").bind(tier_id).fetch_optional(conn).await?;
    Ok(tier)
}

pub async fn fetch_tiers(conn: &mut SqliteConnection) -> Result<Vec<Tier>, sqlx::Error> {
    let tiers = sqlx::query_as("SELECT * FROM tiers ORDER BY max_listings ASC, id ASC").fetch_all(conn).await?;
    Ok(tiers)
}

pub async fn update_user_tier(
    user_id: i64,
    tier_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("UPDATE users SET tier_id = ? WHERE id = ? RETURNING *")
        .bind(tier_id)
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    debug!("🗃️ User #{user_id} moved to tier #{tier_id}");
    Ok(user)
}
