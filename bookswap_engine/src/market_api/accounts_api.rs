//! Users, their tiers, and tier changes.
use std::fmt::Debug;

use log::*;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{NewUser, Tier, User},
    traits::{AccountManagement, MarketplaceError},
};

/// A user together with the tier they are on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub tier: Tier,
}

pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn user(&self, user_id: i64) -> Result<User, MarketplaceError> {
        self.db.fetch_user(user_id).await?.ok_or(MarketplaceError::UserNotFound(user_id))
    }

    pub async fn profile(&self, user_id: i64) -> Result<UserProfile, MarketplaceError> {
        let user = self.user(user_id).await?;
        let tier = self.tier(user.tier_id).await?;
        Ok(UserProfile { user, tier })
    }

    pub async fn tier(&self, tier_id: i64) -> Result<Tier, MarketplaceError> {
        self.db.fetch_tier(tier_id).await?.ok_or(MarketplaceError::TierNotFound(tier_id))
    }

    pub async fn tiers(&self) -> Result<Vec<Tier>, MarketplaceError> {
        self.db.fetch_tiers().await
    }

    /// Creates the marketplace profile for a user. Credentials live with the identity provider, so all that is kept
    /// here is a display name, a unique email address and the tier.
    pub async fn register_user(&self, user: NewUser) -> Result<User, MarketplaceError> {
        if user.name.trim().is_empty() {
            return Err(MarketplaceError::invalid_input("name", "Name is required"));
        }
        if !is_plausible_email(&user.email) {
            return Err(MarketplaceError::invalid_input("email", "Email address is not valid"));
        }
        if let Some(tier_id) = user.tier_id {
            self.tier(tier_id).await?;
        }
        let user = NewUser { name: user.name.trim().to_string(), email: user.email.trim().to_string(), ..user };
        let user = self.db.insert_user(user).await?;
        info!("📚️ Registered user #{} ({})", user.id, user.email);
        Ok(user)
    }

    /// Moves the user to another tier. A downgrade never touches existing listings. It only limits new ones.
    pub async fn change_tier(&self, user_id: i64, tier_id: i64) -> Result<UserProfile, MarketplaceError> {
        let user = self.db.update_user_tier(user_id, tier_id).await?;
        let tier = self.tier(tier_id).await?;
        info!("📚️ User #{user_id} is now on the {} tier ({} listings)", tier.name, tier.max_listings);
        Ok(UserProfile { user, tier })
    }
}

fn is_plausible_email(email: &str) -> bool {
    match Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$") {
        Ok(re) => re.is_match(email.trim()),
        Err(e) => {
            error!("📚️ Email pattern failed to compile. {e}");
            false
        },
    }
}
