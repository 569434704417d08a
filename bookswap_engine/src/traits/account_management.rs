use crate::{
    db_types::{NewUser, Tier, User},
    traits::MarketplaceError,
};

/// Users and the seller tiers they subscribe to.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    /// Fetches the user with the given id. If no such user exists, `None` is returned.
    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, MarketplaceError>;

    async fn fetch_tier(&self, tier_id: i64) -> Result<Option<Tier>, MarketplaceError>;

    /// Fetches all tiers, ordered from the smallest listing allowance to the largest.
    async fn fetch_tiers(&self) -> Result<Vec<Tier>, MarketplaceError>;

    /// Inserts a new user. If the email address is already taken, an `InvalidInput` error is
    /// returned for the `email` field.
    async fn insert_user(&self, user: NewUser) -> Result<User, MarketplaceError>;

    /// Moves the user to another tier. Existing listings are left alone.
    async fn update_user_tier(&self, user_id: i64, tier_id: i64) -> Result<User, MarketplaceError>;
}
