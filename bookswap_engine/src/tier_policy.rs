//! Seller subscription tiers and the listing quota they impose.
//!
//! The quota only ever blocks the *creation* of a listing. Moving a seller to a smaller tier leaves their existing
//! listings untouched, even if they are now over the limit.
use serde::{Deserialize, Serialize};

use crate::db_types::Tier;

/// Returns `true` if a seller on `tier` with `current_active_count` listings still in the `selling` state may create
/// another one.
pub fn can_create_listing(tier: &Tier, current_active_count: i64) -> bool {
    tier.max_listings > 0 && current_active_count < tier.max_listings
}

/// A snapshot of a seller's listing allowance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingQuota {
    pub tier: Tier,
    pub current_listings: i64,
    pub max_listings: i64,
    pub can_create: bool,
}

impl ListingQuota {
    pub fn new(tier: Tier, current_listings: i64) -> Self {
        let can_create = can_create_listing(&tier, current_listings);
        let max_listings = tier.max_listings;
        Self { tier, current_listings, max_listings, can_create }
    }

    /// How many more listings may be created before the quota kicks in.
    pub fn remaining(&self) -> i64 {
        (self.max_listings - self.current_listings).max(0)
    }
}
