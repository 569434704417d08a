//! # BookSwap marketplace public API
//!
//! The `market_api` module exposes the programmatic API of the marketplace. Each API covers one area and is generic
//! over the backend traits it needs, so callers pick the pieces they want.
//!
//! * [`accounts_api`] reads users and tiers, registers users and changes their tier.
//! * [`listing_api`] manages a seller's listings, guarded by the tier's listing quota.
//! * [`order_flow_api`] creates orders with their payment and drives them through their lifecycle.
//! * [`item_list_api`] manages carts and wishlists.
//! * [`card_api`] manages saved payment cards.
//! * [`notification_api`] is the per-user notification inbox.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend that implements the backend traits it requires.
//!
//! ```rust,ignore
//! use bookswap_engine::{ListingApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/bookswap.db", 5).await?;
//! let api = ListingApi::new(db);
//! let quota = api.listing_quota(seller_id).await?;
//! ```

pub mod accounts_api;
pub mod card_api;
pub mod item_list_api;
pub mod listing_api;
pub mod listing_objects;
pub mod notification_api;
pub mod order_flow_api;
pub mod order_objects;
