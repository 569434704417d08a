//! BookSwap Engine
//!
//! The BookSwap engine is the core of a used-textbook marketplace. Sellers list books, buyers check out one book per
//! order, and both sides move the order through a fixed lifecycle until the book changes hands.
//!
//! The library is divided into two main sections:
//! 1. Database management ([`mod@db`]). SQLite is the supported backend. You should never need to access the database
//!    directly. Use the public API instead. The exception is the data types, which are defined in [`db_types`] and
//!    are public.
//! 2. The marketplace public API ([`mod@market_api`]). Each API struct is generic over the backend traits in
//!    [`traits`], which a storage backend implements to run the marketplace.
//!
//! The business rules that do not need storage live in their own modules: [`tier_policy`] decides how many listings a
//! seller may have, and [`order_lifecycle`] decides who may move an order and where it may go next.
//!
//! The engine also emits an [`events::OrderEvent`] after every committed order operation. Hooks subscribe to these
//! events. The [`notifier`] hooks turn them into inbox notifications for the other party.
mod db;

pub mod db_types;
pub mod events;
pub mod helpers;
mod market_api;
pub mod notifier;
pub mod order_lifecycle;
pub mod tier_policy;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteDatabase;
pub use market_api::{
    accounts_api::{AccountApi, UserProfile},
    card_api::CardApi,
    item_list_api::ItemListApi,
    listing_api::ListingApi,
    listing_objects,
    notification_api::NotificationApi,
    order_flow_api::OrderFlowApi,
    order_objects,
};
pub use traits::{
    AccountManagement,
    CardManagement,
    ErrorKind,
    ItemListManagement,
    ListingManagement,
    MarketplaceDatabase,
    MarketplaceError,
    NotificationManagement,
    OrderManagement,
};
