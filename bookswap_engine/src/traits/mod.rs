//! # Storage backend contracts
//!
//! The traits in this module describe what a storage backend must provide for the marketplace APIs to run on top of
//! it. The public API structs (e.g. [`crate::OrderFlowApi`]) are generic over these traits, so tests can swap in
//! mocks and a new backend only has to implement the traits below.
//!
//! * [`AccountManagement`] covers users and seller tiers.
//! * [`ListingManagement`] covers products, including the quota-guarded insert.
//! * [`OrderManagement`] covers orders and their payment rows, including the atomic checkout and state transitions.
//! * [`CardManagement`] covers a user's saved cards and the default-card flag.
//! * [`ItemListManagement`] covers the cart and the wishlist.
//! * [`NotificationManagement`] covers the notification inbox.
//! * [`MarketplaceDatabase`] ties them all together.
mod account_management;
mod card_management;
mod errors;
mod item_list_management;
mod listing_management;
mod marketplace_database;
mod notification_management;
mod order_management;

pub use account_management::AccountManagement;
pub use card_management::CardManagement;
pub use errors::{ErrorKind, MarketplaceError};
pub use item_list_management::ItemListManagement;
pub use listing_management::ListingManagement;
pub use marketplace_database::MarketplaceDatabase;
pub use notification_management::NotificationManagement;
pub use order_management::OrderManagement;
