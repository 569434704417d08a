use crate::traits::{
    AccountManagement,
    CardManagement,
    ItemListManagement,
    ListingManagement,
    MarketplaceError,
    NotificationManagement,
    OrderManagement,
};

/// The full set of behaviour a backend needs to run the marketplace.
#[allow(async_fn_in_trait)]
pub trait MarketplaceDatabase:
    Clone
    + AccountManagement
    + ListingManagement
    + OrderManagement
    + CardManagement
    + ItemListManagement
    + NotificationManagement
{
    /// The URL of the database
    fn url(&self) -> &str;

    /// Closes the database connection(s). Further calls on this instance fail.
    async fn close(&mut self) -> Result<(), MarketplaceError>;
}
