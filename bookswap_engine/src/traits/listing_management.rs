use crate::{
    db_types::{NewProduct, Product, ProductUpdate, Tier},
    market_api::listing_objects::ProductQueryFilter,
    traits::MarketplaceError,
};

/// Products listed for sale.
#[allow(async_fn_in_trait)]
pub trait ListingManagement {
    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, MarketplaceError>;

    /// Fetches products matching the filter, newest first.
    async fn search_products(&self, query: ProductQueryFilter) -> Result<Vec<Product>, MarketplaceError>;

    /// The number of the seller's products that are still in the `selling` state.
    async fn count_active_listings(&self, seller_id: i64) -> Result<i64, MarketplaceError>;

    /// Counts the seller's active listings and, if `tier` allows another one, inserts the product. The count and the
    /// insert happen in the same atomic transaction.
    ///
    /// Returns `ListingQuotaExceeded` if the tier does not allow another listing.
    async fn insert_product_within_quota(
        &self,
        seller_id: i64,
        product: NewProduct,
        tier: &Tier,
    ) -> Result<Product, MarketplaceError>;

    /// Applies the allowed field changes in `update` and returns the updated product.
    async fn update_product(&self, product_id: i64, update: ProductUpdate) -> Result<Product, MarketplaceError>;

    /// Deletes the product, unless an order references it, in which case `ProductInUse` is returned.
    async fn delete_product(&self, product_id: i64) -> Result<(), MarketplaceError>;
}
