//! Listing management for sellers, and browsing for everyone.
use std::fmt::Debug;

use chrono::{Datelike, Utc};
use log::*;

use crate::{
    db_types::{NewProduct, Product, ProductUpdate},
    market_api::listing_objects::ProductQueryFilter,
    tier_policy::ListingQuota,
    traits::{AccountManagement, ListingManagement, MarketplaceError},
};

/// The earliest publication year we accept. Anything older is almost certainly a typo.
const EARLIEST_PUBLICATION_YEAR: i32 = 1450;

pub struct ListingApi<B> {
    db: B,
}

impl<B: Debug> Debug for ListingApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ListingApi ({:?})", self.db)
    }
}

impl<B> ListingApi<B>
where B: AccountManagement + ListingManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn product(&self, product_id: i64) -> Result<Product, MarketplaceError> {
        self.db.fetch_product(product_id).await?.ok_or(MarketplaceError::ProductNotFound(product_id))
    }

    pub async fn search(&self, query: ProductQueryFilter) -> Result<Vec<Product>, MarketplaceError> {
        trace!("📚️ Searching products. {query}");
        self.db.search_products(query).await
    }

    /// How many listings the seller has, and how many their tier allows.
    pub async fn listing_quota(&self, seller_id: i64) -> Result<ListingQuota, MarketplaceError> {
        let user = self.db.fetch_user(seller_id).await?.ok_or(MarketplaceError::UserNotFound(seller_id))?;
        let tier = self.db.fetch_tier(user.tier_id).await?.ok_or(MarketplaceError::TierNotFound(user.tier_id))?;
        let current = self.db.count_active_listings(seller_id).await?;
        Ok(ListingQuota::new(tier, current))
    }

    /// Lists a new book for sale, provided the seller's tier allows another active listing.
    pub async fn create_listing(&self, seller_id: i64, product: NewProduct) -> Result<Product, MarketplaceError> {
        validate_new_product(&product)?;
        let user = self.db.fetch_user(seller_id).await?.ok_or(MarketplaceError::UserNotFound(seller_id))?;
        let tier = self.db.fetch_tier(user.tier_id).await?.ok_or(MarketplaceError::TierNotFound(user.tier_id))?;
        let product = self.db.insert_product_within_quota(seller_id, product, &tier).await.map_err(|e| {
            if let MarketplaceError::ListingQuotaExceeded { current_listings, max_listings } = &e {
                info!(
                    "📚️ Seller #{seller_id} tried to list a book with {current_listings}/{max_listings} listings on \
                     the {} tier",
                    tier.name
                );
            }
            e
        })?;
        info!("📚️ Seller #{seller_id} listed product #{} \"{}\" for {}", product.id, product.name, product.price);
        Ok(product)
    }

    /// Changes the allowed fields of one of the seller's unsold listings.
    pub async fn update_listing(
        &self,
        seller_id: i64,
        product_id: i64,
        update: ProductUpdate,
    ) -> Result<Product, MarketplaceError> {
        let product = self.owned_product(seller_id, product_id).await?;
        if !product.is_selling() {
            return Err(MarketplaceError::ProductUnavailable(product_id));
        }
        validate_update(&update)?;
        let product = self.db.update_product(product_id, update).await?;
        debug!("📚️ Product #{product_id} updated by seller #{seller_id}");
        Ok(product)
    }

    /// Removes one of the seller's listings. Listings that have ever been ordered are kept for the order history.
    pub async fn delete_listing(&self, seller_id: i64, product_id: i64) -> Result<(), MarketplaceError> {
        self.owned_product(seller_id, product_id).await?;
        self.db.delete_product(product_id).await?;
        info!("📚️ Product #{product_id} deleted by seller #{seller_id}");
        Ok(())
    }

    async fn owned_product(&self, seller_id: i64, product_id: i64) -> Result<Product, MarketplaceError> {
        let product = self.product(product_id).await?;
        if product.seller_id != seller_id {
            return Err(MarketplaceError::Forbidden(format!("Product #{product_id} belongs to another seller")));
        }
        Ok(product)
    }
}

fn validate_new_product(product: &NewProduct) -> Result<(), MarketplaceError> {
    if product.name.trim().is_empty() {
        return Err(MarketplaceError::invalid_input("name", "Name is required"));
    }
    if product.author.trim().is_empty() {
        return Err(MarketplaceError::invalid_input("author", "Author is required"));
    }
    if !product.price.is_positive() {
        return Err(MarketplaceError::invalid_input("price", "Price must be greater than zero"));
    }
    validate_year(product.year_of_publication)
}

fn validate_update(update: &ProductUpdate) -> Result<(), MarketplaceError> {
    if update.name.as_deref().is_some_and(|s| s.trim().is_empty()) {
        return Err(MarketplaceError::invalid_input("name", "Name cannot be blank"));
    }
    if update.author.as_deref().is_some_and(|s| s.trim().is_empty()) {
        return Err(MarketplaceError::invalid_input("author", "Author cannot be blank"));
    }
    if update.price.is_some_and(|p| !p.is_positive()) {
        return Err(MarketplaceError::invalid_input("price", "Price must be greater than zero"));
    }
    validate_year(update.year_of_publication)
}

fn validate_year(year: Option<i32>) -> Result<(), MarketplaceError> {
    match year {
        Some(y) if y < EARLIEST_PUBLICATION_YEAR || y > Utc::now().year() => Err(MarketplaceError::invalid_input(
            "year_of_publication",
            format!("Year must be between {EARLIEST_PUBLICATION_YEAR} and this year"),
        )),
        _ => Ok(()),
    }
}
