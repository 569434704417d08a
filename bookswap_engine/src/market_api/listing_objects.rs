use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::{Money, Product, ProductStatus};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Criteria for browsing and searching listings. Unset fields do not constrain the search. When `status` is not set,
/// only products that are still for sale are returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductQueryFilter {
    /// Matches anywhere in the book name or author
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub state_id: Option<i64>,
    pub seller_id: Option<i64>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub status: Option<ProductStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ProductQueryFilter {
    pub fn with_search<S: Into<String>>(mut self, search: S) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_seller(mut self, seller_id: i64) -> Self {
        self.seller_id = Some(seller_id);
        self
    }

    pub fn with_price_range(mut self, min: Option<Money>, max: Option<Money>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn with_status(mut self, status: ProductStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_page(mut self, limit: i64, offset: i64) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    pub fn status_or_default(&self) -> ProductStatus {
        self.status.unwrap_or(ProductStatus::Selling)
    }

    /// The page size, clamped to `1..=MAX_PAGE_SIZE`.
    pub fn page_size(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn page_offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    /// Search text with surrounding whitespace removed, or `None` if there is nothing left to search for.
    pub fn search_text(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

impl Display for ProductQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "status: {}. ", self.status_or_default())?;
        if let Some(search) = self.search_text() {
            write!(f, "search: {search}. ")?;
        }
        if let Some(category) = self.category_id {
            write!(f, "category: {category}. ")?;
        }
        if let Some(state) = self.state_id {
            write!(f, "condition: {state}. ")?;
        }
        if let Some(seller) = self.seller_id {
            write!(f, "seller: {seller}. ")?;
        }
        if let Some(min) = self.min_price {
            write!(f, "min price: {min}. ")?;
        }
        if let Some(max) = self.max_price {
            write!(f, "max price: {max}. ")?;
        }
        write!(f, "page: {} from {}.", self.page_size(), self.page_offset())
    }
}

/// A product as it appears in a user's cart or wishlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    pub item_id: i64,
    pub quantity: i64,
    pub added_at: chrono::DateTime<chrono::Utc>,
    pub product: Product,
}
