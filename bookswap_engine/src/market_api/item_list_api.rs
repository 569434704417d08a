use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{ListItem, ListKind},
    market_api::listing_objects::ListEntry,
    traits::{ItemListManagement, ListingManagement, MarketplaceError},
};

/// The cart and wishlist API. Both lists share one set of rules, selected by [`ListKind`].
pub struct ItemListApi<B> {
    db: B,
}

impl<B> Debug for ItemListApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ItemListApi")
    }
}

impl<B> ItemListApi<B>
where B: ItemListManagement + ListingManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Adds a product to the user's cart or wishlist.
    ///
    /// Only products that are still for sale, and that the user is not selling, can be added. Each product appears
    /// at most once per list; a second add fails with `DuplicateItem` rather than bumping a quantity.
    pub async fn add_item(&self, kind: ListKind, user_id: i64, product_id: i64) -> Result<ListItem, MarketplaceError> {
        let product = self.db.fetch_product(product_id).await?.ok_or(MarketplaceError::ProductNotFound(product_id))?;
        if !product.is_selling() {
            return Err(MarketplaceError::ProductUnavailable(product_id));
        }
        if product.seller_id == user_id {
            return Err(MarketplaceError::SelfAddForbidden(kind));
        }
        if self.db.fetch_item(kind, user_id, product_id).await?.is_some() {
            return Err(MarketplaceError::DuplicateItem { kind, product_id });
        }
        let item = self.db.insert_item(kind, user_id, product_id).await?;
        debug!("🛒️ Product #{product_id} added to the {kind} of user #{user_id}");
        Ok(item)
    }

    pub async fn remove_item(&self, kind: ListKind, user_id: i64, product_id: i64) -> Result<(), MarketplaceError> {
        if self.db.remove_item(kind, user_id, product_id).await? {
            debug!("🛒️ Product #{product_id} removed from the {kind} of user #{user_id}");
            Ok(())
        } else {
            Err(MarketplaceError::ItemNotFound { kind, product_id })
        }
    }

    /// Empties the list. Returns the number of items removed.
    pub async fn clear(&self, kind: ListKind, user_id: i64) -> Result<u64, MarketplaceError> {
        let removed = self.db.clear_items(kind, user_id).await?;
        debug!("🛒️ Cleared {removed} items from the {kind} of user #{user_id}");
        Ok(removed)
    }

    pub async fn count(&self, kind: ListKind, user_id: i64) -> Result<i64, MarketplaceError> {
        self.db.count_items(kind, user_id).await
    }

    /// The user's list with each product, most recently added first.
    pub async fn items(&self, kind: ListKind, user_id: i64) -> Result<Vec<ListEntry>, MarketplaceError> {
        let items = self.db.fetch_items(kind, user_id).await?;
        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            match self.db.fetch_product(item.product_id).await? {
                Some(product) => entries.push(ListEntry {
                    item_id: item.id,
                    quantity: item.quantity,
                    added_at: item.created_at,
                    product,
                }),
                None => warn!("🛒️ {kind} item #{} points at missing product #{}", item.id, item.product_id),
            }
        }
        Ok(entries)
    }
}
