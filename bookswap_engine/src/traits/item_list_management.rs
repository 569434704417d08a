use crate::{
    db_types::{ListItem, ListKind},
    traits::MarketplaceError,
};

/// The cart and the wishlist. Both are sets of products per user: a product appears at most once in each list.
#[allow(async_fn_in_trait)]
pub trait ItemListManagement {
    /// Adds the product to the user's list. If the pair already exists, `DuplicateItem` is returned, including when
    /// a concurrent insert won the race.
    async fn insert_item(&self, kind: ListKind, user_id: i64, product_id: i64) -> Result<ListItem, MarketplaceError>;

    async fn fetch_item(
        &self,
        kind: ListKind,
        user_id: i64,
        product_id: i64,
    ) -> Result<Option<ListItem>, MarketplaceError>;

    /// Fetches the user's list, most recently added first.
    async fn fetch_items(&self, kind: ListKind, user_id: i64) -> Result<Vec<ListItem>, MarketplaceError>;

    /// Removes the product from the user's list. Returns `false` if it was not there.
    async fn remove_item(&self, kind: ListKind, user_id: i64, product_id: i64) -> Result<bool, MarketplaceError>;

    /// Empties the user's list, returning the number of items removed.
    async fn clear_items(&self, kind: ListKind, user_id: i64) -> Result<u64, MarketplaceError>;

    async fn count_items(&self, kind: ListKind, user_id: i64) -> Result<i64, MarketplaceError>;
}
