//! Cart and wishlist queries. Both lists share one shape, so every function takes the [`ListKind`] and targets the
//! matching table.
use log::debug;
use sqlx::SqliteConnection;

use super::is_unique_violation;
use crate::{
    db_types::{ListItem, ListKind},
    traits::MarketplaceError,
};

/// Wishlist rows have no quantity column. They always count as one.
fn columns(kind: ListKind) -> &'static str {
    match kind {
        ListKind::Cart => "id, user_id, product_id, quantity, created_at",
        ListKind::Wishlist => "id, user_id, product_id, 1 AS quantity, created_at",
    }
}

/// Adds the product to the list. The `(user_id, product_id)` unique constraint turns a second insert of the same
/// pair, including one from a racing request, into `DuplicateItem`.
pub async fn insert_item(
    kind: ListKind,
    user_id: i64,
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<ListItem, MarketplaceError> {
    let sql =
        format!("INSERT INTO {} (user_id, product_id) VALUES (?, ?) RETURNING {}", kind.table_name(), columns(kind));
    let result = sqlx::query_as(&sql).bind(user_id).bind(product_id).fetch_one(conn).await;
    match result {
        Ok(item) => {
            debug!("🗃️ Product #{product_id} added to the {kind} of user #{user_id}");
            Ok(item)
        },
        Err(e) if is_unique_violation(&e) => Err(MarketplaceError::DuplicateItem { kind, product_id }),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_item(
    kind: ListKind,
    user_id: i64,
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<ListItem>, sqlx::Error> {
    let sql = format!("SELECT {} FROM {} WHERE user_id = ? AND product_id = ?", columns(kind), kind.table_name());
    let item = sqlx::query_as(&sql).bind(user_id).bind(product_id).fetch_optional(conn).await?;
    Ok(item)
}

pub async fn fetch_items(
    kind: ListKind,
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<ListItem>, sqlx::Error> {
    let sql = format!("SELECT {} FROM {} WHERE user_id = ? ORDER BY id DESC", columns(kind), kind.table_name());
    let items = sqlx::query_as(&sql).bind(user_id).fetch_all(conn).await?;
    Ok(items)
}

pub async fn remove_item(
    kind: ListKind,
    user_id: i64,
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let sql = format!("DELETE FROM {} WHERE user_id = ? AND product_id = ?", kind.table_name());
    let result = sqlx::query(&sql).bind(user_id).bind(product_id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn clear_items(kind: ListKind, user_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let sql = format!("DELETE FROM {} WHERE user_id = ?", kind.table_name());
    let result = sqlx::query(&sql).bind(user_id).execute(conn).await?;
    debug!("🗃️ Cleared {} items from the {kind} of user #{user_id}", result.rows_affected());
    Ok(result.rows_affected())
}

pub async fn count_items(kind: ListKind, user_id: i64, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let sql = format!("SELECT COUNT(*) FROM {} WHERE user_id = ?", kind.table_name());
    let count = sqlx::query_scalar(&sql).bind(user_id).fetch_one(conn).await?;
    Ok(count)
}

/// Removes a sold product from every user's cart and wishlist.
pub async fn remove_product_everywhere(product_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let mut removed = 0;
    for kind in [ListKind::Cart, ListKind::Wishlist] {
        let sql = format!("DELETE FROM {} WHERE product_id = ?", kind.table_name());
        removed += sqlx::query(&sql).bind(product_id).execute(&mut *conn).await?.rows_affected();
    }
    debug!("🗃️ Product #{product_id} removed from {removed} carts and wishlists");
    Ok(removed)
}
