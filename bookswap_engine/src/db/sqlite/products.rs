use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{NewProduct, Product, ProductStatus, ProductUpdate},
    market_api::listing_objects::ProductQueryFilter,
    traits::MarketplaceError,
};

pub async fn insert_product(
    seller_id: i64,
    product: NewProduct,
    conn: &mut SqliteConnection,
) -> Result<Product, sqlx::Error> {
    let product: Product = sqlx::query_as(
        r#"
            INSERT INTO products (
                seller_id,
                name,
                author,
                description,
                price,
                category_id,
                state_id,
                image_url,
                year_of_publication
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *;
        "#,
    )
    .bind(seller_id)
    .bind(product.name)
    .bind(product.author)
    .bind(product.description)
    .bind(product.price)
    .bind(product.category_id)
    .bind(product.state_id)
    .bind(product.image_url)
    .bind(product.year_of_publication)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Product #{} listed by seller #{seller_id}", product.id);
    Ok(product)
}

pub async fn fetch_product(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product =
        sqlx::query_as("SELECT * FROM products WHERE id = ?").bind(product_id).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn count_active_listings(seller_id: i64, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE seller_id = ? AND status = 'selling'")
        .bind(seller_id)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

/// Fetches products according to criteria specified in the `ProductQueryFilter`.
///
/// Resulting products are ordered by id, newest first.
pub async fn search_products(
    query: ProductQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Product>, sqlx::Error> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM products WHERE ");
    let mut where_clause = builder.separated(" AND ");
    where_clause.push("status = ");
    where_clause.push_bind_unseparated(query.status_or_default());
    if let Some(text) = query.search_text() {
        let pattern = format!("%{text}%");
        where_clause.push("(name LIKE ");
        where_clause.push_bind_unseparated(pattern.clone());
        where_clause.push_unseparated(" OR author LIKE ");
        where_clause.push_bind_unseparated(pattern);
        where_clause.push_unseparated(")");
    }
    if let Some(category_id) = query.category_id {
        where_clause.push("category_id = ");
        where_clause.push_bind_unseparated(category_id);
    }
    if let Some(state_id) = query.state_id {
        where_clause.push("state_id = ");
        where_clause.push_bind_unseparated(state_id);
    }
    if let Some(seller_id) = query.seller_id {
        where_clause.push("seller_id = ");
        where_clause.push_bind_unseparated(seller_id);
    }
    if let Some(min) = query.min_price {
        where_clause.push("price >= ");
        where_clause.push_bind_unseparated(min);
    }
    if let Some(max) = query.max_price {
        where_clause.push("price <= ");
        where_clause.push_bind_unseparated(max);
    }
    builder.push(" ORDER BY id DESC LIMIT ");
    builder.push_bind(query.page_size());
    builder.push(" OFFSET ");
    builder.push_bind(query.page_offset());

    trace!("🗃️ Executing query: {}", builder.sql());
    let products = builder.build_query_as::<Product>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_products: {}", products.len());
    Ok(products)
}

/// Applies the changes in `update`. An empty update leaves the row (including `updated_at`) as it was.
pub async fn update_product(
    product_id: i64,
    update: ProductUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, sqlx::Error> {
    if update.is_empty() {
        debug!("🗃️ No fields to update for product #{product_id}. Update request skipped.");
        return fetch_product(product_id, conn).await;
    }
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE products SET updated_at = CURRENT_TIMESTAMP");
    if let Some(name) = update.name {
        builder.push(", name = ").push_bind(name);
    }
    if let Some(author) = update.author {
        builder.push(", author = ").push_bind(author);
    }
    if let Some(description) = update.description {
        builder.push(", description = ").push_bind(description);
    }
    if let Some(price) = update.price {
        builder.push(", price = ").push_bind(price);
    }
    if let Some(category_id) = update.category_id {
        builder.push(", category_id = ").push_bind(category_id);
    }
    if let Some(state_id) = update.state_id {
        builder.push(", state_id = ").push_bind(state_id);
    }
    if let Some(image_url) = update.image_url {
        builder.push(", image_url = ").push_bind(image_url);
    }
    if let Some(year) = update.year_of_publication {
        builder.push(", year_of_publication = ").push_bind(year);
    }
    builder.push(" WHERE id = ").push_bind(product_id).push(" RETURNING *");
    trace!("🗃️ Executing query: {}", builder.sql());
    let product = builder.build_query_as::<Product>().fetch_optional(conn).await?;
    Ok(product)
}

/// Marks a product as sold to `buyer_id`, provided it is still for sale.
pub async fn mark_sold(product_id: i64, buyer_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE products SET status = ?, buyer_id = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ? AND status = ?",
    )
    .bind(ProductStatus::Sold)
    .bind(buyer_id)
    .bind(product_id)
    .bind(ProductStatus::Selling)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn order_count_for_product(product_id: i64, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE product_id = ?")
        .bind(product_id)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

/// Deletes the product. Refuses with `ProductInUse` if any order references it. Cart and wishlist lines for the
/// product go with it.
pub async fn delete_product(product_id: i64, conn: &mut SqliteConnection) -> Result<(), MarketplaceError> {
    if order_count_for_product(product_id, &mut *conn).await? > 0 {
        return Err(MarketplaceError::ProductInUse(product_id));
    }
    let result = sqlx::query("DELETE FROM products WHERE id = ?").bind(product_id).execute(conn).await?;
    if result.rows_affected() == 0 {
        return Err(MarketplaceError::ProductNotFound(product_id));
    }
    debug!("🗃️ Product #{product_id} deleted");
    Ok(())
}
