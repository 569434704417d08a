use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order},
    market_api::order_objects::OrderQueryFilter,
    order_lifecycle::Transition,
};

/// Inserts a new order using the given connection. This is not atomic. Embed the call inside a transaction if it
/// must happen together with other writes, and pass `&mut tx` as the connection argument.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, sqlx::Error> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                buyer_id,
                seller_id,
                product_id,
                total_amount,
                shipping_address,
                notes
            ) VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *;
        "#,
    )
    .bind(order.buyer_id)
    .bind(order.seller_id)
    .bind(order.product_id)
    .bind(order.total_amount)
    .bind(order.shipping_address)
    .bind(order.notes)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order #{} inserted for product #{}", order.id, order.product_id);
    Ok(order)
}

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = ?").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by id, newest first.
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM orders");
    if !query.is_empty() {
        builder.push(" WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(buyer_id) = query.buyer_id {
        where_clause.push("buyer_id = ");
        where_clause.push_bind_unseparated(buyer_id);
    }
    if let Some(seller_id) = query.seller_id {
        where_clause.push("seller_id = ");
        where_clause.push_bind_unseparated(seller_id);
    }
    if let Some(party_id) = query.party_id {
        where_clause.push("(buyer_id = ");
        where_clause.push_bind_unseparated(party_id);
        where_clause.push_unseparated(" OR seller_id = ");
        where_clause.push_bind_unseparated(party_id);
        where_clause.push_unseparated(")");
    }
    if let Some(product_id) = query.product_id {
        where_clause.push("product_id = ");
        where_clause.push_bind_unseparated(product_id);
    }
    if let Some(statuses) = query.status.filter(|s| !s.is_empty()) {
        where_clause.push("order_status IN (");
        for (i, status) in statuses.into_iter().enumerate() {
            if i > 0 {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(status);
        }
        where_clause.push_unseparated(")");
    }
    builder.push(" ORDER BY id DESC");

    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {}", orders.len());
    Ok(orders)
}

/// Writes the new status fields from `transition`, but only if the order is still in the state the transition was
/// planned against. Returns `false` if the order has moved on (or does not exist), in which case nothing was written.
pub async fn apply_status_change(transition: &Transition, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE orders SET
                order_status = ?,
                tracking_status = ?,
                accepted_at = COALESCE(?, accepted_at),
                shipped_at = COALESCE(?, shipped_at),
                delivered_at = COALESCE(?, delivered_at),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ? AND order_status = ? AND tracking_status = ?
        "#,
    )
    .bind(transition.to_status)
    .bind(transition.to_tracking)
    .bind(transition.accepted_at)
    .bind(transition.shipped_at)
    .bind(transition.delivered_at)
    .bind(transition.order_id)
    .bind(transition.from_status)
    .bind(transition.from_tracking)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
