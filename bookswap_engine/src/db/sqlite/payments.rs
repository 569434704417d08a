use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPayment, Payment, PaymentStatus},
    order_lifecycle::PaymentSettlement,
};

/// Inserts the payment row for an order. Not atomic on its own; see [`super::orders::insert_order`].
pub async fn insert_payment(
    order_id: i64,
    card_id: Option<i64>,
    payment: &NewPayment,
    conn: &mut SqliteConnection,
) -> Result<Payment, sqlx::Error> {
    let payment: Payment = sqlx::query_as(
        r#"
            INSERT INTO payments (order_id, card_id, payment_method, payment_amount)
            VALUES (?, ?, ?, ?)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(card_id)
    .bind(payment.payment_method)
    .bind(payment.payment_amount)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Payment #{} ({}) inserted for order #{order_id}", payment.id, payment.payment_method);
    Ok(payment)
}

pub async fn fetch_payment_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment =
        sqlx::query_as("SELECT * FROM payments WHERE order_id = ?").bind(order_id).fetch_optional(conn).await?;
    Ok(payment)
}

/// Moves the order's payment out of `pending`.
pub async fn settle_payment(
    order_id: i64,
    settlement: &PaymentSettlement,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    match settlement {
        PaymentSettlement::Completed { transaction_id, paid_at } => {
            sqlx::query("UPDATE payments SET payment_status = ?, transaction_id = ?, paid_at = ? WHERE order_id = ?")
                .bind(PaymentStatus::Completed)
                .bind(transaction_id)
                .bind(paid_at)
                .bind(order_id)
                .execute(conn)
                .await?;
            debug!("🗃️ Payment for order #{order_id} completed with transaction {transaction_id}");
        },
        PaymentSettlement::Failed => {
            sqlx::query("UPDATE payments SET payment_status = ? WHERE order_id = ?")
                .bind(PaymentStatus::Failed)
                .bind(order_id)
                .execute(conn)
                .await?;
            debug!("🗃️ Payment for order #{order_id} marked as failed");
        },
    }
    Ok(())
}
