use sqlx::SqliteConnection;

use crate::db_types::{NewNotification, Notification};

pub async fn insert_notification(
    notification: NewNotification,
    conn: &mut SqliteConnection,
) -> Result<Notification, sqlx::Error> {
    let notification = sqlx::query_as(
        r#"
            INSERT INTO notifications (user_id, message, notification_type, order_id)
            VALUES (?, ?, ?, ?)
            RETURNING *;
        "#,
    )
    .bind(notification.user_id)
    .bind(notification.message)
    .bind(notification.notification_type)
    .bind(notification.order_id)
    .fetch_one(conn)
    .await?;
    Ok(notification)
}

pub async fn fetch_notifications(
    user_id: i64,
    unread_only: bool,
    conn: &mut SqliteConnection,
) -> Result<Vec<Notification>, sqlx::Error> {
    let sql = if unread_only {
        "SELECT * FROM notifications WHERE user_id = ? AND is_read = 0 ORDER BY id DESC"
    } else {
        "SELECT * FROM notifications WHERE user_id = ? ORDER BY id DESC"
    };
    let notifications = sqlx::query_as(sql).bind(user_id).fetch_all(conn).await?;
    Ok(notifications)
}

pub async fn count_unread(user_id: i64, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0")
        .bind(user_id)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

pub async fn mark_read(
    user_id: i64,
    notification_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Notification>, sqlx::Error> {
    let notification = sqlx::query_as("UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ? RETURNING *")
        .bind(notification_id)
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(notification)
}

pub async fn mark_all_read(user_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0")
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_notification(
    user_id: i64,
    notification_id: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = ? AND user_id = ?")
        .bind(notification_id)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
