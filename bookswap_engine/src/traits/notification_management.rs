use crate::{
    db_types::{NewNotification, Notification},
    traits::MarketplaceError,
};

/// The per-user notification inbox. Every call that touches an existing notification is scoped to its recipient.
#[allow(async_fn_in_trait)]
pub trait NotificationManagement {
    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, MarketplaceError>;

    /// Fetches the user's notifications, newest first.
    async fn fetch_notifications(&self, user_id: i64, unread_only: bool)
        -> Result<Vec<Notification>, MarketplaceError>;

    async fn count_unread_notifications(&self, user_id: i64) -> Result<i64, MarketplaceError>;

    /// Marks one of the user's notifications as read. Returns `None` if the user has no such notification.
    async fn mark_notification_read(
        &self,
        user_id: i64,
        notification_id: i64,
    ) -> Result<Option<Notification>, MarketplaceError>;

    /// Returns the number of notifications that changed.
    async fn mark_all_notifications_read(&self, user_id: i64) -> Result<u64, MarketplaceError>;

    /// Returns `false` if the user has no such notification.
    async fn delete_notification(&self, user_id: i64, notification_id: i64) -> Result<bool, MarketplaceError>;
}
