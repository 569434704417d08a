use std::fmt::Debug;

use log::*;

use crate::{
    db_types::Notification,
    traits::{MarketplaceError, NotificationManagement},
};

/// The notification inbox. A user can only see and change their own notifications; anybody else's look missing.
pub struct NotificationApi<B> {
    db: B,
}

impl<B> Debug for NotificationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NotificationApi")
    }
}

impl<B> NotificationApi<B>
where B: NotificationManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// The user's notifications, newest first.
    pub async fn notifications(&self, user_id: i64, unread_only: bool) -> Result<Vec<Notification>, MarketplaceError> {
        self.db.fetch_notifications(user_id, unread_only).await
    }

    pub async fn unread_count(&self, user_id: i64) -> Result<i64, MarketplaceError> {
        self.db.count_unread_notifications(user_id).await
    }

    pub async fn mark_read(&self, user_id: i64, notification_id: i64) -> Result<Notification, MarketplaceError> {
        self.db
            .mark_notification_read(user_id, notification_id)
            .await?
            .ok_or(MarketplaceError::NotificationNotFound(notification_id))
    }

    /// Returns the number of notifications that were unread.
    pub async fn mark_all_read(&self, user_id: i64) -> Result<u64, MarketplaceError> {
        let count = self.db.mark_all_notifications_read(user_id).await?;
        debug!("🔔️ Marked {count} notifications as read for user #{user_id}");
        Ok(count)
    }

    pub async fn delete(&self, user_id: i64, notification_id: i64) -> Result<(), MarketplaceError> {
        if self.db.delete_notification(user_id, notification_id).await? {
            Ok(())
        } else {
            Err(MarketplaceError::NotificationNotFound(notification_id))
        }
    }
}
