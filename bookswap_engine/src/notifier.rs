//! # Order notifications
//!
//! Turns order events into inbox notifications for the other party. The hook is fire-and-forget: a failure to store a
//! notification is logged and otherwise ignored, and never affects the order operation that triggered it.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;

use crate::{
    db_types::NewNotification,
    events::{Handler, OrderEvent, OrderEventKind},
};

/// The notification the recipient of `event` should get.
pub fn notification_for(event: &OrderEvent) -> NewNotification {
    NewNotification {
        user_id: event.recipient(),
        message: notification_message(event),
        notification_type: event.kind.notification_type(),
        order_id: Some(event.order.id),
    }
}

pub fn notification_message(event: &OrderEvent) -> String {
    let id = event.order.id;
    let book = &event.product_name;
    let amount = event.order.total_amount;
    match event.kind {
        OrderEventKind::Created => {
            format!("New order #{id} for \"{book}\" ({amount}). Accept or reject it from your orders page.")
        },
        OrderEventKind::Accepted => format!("Your order #{id} for \"{book}\" was accepted and is being prepared."),
        OrderEventKind::Rejected => format!("Your order #{id} for \"{book}\" was rejected by the seller."),
        OrderEventKind::Shipped => format!("Your order #{id} for \"{book}\" has been shipped."),
        OrderEventKind::InTransit => format!("Your order #{id} for \"{book}\" is on its way."),
        OrderEventKind::Completed => {
            format!("Order #{id} for \"{book}\" is complete. The payment of {amount} has been released to you.")
        },
    }
}

/// A hook that logs every order event. Useful on its own in development, where nobody reads the inbox.
pub fn logging_hook() -> Handler<OrderEvent> {
    Arc::new(|event: OrderEvent| {
        Box::pin(async move {
            info!(
                "🔔️ Order #{} {:?}. Notifying user #{}: {}",
                event.order.id,
                event.kind,
                event.recipient(),
                notification_message(&event)
            );
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    })
}

#[cfg(feature = "sqlite")]
mod sqlite_hook {
    use std::{future::Future, pin::Pin, sync::Arc};

    use log::*;

    use super::notification_for;
    use crate::{
        events::{Handler, OrderEvent},
        SqliteDatabase,
    };

    /// A hook that stores a notification for the recipient of every order event.
    pub fn notification_hook(db: SqliteDatabase) -> Handler<OrderEvent> {
        Arc::new(move |event: OrderEvent| {
            let db = db.clone();
            Box::pin(async move {
                let notification = notification_for(&event);
                let recipient = notification.user_id;
                match db.record_notification(notification).await {
                    Ok(n) => debug!("🔔️ Notification #{} stored for user #{recipient}", n.id),
                    Err(e) => error!(
                        "🔔️ Could not store the {:?} notification for order #{} (user #{recipient}). {e}",
                        event.kind, event.order.id
                    ),
                }
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        })
    }
}

#[cfg(feature = "sqlite")]
pub use sqlite_hook::notification_hook;
