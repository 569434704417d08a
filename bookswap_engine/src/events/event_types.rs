use serde::{Deserialize, Serialize};

use crate::{
    db_types::{NotificationType, Order},
    order_lifecycle::OrderAction,
};

/// Things that can happen to an order. Each successful order operation publishes exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderEventKind {
    Created,
    Accepted,
    Rejected,
    Shipped,
    InTransit,
    Completed,
}

impl OrderEventKind {
    /// The user who should hear about this event: the buyer for everything the seller does, and the seller for
    /// everything the buyer does.
    pub fn recipient(&self, order: &Order) -> i64 {
        match self {
            Self::Created | Self::Completed => order.seller_id,
            Self::Accepted | Self::Rejected | Self::Shipped | Self::InTransit => order.buyer_id,
        }
    }

    pub fn notification_type(&self) -> NotificationType {
        match self {
            Self::Created => NotificationType::OrderCreated,
            Self::Accepted => NotificationType::OrderAccepted,
            Self::Rejected => NotificationType::OrderRejected,
            Self::Shipped => NotificationType::OrderShipped,
            Self::InTransit => NotificationType::OrderInTransit,
            Self::Completed => NotificationType::OrderCompleted,
        }
    }
}

impl From<OrderAction> for OrderEventKind {
    fn from(action: OrderAction) -> Self {
        match action {
            OrderAction::Accept => Self::Accepted,
            OrderAction::Reject => Self::Rejected,
            OrderAction::Ship => Self::Shipped,
            OrderAction::MarkInTransit => Self::InTransit,
            OrderAction::Complete => Self::Completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub kind: OrderEventKind,
    /// The order as it was committed
    pub order: Order,
    /// The name of the book being ordered, so that subscribers need not look it up
    pub product_name: String,
}

impl OrderEvent {
    pub fn new<S: Into<String>>(kind: OrderEventKind, order: Order, product_name: S) -> Self {
        Self { kind, order, product_name: product_name.into() }
    }

    pub fn recipient(&self) -> i64 {
        self.kind.recipient(&self.order)
    }
}
