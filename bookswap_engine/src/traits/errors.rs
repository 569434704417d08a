use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    db_types::{ListKind, Order, OrderStatusType, TrackingStatus},
    order_lifecycle::OrderAction,
};

/// Broad classes of [`MarketplaceError`], used by callers to pick a response without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Forbidden,
    InvalidTransition,
    Conflict,
    DependencyFailure,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketplaceError {
    #[error("Invalid value for {field}. {message}")]
    InvalidInput { field: String, message: String },
    #[error("Product #{0} is not available for purchase")]
    ProductUnavailable(i64),
    #[error("You cannot buy your own product")]
    SelfPurchaseForbidden,
    #[error("You cannot add your own product to your {0}")]
    SelfAddForbidden(ListKind),
    #[error(
        "Listing limit reached. You have {current_listings} active listings and your tier allows {max_listings}. \
         Upgrade your tier to list more books."
    )]
    ListingQuotaExceeded { current_listings: i64, max_listings: i64 },
    #[error("Product #{0} does not exist")]
    ProductNotFound(i64),
    #[error("Order #{0} does not exist")]
    OrderNotFound(i64),
    #[error("Card #{0} does not exist")]
    CardNotFound(i64),
    #[error("User #{0} does not exist")]
    UserNotFound(i64),
    #[error("Tier #{0} does not exist")]
    TierNotFound(i64),
    #[error("Product #{product_id} is not in your {kind}")]
    ItemNotFound { kind: ListKind, product_id: i64 },
    #[error("Notification #{0} does not exist")]
    NotificationNotFound(i64),
    #[error("Forbidden. {0}")]
    Forbidden(String),
    #[error("Cannot {action} order #{order_id} while it is {order_status} ({tracking_status})")]
    InvalidTransition {
        order_id: i64,
        action: OrderAction,
        order_status: OrderStatusType,
        tracking_status: TrackingStatus,
    },
    #[error("Product #{product_id} is already in your {kind}")]
    DuplicateItem { kind: ListKind, product_id: i64 },
    #[error("Ambiguous payment source. {0}")]
    AmbiguousPaymentSource(String),
    #[error("Product #{0} is referenced by an order and cannot be deleted")]
    ProductInUse(i64),
    #[error("The order could not be created. Please try again later.")]
    OrderCreationFailed,
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl MarketplaceError {
    pub fn invalid_input<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::InvalidInput { field: field.into(), message: message.into() }
    }

    /// The error for attempting `action` on `order` in its current state.
    pub fn invalid_transition(order: &Order, action: OrderAction) -> Self {
        Self::InvalidTransition {
            order_id: order.id,
            action,
            order_status: order.order_status,
            tracking_status: order.tracking_status,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        use MarketplaceError::*;
        match self {
            InvalidInput { .. } |
            ProductUnavailable(_) |
            SelfPurchaseForbidden |
            SelfAddForbidden(_) |
            ListingQuotaExceeded { .. } => ErrorKind::Validation,
            ProductNotFound(_) |
            OrderNotFound(_) |
            CardNotFound(_) |
            UserNotFound(_) |
            TierNotFound(_) |
            ItemNotFound { .. } |
            NotificationNotFound(_) => ErrorKind::NotFound,
            Forbidden(_) => ErrorKind::Forbidden,
            InvalidTransition { .. } => ErrorKind::InvalidTransition,
            DuplicateItem { .. } | AmbiguousPaymentSource(_) | ProductInUse(_) => ErrorKind::Conflict,
            OrderCreationFailed | DatabaseError(_) => ErrorKind::DependencyFailure,
        }
    }
}

impl From<sqlx::Error> for MarketplaceError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}
