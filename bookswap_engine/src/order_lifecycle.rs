//! The order state machine.
//!
//! An order carries two status fields that only ever move forward:
//!
//! ```text
//!  order_status:    pending ──► accepted ──────────────────────────────────► completed
//!                      └──────► rejected
//!  tracking_status: order_placed ──► preparing ──► shipped ──► in_transit ──► delivered
//! ```
//!
//! Everything in this module is pure. [`plan_transition`] checks the guard for an action and describes the column
//! changes it implies as a [`Transition`]. The storage backend applies a transition conditionally on the state it was
//! planned against, so two racing requests cannot both move the same order.
use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, OrderStatusType, TrackingStatus},
    helpers::new_transaction_id,
    traits::MarketplaceError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderAction {
    Accept,
    Reject,
    Ship,
    MarkInTransit,
    Complete,
}

impl OrderAction {
    /// The party that is allowed to perform this action.
    pub fn actor(&self) -> Party {
        match self {
            Self::Complete => Party::Buyer,
            _ => Party::Seller,
        }
    }
}

impl Display for OrderAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::Ship => "ship",
            Self::MarkInTransit => "mark in transit",
            Self::Complete => "complete",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    Buyer,
    Seller,
}

impl Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buyer => f.write_str("buyer"),
            Self::Seller => f.write_str("seller"),
        }
    }
}

impl Order {
    /// Guards both accepting and rejecting an order.
    pub fn can_be_accepted(&self) -> bool {
        self.order_status == OrderStatusType::Pending
    }

    pub fn can_be_rejected(&self) -> bool {
        self.can_be_accepted()
    }

    pub fn can_be_shipped(&self) -> bool {
        self.order_status == OrderStatusType::Accepted && self.tracking_status == TrackingStatus::Preparing
    }

    pub fn can_be_marked_in_transit(&self) -> bool {
        self.order_status == OrderStatusType::Accepted && self.tracking_status == TrackingStatus::Shipped
    }

    pub fn can_be_marked_delivered(&self) -> bool {
        self.order_status == OrderStatusType::Accepted &&
            matches!(self.tracking_status, TrackingStatus::Shipped | TrackingStatus::InTransit)
    }

    pub fn can_be_completed(&self) -> bool {
        self.order_status == OrderStatusType::Accepted && self.tracking_status == TrackingStatus::Delivered
    }

    pub fn is_final(&self) -> bool {
        matches!(self.order_status, OrderStatusType::Rejected | OrderStatusType::Completed | OrderStatusType::Cancelled)
    }

    /// Which side of the order `user_id` is on, if any.
    pub fn party_of(&self, user_id: i64) -> Option<Party> {
        if user_id == self.buyer_id {
            Some(Party::Buyer)
        } else if user_id == self.seller_id {
            Some(Party::Seller)
        } else {
            None
        }
    }

    /// The user on the other side of the order from `party`.
    pub fn counterparty_of(&self, party: Party) -> i64 {
        match party {
            Party::Buyer => self.seller_id,
            Party::Seller => self.buyer_id,
        }
    }
}

/// What happens to the order's payment as part of a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentSettlement {
    Completed { transaction_id: String, paid_at: DateTime<Utc> },
    Failed,
}

/// The column changes for one state transition, together with the state they were planned against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub order_id: i64,
    pub product_id: i64,
    pub buyer_id: i64,
    pub action: OrderAction,
    pub from_status: OrderStatusType,
    pub from_tracking: TrackingStatus,
    pub to_status: OrderStatusType,
    pub to_tracking: TrackingStatus,
    pub accepted_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub settlement: Option<PaymentSettlement>,
}

impl Transition {
    fn unchanged(order: &Order, action: OrderAction) -> Self {
        Self {
            order_id: order.id,
            product_id: order.product_id,
            buyer_id: order.buyer_id,
            action,
            from_status: order.order_status,
            from_tracking: order.tracking_status,
            to_status: order.order_status,
            to_tracking: order.tracking_status,
            accepted_at: None,
            shipped_at: None,
            delivered_at: None,
            settlement: None,
        }
    }

    /// Completing an order also sells the product to the buyer.
    pub fn sells_product(&self) -> bool {
        self.to_status == OrderStatusType::Completed
    }
}

/// Checks that `actor_id` is the party allowed to perform `action` on `order`.
///
/// This is checked before the state guard, so a stranger poking at an order learns nothing about its state.
pub fn authorize(order: &Order, actor_id: i64, action: OrderAction) -> Result<(), MarketplaceError> {
    let required = action.actor();
    match order.party_of(actor_id) {
        Some(party) if party == required => Ok(()),
        Some(party) => Err(MarketplaceError::Forbidden(format!(
            "Only the {required} may {action} order #{}. You are the {party}.",
            order.id
        ))),
        None => Err(MarketplaceError::Forbidden(format!("You are not a party to order #{}", order.id))),
    }
}

/// Checks the guard for `action` against the current state of `order`, and returns the changes it implies.
///
/// `complete` folds in the delivery step: an order that is still shipped or in transit is first marked delivered
/// (stamping `delivered_at`), and the completion guard is then checked against that state.
pub fn plan_transition(order: &Order, action: OrderAction, now: DateTime<Utc>) -> Result<Transition, MarketplaceError> {
    let mut t = Transition::unchanged(order, action);
    match action {
        OrderAction::Accept => {
            if !order.can_be_accepted() {
                return Err(MarketplaceError::invalid_transition(order, action));
            }
            t.to_status = OrderStatusType::Accepted;
            t.to_tracking = TrackingStatus::Preparing;
            t.accepted_at = Some(now);
        },
        OrderAction::Reject => {
            if !order.can_be_rejected() {
                return Err(MarketplaceError::invalid_transition(order, action));
            }
            t.to_status = OrderStatusType::Rejected;
            t.settlement = Some(PaymentSettlement::Failed);
        },
        OrderAction::Ship => {
            if !order.can_be_shipped() {
                return Err(MarketplaceError::invalid_transition(order, action));
            }
            t.to_tracking = TrackingStatus::Shipped;
            t.shipped_at = Some(now);
        },
        OrderAction::MarkInTransit => {
            if !order.can_be_marked_in_transit() {
                return Err(MarketplaceError::invalid_transition(order, action));
            }
            t.to_tracking = TrackingStatus::InTransit;
        },
        OrderAction::Complete => {
            let mut staged = order.clone();
            if staged.can_be_marked_delivered() {
                staged.tracking_status = TrackingStatus::Delivered;
                t.delivered_at = Some(now);
            }
            if !staged.can_be_completed() {
                return Err(MarketplaceError::invalid_transition(order, action));
            }
            t.to_status = OrderStatusType::Completed;
            t.to_tracking = TrackingStatus::Delivered;
            t.settlement =
                Some(PaymentSettlement::Completed { transaction_id: new_transaction_id(now), paid_at: now });
        },
    }
    Ok(t)
}
