use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, OrderStatusType, Payment, PaymentMethod, PaymentStatus, Product, ProductStatus, UserSummary},
    helpers::CardFields,
    order_lifecycle::{Party, PaymentSettlement, Transition},
};

/// A buyer's checkout request for a single product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub product_id: i64,
    pub shipping_address: String,
    pub notes: Option<String>,
    pub payment: PaymentInput,
}

impl NewOrderRequest {
    pub fn new<S: Into<String>>(product_id: i64, shipping_address: S, payment: PaymentInput) -> Self {
        Self { product_id, shipping_address: shipping_address.into(), notes: None, payment }
    }

    pub fn with_notes<S: Into<String>>(mut self, notes: S) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// How the buyer intends to pay.
///
/// Card payments must name exactly one card source: either one of the buyer's saved cards (`card_id`), or a full set
/// of card details. Cash on delivery ignores any card source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInput {
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub card_id: Option<i64>,
    #[serde(default)]
    pub card: CardFields,
    /// Save the card details to the buyer's account. Ignored when paying with a saved card.
    #[serde(default)]
    pub save_card: bool,
}

impl PaymentInput {
    pub fn cash_on_delivery() -> Self {
        Self {
            payment_method: PaymentMethod::CashOnDelivery,
            card_id: None,
            card: CardFields::default(),
            save_card: false,
        }
    }

    pub fn saved_card(payment_method: PaymentMethod, card_id: i64) -> Self {
        Self { payment_method, card_id: Some(card_id), card: CardFields::default(), save_card: false }
    }

    pub fn new_card<C: Into<CardFields>>(payment_method: PaymentMethod, card: C, save_card: bool) -> Self {
        Self { payment_method, card_id: None, card: card.into(), save_card }
    }

    pub fn has_card_source(&self) -> bool {
        self.card_id.is_some() || !self.card.is_empty()
    }
}

/// An order with its product, both parties and its payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub product: Product,
    pub buyer: UserSummary,
    pub seller: UserSummary,
    pub payment: Option<Payment>,
}

impl OrderDetails {
    /// Carries a committed transition over to these details, so that nothing has to be read back once the change is
    /// in the database. `order` is the row as the transition left it.
    pub fn after_transition(mut self, order: Order, transition: &Transition) -> Self {
        if let (Some(payment), Some(settlement)) = (self.payment.as_mut(), &transition.settlement) {
            match settlement {
                PaymentSettlement::Completed { transaction_id, paid_at } => {
                    payment.payment_status = PaymentStatus::Completed;
                    payment.transaction_id = Some(transaction_id.clone());
                    payment.paid_at = Some(*paid_at);
                },
                PaymentSettlement::Failed => payment.payment_status = PaymentStatus::Failed,
            }
        }
        // A product that was already sold keeps its first buyer
        if transition.sells_product() && self.product.is_selling() {
            self.product.status = ProductStatus::Sold;
            self.product.buyer_id = Some(transition.buyer_id);
            self.product.updated_at = order.updated_at;
        }
        self.order = order;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub buyer_id: Option<i64>,
    pub seller_id: Option<i64>,
    /// Matches orders where this user is either the buyer or the seller
    pub party_id: Option<i64>,
    pub product_id: Option<i64>,
    pub status: Option<Vec<OrderStatusType>>,
}

impl OrderQueryFilter {
    /// Orders the user takes part in, optionally only on one side.
    pub fn for_user(user_id: i64, role: Option<Party>) -> Self {
        match role {
            Some(Party::Buyer) => Self::default().with_buyer_id(user_id),
            Some(Party::Seller) => Self::default().with_seller_id(user_id),
            None => Self { party_id: Some(user_id), ..Default::default() },
        }
    }

    pub fn with_buyer_id(mut self, buyer_id: i64) -> Self {
        self.buyer_id = Some(buyer_id);
        self
    }

    pub fn with_seller_id(mut self, seller_id: i64) -> Self {
        self.seller_id = Some(seller_id);
        self
    }

    pub fn with_product_id(mut self, product_id: i64) -> Self {
        self.product_id = Some(product_id);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.buyer_id.is_none() &&
            self.seller_id.is_none() &&
            self.party_id.is_none() &&
            self.product_id.is_none() &&
            self.status.as_ref().map(|s| s.is_empty()).unwrap_or(true)
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "No filters.");
        }
        if let Some(id) = self.buyer_id {
            write!(f, "buyer: {id}. ")?;
        }
        if let Some(id) = self.seller_id {
            write!(f, "seller: {id}. ")?;
        }
        if let Some(id) = self.party_id {
            write!(f, "party: {id}. ")?;
        }
        if let Some(id) = self.product_id {
            write!(f, "product: {id}. ")?;
        }
        if let Some(statuses) = self.status.as_ref().filter(|s| !s.is_empty()) {
            let statuses = statuses.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(",");
            write!(f, "status: {statuses}. ")?;
        }
        Ok(())
    }
}
