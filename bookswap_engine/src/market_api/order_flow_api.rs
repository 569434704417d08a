use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db_types::{NewOrder, NewPayment, Order, OrderStatusType, PaymentCard},
    events::{EventProducers, OrderEvent, OrderEventKind},
    market_api::order_objects::{NewOrderRequest, OrderDetails, OrderQueryFilter, PaymentInput},
    order_lifecycle::{authorize, plan_transition, OrderAction, Party},
    traits::{MarketplaceDatabase, MarketplaceError},
};

/// `OrderFlowApi` is the primary API for checking out and for moving orders through their lifecycle.
///
/// Every successful operation publishes one [`OrderEvent`] after its database transaction has committed.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: MarketplaceDatabase
{
    /// Places an order for a single product.
    ///
    /// The checks run in a fixed order and the first failure wins:
    /// 1. the product exists and is still for sale,
    /// 2. the buyer is not the seller,
    /// 3. the shipping address is not blank,
    /// 4. a card payment names exactly one card source,
    /// 5. a saved card belongs to the buyer, and new card details are valid.
    ///
    /// The order, its payment row and any newly saved card are then written in one transaction, and the product
    /// leaves the buyer's cart. If that transaction fails, nothing is written and `OrderCreationFailed` is returned.
    /// Everything the response needs is read beforehand, so a committed order is always reported as placed.
    pub async fn create_order(
        &self,
        buyer_id: i64,
        request: NewOrderRequest,
    ) -> Result<OrderDetails, MarketplaceError> {
        let product_id = request.product_id;
        let product = match self.db.fetch_product(product_id).await? {
            Some(p) if p.is_selling() => p,
            _ => return Err(MarketplaceError::ProductUnavailable(product_id)),
        };
        if product.seller_id == buyer_id {
            return Err(MarketplaceError::SelfPurchaseForbidden);
        }
        let shipping_address = request.shipping_address.trim().to_string();
        if shipping_address.is_empty() {
            return Err(MarketplaceError::invalid_input("shipping_address", "Shipping address is required"));
        }
        let card = self.resolve_payment_card(buyer_id, &request.payment).await?;
        let order = NewOrder {
            buyer_id,
            seller_id: product.seller_id,
            product_id,
            total_amount: product.price,
            shipping_address,
            notes: request.notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        };
        let payment =
            NewPayment { payment_method: request.payment.payment_method, payment_amount: product.price, card };
        let buyer = self.db.fetch_user(buyer_id).await?.ok_or(MarketplaceError::UserNotFound(buyer_id))?;
        let seller =
            self.db.fetch_user(product.seller_id).await?.ok_or(MarketplaceError::UserNotFound(product.seller_id))?;
        let (order, payment) = self.db.insert_order_with_payment(order, payment).await.map_err(|e| {
            error!("📦️ Could not create an order for product #{product_id} for buyer #{buyer_id}. {e}");
            MarketplaceError::OrderCreationFailed
        })?;
        info!(
            "📦️ Order #{} placed by buyer #{buyer_id} for product #{product_id} ({}, {})",
            order.id, order.total_amount, payment.payment_method
        );
        let event = OrderEvent::new(OrderEventKind::Created, order.clone(), product.name.clone());
        self.producers.publish_order_event(event).await;
        Ok(OrderDetails { order, product, buyer: buyer.into(), seller: seller.into(), payment: Some(payment) })
    }

    async fn resolve_payment_card(
        &self,
        buyer_id: i64,
        payment: &PaymentInput,
    ) -> Result<PaymentCard, MarketplaceError> {
        if !payment.payment_method.requires_card() {
            if payment.has_card_source() {
                warn!("📦️ Buyer #{buyer_id} sent card details with a cash on delivery order. Ignoring them.");
            }
            return Ok(PaymentCard::None);
        }
        match (payment.card_id, payment.card.is_empty()) {
            (Some(_), false) => Err(MarketplaceError::AmbiguousPaymentSource(
                "Pay with either a saved card or new card details, not both".to_string(),
            )),
            (None, true) => Err(MarketplaceError::AmbiguousPaymentSource(
                "Card payments need a saved card or new card details".to_string(),
            )),
            (Some(card_id), true) => match self.db.fetch_card(card_id).await? {
                Some(card) if card.user_id == buyer_id => Ok(PaymentCard::Saved(card_id)),
                _ => Err(MarketplaceError::CardNotFound(card_id)),
            },
            (None, false) => {
                let details = payment.card.complete().ok_or_else(|| {
                    MarketplaceError::AmbiguousPaymentSource(
                        "Card details are incomplete. Provide the number, cardholder name and expiry date".to_string(),
                    )
                })?;
                details.validate(Utc::now().date_naive())?;
                if payment.save_card {
                    Ok(PaymentCard::SaveNew(details.to_new_card(buyer_id)))
                } else {
                    Ok(PaymentCard::None)
                }
            },
        }
    }

    /// The seller accepts a pending order and starts preparing it.
    pub async fn accept_order(&self, seller_id: i64, order_id: i64) -> Result<OrderDetails, MarketplaceError> {
        self.transition(seller_id, order_id, OrderAction::Accept).await
    }

    /// The seller turns down a pending order. The payment is marked as failed.
    pub async fn reject_order(&self, seller_id: i64, order_id: i64) -> Result<OrderDetails, MarketplaceError> {
        self.transition(seller_id, order_id, OrderAction::Reject).await
    }

    pub async fn ship_order(&self, seller_id: i64, order_id: i64) -> Result<OrderDetails, MarketplaceError> {
        self.transition(seller_id, order_id, OrderAction::Ship).await
    }

    pub async fn mark_in_transit(&self, seller_id: i64, order_id: i64) -> Result<OrderDetails, MarketplaceError> {
        self.transition(seller_id, order_id, OrderAction::MarkInTransit).await
    }

    /// The buyer confirms receipt. A shipped or in-transit order is marked delivered on the way. The payment is
    /// completed, the product is sold to the buyer and disappears from every cart and wishlist.
    pub async fn complete_order(&self, buyer_id: i64, order_id: i64) -> Result<OrderDetails, MarketplaceError> {
        self.transition(buyer_id, order_id, OrderAction::Complete).await
    }

    async fn transition(
        &self,
        actor_id: i64,
        order_id: i64,
        action: OrderAction,
    ) -> Result<OrderDetails, MarketplaceError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(MarketplaceError::OrderNotFound(order_id))?;
        authorize(&order, actor_id, action)?;
        let transition = plan_transition(&order, action, Utc::now())?;
        let details = self.expand(order).await?;
        let order = self.db.apply_transition(&transition).await?;
        info!(
            "📦️ Order #{order_id}: {action} by user #{actor_id}. Now {} ({})",
            order.order_status, order.tracking_status
        );
        let details = details.after_transition(order.clone(), &transition);
        let event = OrderEvent::new(action.into(), order, details.product.name.clone());
        self.producers.publish_order_event(event).await;
        Ok(details)
    }

    /// Fetches an order that `user_id` is a party to.
    pub async fn order_for_user(&self, user_id: i64, order_id: i64) -> Result<OrderDetails, MarketplaceError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(MarketplaceError::OrderNotFound(order_id))?;
        if order.party_of(user_id).is_none() {
            return Err(MarketplaceError::Forbidden(format!("You are not a party to order #{order_id}")));
        }
        self.expand(order).await
    }

    /// Fetches the orders `user_id` takes part in, newest first. `role` limits the result to purchases or sales.
    pub async fn orders_for_user(
        &self,
        user_id: i64,
        role: Option<Party>,
        statuses: &[OrderStatusType],
    ) -> Result<Vec<OrderDetails>, MarketplaceError> {
        let mut query = OrderQueryFilter::for_user(user_id, role);
        for status in statuses {
            query = query.with_status(*status);
        }
        trace!("📦️ Fetching orders. {query}");
        let orders = self.db.search_orders(query).await?;
        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            result.push(self.expand(order).await?);
        }
        Ok(result)
    }

    async fn expand(&self, order: Order) -> Result<OrderDetails, MarketplaceError> {
        let product_id = order.product_id;
        let product = self.db.fetch_product(product_id).await?.ok_or(MarketplaceError::ProductNotFound(product_id))?;
        let buyer = self.db.fetch_user(order.buyer_id).await?.ok_or(MarketplaceError::UserNotFound(order.buyer_id))?;
        let seller =
            self.db.fetch_user(order.seller_id).await?.ok_or(MarketplaceError::UserNotFound(order.seller_id))?;
        let payment = self.db.fetch_payment_for_order(order.id).await?;
        Ok(OrderDetails { order, product, buyer: buyer.into(), seller: seller.into(), payment })
    }
}
