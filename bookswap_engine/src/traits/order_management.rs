use crate::{
    db_types::{NewOrder, NewPayment, Order, Payment},
    market_api::order_objects::OrderQueryFilter,
    order_lifecycle::Transition,
    traits::MarketplaceError,
};

/// Orders and their payment rows.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// In a single atomic transaction:
    /// * saves the card in `payment.card` if it is a new card (the user's first card becomes their default),
    /// * inserts the order as `pending` / `order_placed`,
    /// * inserts its `pending` payment row, linked to the card if there is one,
    /// * removes the product from the buyer's cart.
    ///
    /// If any step fails, nothing is written.
    async fn insert_order_with_payment(
        &self,
        order: NewOrder,
        payment: NewPayment,
    ) -> Result<(Order, Payment), MarketplaceError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, MarketplaceError>;

    async fn fetch_payment_for_order(&self, order_id: i64) -> Result<Option<Payment>, MarketplaceError>;

    /// Fetches orders matching the filter, newest first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, MarketplaceError>;

    /// Applies a planned state transition in a single atomic transaction, along with its side effects:
    /// * the payment settlement, if any,
    /// * on completion, marking the product as sold to the buyer and removing it from every cart and wishlist.
    ///
    /// The update only applies if the order is still in the state the transition was planned against. Otherwise
    /// nothing is written and `InvalidTransition` is returned with the order's current state.
    async fn apply_transition(&self, transition: &Transition) -> Result<Order, MarketplaceError>;
}
