//! `SqliteDatabase` is a concrete implementation of a marketplace backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::{begin_write, cards, db_url, item_lists, new_pool, notifications, orders, payments, products, users};
use crate::{
    db_types::{
        Card,
        ListItem,
        ListKind,
        NewCard,
        NewNotification,
        NewOrder,
        NewPayment,
        NewProduct,
        NewUser,
        Notification,
        Order,
        Payment,
        PaymentCard,
        Product,
        ProductUpdate,
        Tier,
        User,
    },
    market_api::{listing_objects::ProductQueryFilter, order_objects::OrderQueryFilter},
    order_lifecycle::Transition,
    tier_policy::can_create_listing,
    traits::{
        AccountManagement,
        CardManagement,
        ItemListManagement,
        ListingManagement,
        MarketplaceDatabase,
        MarketplaceError,
        NotificationManagement,
        OrderManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `BSW_DATABASE_URL`, or the default.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date with the migrations embedded in this crate.
    pub async fn migrate(&self) -> Result<(), MarketplaceError> {
        sqlx::migrate!("./src/db/sqlite/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| MarketplaceError::DatabaseError(format!("Migration failed. {e}")))?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Stores a notification. This is an inherent method so that the notification hook can call it from a spawned task.
    pub async fn record_notification(&self, notification: NewNotification) -> Result<Notification, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let notification = notifications::insert_notification(notification, &mut tx).await?;
        tx.commit().await?;
        Ok(notification)
    }
}

impl AccountManagement for SqliteDatabase {
    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user(user_id, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_tier(&self, tier_id: i64) -> Result<Option<Tier>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let tier = users::fetch_tier(tier_id, &mut conn).await?;
        Ok(tier)
    }

    async fn fetch_tiers(&self) -> Result<Vec<Tier>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let tiers = users::fetch_tiers(&mut conn).await?;
        Ok(tiers)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let user = users::insert_user(user, &mut tx).await?;
        tx.commit().await?;
        Ok(user)
    }

    async fn update_user_tier(&self, user_id: i64, tier_id: i64) -> Result<User, MarketplaceError> {
        let mut tx = begin_write(&self.pool).await?;
        if users::fetch_tier(tier_id, &mut tx).await?.is_none() {
            return Err(MarketplaceError::TierNotFound(tier_id));
        }
        let user =
            users::update_user_tier(user_id, tier_id, &mut tx).await?.ok_or(MarketplaceError::UserNotFound(user_id))?;
        tx.commit().await?;
        Ok(user)
    }
}

impl ListingManagement for SqliteDatabase {
    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn search_products(&self, query: ProductQueryFilter) -> Result<Vec<Product>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let products = products::search_products(query, &mut conn).await?;
        Ok(products)
    }

    async fn count_active_listings(&self, seller_id: i64) -> Result<i64, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let count = products::count_active_listings(seller_id, &mut conn).await?;
        Ok(count)
    }

    async fn insert_product_within_quota(
        &self,
        seller_id: i64,
        product: NewProduct,
        tier: &Tier,
    ) -> Result<Product, MarketplaceError> {
        let mut tx = begin_write(&self.pool).await?;
        let current_listings = products::count_active_listings(seller_id, &mut tx).await?;
        if !can_create_listing(tier, current_listings) {
            debug!(
                "🗃️ Seller #{seller_id} is at {current_listings}/{} listings on the {} tier",
                tier.max_listings, tier.name
            );
            return Err(MarketplaceError::ListingQuotaExceeded { current_listings, max_listings: tier.max_listings });
        }
        let product = products::insert_product(seller_id, product, &mut tx).await?;
        tx.commit().await?;
        Ok(product)
    }

    async fn update_product(&self, product_id: i64, update: ProductUpdate) -> Result<Product, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let product = products::update_product(product_id, update, &mut tx)
            .await?
            .ok_or(MarketplaceError::ProductNotFound(product_id))?;
        tx.commit().await?;
        Ok(product)
    }

    async fn delete_product(&self, product_id: i64) -> Result<(), MarketplaceError> {
        let mut tx = begin_write(&self.pool).await?;
        products::delete_product(product_id, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order_with_payment(
        &self,
        order: NewOrder,
        payment: NewPayment,
    ) -> Result<(Order, Payment), MarketplaceError> {
        let mut tx = begin_write(&self.pool).await?;
        let card_id = match &payment.card {
            PaymentCard::None => None,
            PaymentCard::Saved(id) => Some(*id),
            PaymentCard::SaveNew(card) => Some(cards::insert_card(card.clone(), &mut tx).await?.id),
        };
        let order = orders::insert_order(order, &mut tx).await?;
        let payment = payments::insert_payment(order.id, card_id, &payment, &mut tx).await?;
        item_lists::remove_item(ListKind::Cart, order.buyer_id, order.product_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{} and payment #{} committed", order.id, payment.id);
        Ok((order, payment))
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_payment_for_order(&self, order_id: i64) -> Result<Option<Payment>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment_for_order(order_id, &mut conn).await?;
        Ok(payment)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn apply_transition(&self, transition: &Transition) -> Result<Order, MarketplaceError> {
        let order_id = transition.order_id;
        let mut tx = begin_write(&self.pool).await?;
        if !orders::apply_status_change(transition, &mut tx).await? {
            let current =
                orders::fetch_order(order_id, &mut tx).await?.ok_or(MarketplaceError::OrderNotFound(order_id))?;
            warn!(
                "🗃️ Order #{order_id} moved to {} ({}) before it could {}",
                current.order_status, current.tracking_status, transition.action
            );
            return Err(MarketplaceError::invalid_transition(&current, transition.action));
        }
        if let Some(settlement) = &transition.settlement {
            payments::settle_payment(order_id, settlement, &mut tx).await?;
        }
        if transition.sells_product() {
            let product_id = transition.product_id;
            if !products::mark_sold(product_id, transition.buyer_id, &mut tx).await? {
                warn!("🗃️ Product #{product_id} was no longer for sale when order #{order_id} completed");
            }
            item_lists::remove_product_everywhere(product_id, &mut tx).await?;
        }
        let order = orders::fetch_order(order_id, &mut tx).await?.ok_or(MarketplaceError::OrderNotFound(order_id))?;
        tx.commit().await?;
        Ok(order)
    }
}

impl CardManagement for SqliteDatabase {
    async fn fetch_cards_for_user(&self, user_id: i64) -> Result<Vec<Card>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let cards = cards::fetch_cards_for_user(user_id, &mut conn).await?;
        Ok(cards)
    }

    async fn fetch_card(&self, card_id: i64) -> Result<Option<Card>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let card = cards::fetch_card(card_id, &mut conn).await?;
        Ok(card)
    }

    async fn insert_card(&self, card: NewCard) -> Result<Card, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let card = cards::insert_card(card, &mut tx).await?;
        tx.commit().await?;
        Ok(card)
    }

    async fn delete_card(&self, user_id: i64, card_id: i64) -> Result<(), MarketplaceError> {
        let mut tx = begin_write(&self.pool).await?;
        cards::delete_card(user_id, card_id, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn set_default_card(&self, user_id: i64, card_id: i64) -> Result<Card, MarketplaceError> {
        let mut tx = begin_write(&self.pool).await?;
        let card = cards::set_default_card(user_id, card_id, &mut tx).await?;
        tx.commit().await?;
        Ok(card)
    }
}

impl ItemListManagement for SqliteDatabase {
    async fn insert_item(&self, kind: ListKind, user_id: i64, product_id: i64) -> Result<ListItem, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let item = item_lists::insert_item(kind, user_id, product_id, &mut tx).await?;
        tx.commit().await?;
        Ok(item)
    }

    async fn fetch_item(
        &self,
        kind: ListKind,
        user_id: i64,
        product_id: i64,
    ) -> Result<Option<ListItem>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let item = item_lists::fetch_item(kind, user_id, product_id, &mut conn).await?;
        Ok(item)
    }

    async fn fetch_items(&self, kind: ListKind, user_id: i64) -> Result<Vec<ListItem>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let items = item_lists::fetch_items(kind, user_id, &mut conn).await?;
        Ok(items)
    }

    async fn remove_item(&self, kind: ListKind, user_id: i64, product_id: i64) -> Result<bool, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let removed = item_lists::remove_item(kind, user_id, product_id, &mut tx).await?;
        tx.commit().await?;
        Ok(removed)
    }

    async fn clear_items(&self, kind: ListKind, user_id: i64) -> Result<u64, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let removed = item_lists::clear_items(kind, user_id, &mut tx).await?;
        tx.commit().await?;
        Ok(removed)
    }

    async fn count_items(&self, kind: ListKind, user_id: i64) -> Result<i64, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let count = item_lists::count_items(kind, user_id, &mut conn).await?;
        Ok(count)
    }
}

impl NotificationManagement for SqliteDatabase {
    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, MarketplaceError> {
        self.record_notification(notification).await
    }

    async fn fetch_notifications(
        &self,
        user_id: i64,
        unread_only: bool,
    ) -> Result<Vec<Notification>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let notifications = notifications::fetch_notifications(user_id, unread_only, &mut conn).await?;
        Ok(notifications)
    }

    async fn count_unread_notifications(&self, user_id: i64) -> Result<i64, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let count = notifications::count_unread(user_id, &mut conn).await?;
        Ok(count)
    }

    async fn mark_notification_read(
        &self,
        user_id: i64,
        notification_id: i64,
    ) -> Result<Option<Notification>, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let notification = notifications::mark_read(user_id, notification_id, &mut tx).await?;
        tx.commit().await?;
        Ok(notification)
    }

    async fn mark_all_notifications_read(&self, user_id: i64) -> Result<u64, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let count = notifications::mark_all_read(user_id, &mut tx).await?;
        tx.commit().await?;
        Ok(count)
    }

    async fn delete_notification(&self, user_id: i64, notification_id: i64) -> Result<bool, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let deleted = notifications::delete_notification(user_id, notification_id, &mut tx).await?;
        tx.commit().await?;
        Ok(deleted)
    }
}

impl MarketplaceDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn close(&mut self) -> Result<(), MarketplaceError> {
        self.pool.close().await;
        Ok(())
    }
}
