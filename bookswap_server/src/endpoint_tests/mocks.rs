use bookswap_engine::{
    db_types::{
        Card,
        CardType,
        ListItem,
        ListKind,
        Money,
        NewCard,
        NewNotification,
        NewProduct,
        NewUser,
        Notification,
        NotificationType,
        Product,
        ProductStatus,
        ProductUpdate,
        Tier,
        User,
    },
    listing_objects::ProductQueryFilter,
    traits::{
        AccountManagement,
        CardManagement,
        ItemListManagement,
        ListingManagement,
        MarketplaceError,
        NotificationManagement,
    },
};
use chrono::Utc;
use mockall::mock;

mock! {
    pub Accounts {}
    impl AccountManagement for Accounts {
        async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, MarketplaceError>;
        async fn fetch_tier(&self, tier_id: i64) -> Result<Option<Tier>, MarketplaceError>;
        async fn fetch_tiers(&self) -> Result<Vec<Tier>, MarketplaceError>;
        async fn insert_user(&self, user: NewUser) -> Result<User, MarketplaceError>;
        async fn update_user_tier(&self, user_id: i64, tier_id: i64) -> Result<User, MarketplaceError>;
    }
}

mock! {
    pub Listings {}
    impl AccountManagement for Listings {
        async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, MarketplaceError>;
        async fn fetch_tier(&self, tier_id: i64) -> Result<Option<Tier>, MarketplaceError>;
        async fn fetch_tiers(&self) -> Result<Vec<Tier>, MarketplaceError>;
        async fn insert_user(&self, user: NewUser) -> Result<User, MarketplaceError>;
        async fn update_user_tier(&self, user_id: i64, tier_id: i64) -> Result<User, MarketplaceError>;
    }
    impl ListingManagement for Listings {
        async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, MarketplaceError>;
        async fn search_products(&self, query: ProductQueryFilter) -> Result<Vec<Product>, MarketplaceError>;
        async fn count_active_listings(&self, seller_id: i64) -> Result<i64, MarketplaceError>;
        async fn insert_product_within_quota(&self, seller_id: i64, product: NewProduct, tier: &Tier) -> Result<Product, MarketplaceError>;
        async fn update_product(&self, product_id: i64, update: ProductUpdate) -> Result<Product, MarketplaceError>;
        async fn delete_product(&self, product_id: i64) -> Result<(), MarketplaceError>;
    }
}

mock! {
    pub ItemLists {}
    impl ItemListManagement for ItemLists {
        async fn insert_item(&self, kind: ListKind, user_id: i64, product_id: i64) -> Result<ListItem, MarketplaceError>;
        async fn fetch_item(&self, kind: ListKind, user_id: i64, product_id: i64) -> Result<Option<ListItem>, MarketplaceError>;
        async fn fetch_items(&self, kind: ListKind, user_id: i64) -> Result<Vec<ListItem>, MarketplaceError>;
        async fn remove_item(&self, kind: ListKind, user_id: i64, product_id: i64) -> Result<bool, MarketplaceError>;
        async fn clear_items(&self, kind: ListKind, user_id: i64) -> Result<u64, MarketplaceError>;
        async fn count_items(&self, kind: ListKind, user_id: i64) -> Result<i64, MarketplaceError>;
    }
    impl ListingManagement for ItemLists {
        async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, MarketplaceError>;
        async fn search_products(&self, query: ProductQueryFilter) -> Result<Vec<Product>, MarketplaceError>;
        async fn count_active_listings(&self, seller_id: i64) -> Result<i64, MarketplaceError>;
        async fn insert_product_within_quota(&self, seller_id: i64, product: NewProduct, tier: &Tier) -> Result<Product, MarketplaceError>;
        async fn update_product(&self, product_id: i64, update: ProductUpdate) -> Result<Product, MarketplaceError>;
        async fn delete_product(&self, product_id: i64) -> Result<(), MarketplaceError>;
    }
}

mock! {
    pub Cards {}
    impl CardManagement for Cards {
        async fn fetch_cards_for_user(&self, user_id: i64) -> Result<Vec<Card>, MarketplaceError>;
        async fn fetch_card(&self, card_id: i64) -> Result<Option<Card>, MarketplaceError>;
        async fn insert_card(&self, card: NewCard) -> Result<Card, MarketplaceError>;
        async fn delete_card(&self, user_id: i64, card_id: i64) -> Result<(), MarketplaceError>;
        async fn set_default_card(&self, user_id: i64, card_id: i64) -> Result<Card, MarketplaceError>;
    }
}

mock! {
    pub Notifications {}
    impl NotificationManagement for Notifications {
        async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, MarketplaceError>;
        async fn fetch_notifications(&self, user_id: i64, unread_only: bool) -> Result<Vec<Notification>, MarketplaceError>;
        async fn count_unread_notifications(&self, user_id: i64) -> Result<i64, MarketplaceError>;
        async fn mark_notification_read(&self, user_id: i64, notification_id: i64) -> Result<Option<Notification>, MarketplaceError>;
        async fn mark_all_notifications_read(&self, user_id: i64) -> Result<u64, MarketplaceError>;
        async fn delete_notification(&self, user_id: i64, notification_id: i64) -> Result<bool, MarketplaceError>;
    }
}

//------------------------------------------   Fixtures   ------------------------------------------------

pub fn tier(id: i64, name: &str, max_listings: i64) -> Tier {
    Tier { id, name: name.to_string(), max_listings, featured_listings: false, priority_support: false }
}

pub fn user(id: i64, tier_id: i64) -> User {
    User {
        id,
        name: format!("User {id}"),
        email: format!("user{id}@campus.example"),
        tier_id,
        created_at: Utc::now(),
    }
}

pub fn product(id: i64, seller_id: i64) -> Product {
    let now = Utc::now();
    Product {
        id,
        seller_id,
        name: "Principles of Mathematical Analysis".to_string(),
        author: "Walter Rudin".to_string(),
        description: "Some pencil notes in chapter 3".to_string(),
        price: Money::from_cents(4200),
        category_id: None,
        state_id: None,
        image_url: None,
        year_of_publication: Some(1976),
        status: ProductStatus::Selling,
        buyer_id: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn list_item(id: i64, user_id: i64, product_id: i64) -> ListItem {
    ListItem { id, user_id, product_id, quantity: 1, created_at: Utc::now() }
}

pub fn card(id: i64, user_id: i64, is_default: bool) -> Card {
    Card {
        id,
        user_id,
        card_type: CardType::Visa,
        last_four: "1111".to_string(),
        cardholder_name: "Ada Lovelace".to_string(),
        expiry_month: 12,
        expiry_year: 2099,
        payment_token: "2b7e151628aed2a6abf7158809cf4f3c".to_string(),
        is_default,
        created_at: Utc::now(),
    }
}

pub fn notification(id: i64, user_id: i64, is_read: bool) -> Notification {
    Notification {
        id,
        user_id,
        message: "Your order for \"Calculus\" has shipped.".to_string(),
        notification_type: NotificationType::OrderShipped,
        order_id: Some(3),
        is_read,
        created_at: Utc::now(),
    }
}
