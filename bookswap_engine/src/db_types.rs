//! Row types and status enums shared by the marketplace APIs and the storage backends.
//!
//! Every enum here is stored as a lower snake-case `TEXT` column, and serialised the same way over JSON.
use std::{fmt::Display, str::FromStr};

pub use bsw_common::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(pub String);

/// Implements `as_str`, `Display` and `FromStr` for a fieldless enum using the given string labels.
macro_rules! labelled_enum {
    ($name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok(Self::$variant),)+
                    _ => Err(ConversionError(format!("Invalid {}: {s}", stringify!($name)))),
                }
            }
        }
    };
}

//--------------------------------------        Tier         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tier {
    pub id: i64,
    pub name: String,
    /// The maximum number of listings a seller on this tier may have in the `selling` state. Zero means the tier
    /// cannot sell at all.
    pub max_listings: i64,
    pub featured_listings: bool,
    pub priority_support: bool,
}

//--------------------------------------        User         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub tier_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    /// Defaults to the `Buyer` tier when absent.
    #[serde(default)]
    pub tier_id: Option<i64>,
}

impl NewUser {
    pub fn new<S: Into<String>>(name: S, email: S) -> Self {
        Self { name: name.into(), email: email.into(), tier_id: None }
    }

    pub fn with_tier(mut self, tier_id: i64) -> Self {
        self.tier_id = Some(tier_id);
        self
    }
}

/// The public face of a user, as embedded in order details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self { id: user.id, name: user.name }
    }
}

//--------------------------------------       Product       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ProductStatus {
    Selling,
    Sold,
}

labelled_enum!(ProductStatus { Selling => "selling", Sold => "sold" });

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub seller_id: i64,
    pub name: String,
    pub author: String,
    pub description: String,
    pub price: Money,
    pub category_id: Option<i64>,
    /// The condition of the book (new, like new, worn, ...). The lookup table lives outside the marketplace core.
    pub state_id: Option<i64>,
    pub image_url: Option<String>,
    pub year_of_publication: Option<i32>,
    pub status: ProductStatus,
    /// Only set once the product has been sold.
    pub buyer_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn is_selling(&self) -> bool {
        self.status == ProductStatus::Selling
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewProduct {
    pub name: String,
    pub author: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub state_id: Option<i64>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub year_of_publication: Option<i32>,
}

impl NewProduct {
    pub fn new<S: Into<String>>(name: S, author: S, price: Money) -> Self {
        Self { name: name.into(), author: author.into(), price, ..Default::default() }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }
}

/// The fields of a listing that a seller is allowed to change. Anything else in an update request is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub category_id: Option<i64>,
    pub state_id: Option<i64>,
    pub image_url: Option<String>,
    pub year_of_publication: Option<i32>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() &&
            self.author.is_none() &&
            self.description.is_none() &&
            self.price.is_none() &&
            self.category_id.is_none() &&
            self.state_id.is_none() &&
            self.image_url.is_none() &&
            self.year_of_publication.is_none()
    }

    pub fn with_price(mut self, price: Money) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// Placed by the buyer, waiting for the seller to accept or reject it.
    Pending,
    Accepted,
    Rejected,
    Completed,
    /// Kept for compatibility with existing data. No marketplace operation produces it.
    Cancelled,
}

labelled_enum!(OrderStatusType {
    Pending => "pending",
    Accepted => "accepted",
    Rejected => "rejected",
    Completed => "completed",
    Cancelled => "cancelled",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum TrackingStatus {
    OrderPlaced,
    Preparing,
    Shipped,
    InTransit,
    Delivered,
}

labelled_enum!(TrackingStatus {
    OrderPlaced => "order_placed",
    Preparing => "preparing",
    Shipped => "shipped",
    InTransit => "in_transit",
    Delivered => "delivered",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub product_id: i64,
    /// The product price at the time the order was placed.
    pub total_amount: Money,
    pub order_status: OrderStatusType,
    pub tracking_status: TrackingStatus,
    pub shipping_address: String,
    pub notes: Option<String>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub buyer_id: i64,
    pub seller_id: i64,
    pub product_id: i64,
    pub total_amount: Money,
    pub shipping_address: String,
    pub notes: Option<String>,
}

//--------------------------------------       Payment       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    CashOnDelivery,
}

labelled_enum!(PaymentMethod {
    CreditCard => "credit_card",
    DebitCard => "debit_card",
    CashOnDelivery => "cash_on_delivery",
});

impl PaymentMethod {
    pub fn requires_card(&self) -> bool {
        matches!(self, Self::CreditCard | Self::DebitCard)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

labelled_enum!(PaymentStatus { Pending => "pending", Completed => "completed", Failed => "failed" });

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub card_id: Option<i64>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub payment_amount: Money,
    pub transaction_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Where the card for a new payment comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentCard {
    /// Cash on delivery, or card details that are used once and not kept.
    None,
    /// One of the buyer's saved cards.
    Saved(i64),
    /// Card details that should be saved to the buyer's account as part of the checkout.
    SaveNew(NewCard),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    pub payment_method: PaymentMethod,
    pub payment_amount: Money,
    pub card: PaymentCard,
}

//--------------------------------------        Card         ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum CardType {
    Visa,
    Mastercard,
    Amex,
    Discover,
    Unknown,
}

labelled_enum!(CardType {
    Visa => "visa",
    Mastercard => "mastercard",
    Amex => "amex",
    Discover => "discover",
    Unknown => "unknown",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Card {
    pub id: i64,
    pub user_id: i64,
    pub card_type: CardType,
    pub last_four: String,
    pub cardholder_name: String,
    pub expiry_month: i32,
    pub expiry_year: i32,
    #[serde(skip_serializing)]
    pub payment_token: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCard {
    pub user_id: i64,
    pub card_type: CardType,
    pub last_four: String,
    pub cardholder_name: String,
    pub expiry_month: i32,
    pub expiry_year: i32,
    pub payment_token: String,
}

//--------------------------------------    Cart/Wishlist    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Cart,
    Wishlist,
}

labelled_enum!(ListKind { Cart => "cart", Wishlist => "wishlist" });

impl ListKind {
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Cart => "cart_items",
            Self::Wishlist => "wishlist_items",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ListItem {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    /// Always 1
    #[serde(default = "one")]
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

fn one() -> i64 {
    1
}

//--------------------------------------    Notification     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum NotificationType {
    OrderCreated,
    OrderAccepted,
    OrderRejected,
    OrderShipped,
    OrderInTransit,
    OrderCompleted,
    Account,
}

labelled_enum!(NotificationType {
    OrderCreated => "order_created",
    OrderAccepted => "order_accepted",
    OrderRejected => "order_rejected",
    OrderShipped => "order_shipped",
    OrderInTransit => "order_in_transit",
    OrderCompleted => "order_completed",
    Account => "account",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub message: String,
    pub notification_type: NotificationType,
    pub order_id: Option<i64>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: i64,
    pub message: String,
    pub notification_type: NotificationType,
    pub order_id: Option<i64>,
}
