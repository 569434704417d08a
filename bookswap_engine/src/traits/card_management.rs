use crate::{
    db_types::{Card, NewCard},
    traits::MarketplaceError,
};

/// A user's saved cards. Each user has at most one default card.
#[allow(async_fn_in_trait)]
pub trait CardManagement {
    /// Fetches the user's cards, default card first.
    async fn fetch_cards_for_user(&self, user_id: i64) -> Result<Vec<Card>, MarketplaceError>;

    async fn fetch_card(&self, card_id: i64) -> Result<Option<Card>, MarketplaceError>;

    /// Saves a card. The user's first card becomes their default.
    async fn insert_card(&self, card: NewCard) -> Result<Card, MarketplaceError>;

    /// Deletes the user's card. If it was the default, the most recently added remaining card becomes the default.
    /// Payments made with the card keep their history but lose the link.
    async fn delete_card(&self, user_id: i64, card_id: i64) -> Result<(), MarketplaceError>;

    /// Makes `card_id` the user's only default card.
    async fn set_default_card(&self, user_id: i64, card_id: i64) -> Result<Card, MarketplaceError>;
}
