use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db_types::Card,
    helpers::CardDetails,
    traits::{CardManagement, MarketplaceError},
};

/// Saved payment cards. Only the card type, last four digits, expiry and cardholder name are ever stored.
pub struct CardApi<B> {
    db: B,
}

impl<B> Debug for CardApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CardApi")
    }
}

impl<B> CardApi<B>
where B: CardManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// The user's cards, default card first.
    pub async fn cards(&self, user_id: i64) -> Result<Vec<Card>, MarketplaceError> {
        self.db.fetch_cards_for_user(user_id).await
    }

    /// Validates and saves a card. The user's first card becomes their default.
    pub async fn add_card(&self, user_id: i64, details: CardDetails) -> Result<Card, MarketplaceError> {
        details.validate(Utc::now().date_naive())?;
        let card = self.db.insert_card(details.to_new_card(user_id)).await?;
        info!("💳️ User #{user_id} saved a {} card ending in {}", card.card_type, card.last_four);
        Ok(card)
    }

    pub async fn delete_card(&self, user_id: i64, card_id: i64) -> Result<(), MarketplaceError> {
        self.db.delete_card(user_id, card_id).await?;
        info!("💳️ User #{user_id} deleted card #{card_id}");
        Ok(())
    }

    /// Makes the card the user's default. Any other default card loses the flag.
    pub async fn set_default(&self, user_id: i64, card_id: i64) -> Result<Card, MarketplaceError> {
        let card = self.db.set_default_card(user_id, card_id).await?;
        debug!("💳️ Card #{card_id} is now the default card of user #{user_id}");
        Ok(card)
    }
}
