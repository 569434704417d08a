use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Card, NewCard},
    traits::MarketplaceError,
};

/// Saves a card. If the user has no cards yet, it becomes their default.
pub async fn insert_card(card: NewCard, conn: &mut SqliteConnection) -> Result<Card, sqlx::Error> {
    let card: Card = sqlx::query_as(
        r#"
            INSERT INTO cards (
                user_id,
                card_type,
                last_four,
                cardholder_name,
                expiry_month,
                expiry_year,
                payment_token,
                is_default
            ) VALUES (?, ?, ?, ?, ?, ?, ?, NOT EXISTS (SELECT 1 FROM cards WHERE user_id = ?))
            RETURNING *;
        "#,
    )
    .bind(card.user_id)
    .bind(card.card_type)
    .bind(card.last_four)
    .bind(card.cardholder_name)
    .bind(card.expiry_month)
    .bind(card.expiry_year)
    .bind(card.payment_token)
    .bind(card.user_id)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Card #{} ({} ending {}) saved for user #{}", card.id, card.card_type, card.last_four, card.user_id);
    Ok(card)
}

pub async fn fetch_card(card_id: i64, conn: &mut SqliteConnection) -> Result<Option<Card>, sqlx::Error> {
    let card = sqlx::query_as("SELECT * FROM cards WHERE id = ?").bind(card_id).fetch_optional(conn).await?;
    Ok(card)
}

pub async fn fetch_card_for_user(
    user_id: i64,
    card_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Card>, sqlx::Error> {
    let card = sqlx::query_as("SELECT * FROM cards WHERE id = ? AND user_id = ?")
        .bind(card_id)
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(card)
}

pub async fn fetch_cards_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Card>, sqlx::Error> {
    let cards = sqlx::query_as("SELECT * FROM cards WHERE user_id = ? ORDER BY is_default DESC, id DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(cards)
}

/// Deletes the user's card. If it was the default, the most recently added remaining card takes over. Run this in a
/// transaction so the user is never left without a default while they still have cards.
pub async fn delete_card(user_id: i64, card_id: i64, conn: &mut SqliteConnection) -> Result<(), MarketplaceError> {
    let card =
        fetch_card_for_user(user_id, card_id, &mut *conn).await?.ok_or(MarketplaceError::CardNotFound(card_id))?;
    sqlx::query("DELETE FROM cards WHERE id = ?").bind(card_id).execute(&mut *conn).await?;
    if card.is_default {
        let next = sqlx::query(
            r#"
                UPDATE cards SET is_default = 1
                WHERE id = (SELECT id FROM cards WHERE user_id = ? ORDER BY id DESC LIMIT 1)
            "#,
        )
        .bind(user_id)
        .execute(conn)
        .await?;
        let reassigned = next.rows_affected() > 0;
        debug!("🗃️ Default card #{card_id} deleted. Default reassigned to another card: {reassigned}");
    } else {
        debug!("🗃️ Card #{card_id} deleted");
    }
    Ok(())
}

/// Makes `card_id` the user's only default card. Run this in a transaction: the old default is cleared before the new
/// one is set, so the single-default index never sees two defaults at once.
pub async fn set_default_card(
    user_id: i64,
    card_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Card, MarketplaceError> {
    fetch_card_for_user(user_id, card_id, &mut *conn).await?.ok_or(MarketplaceError::CardNotFound(card_id))?;
    sqlx::query("UPDATE cards SET is_default = 0 WHERE user_id = ? AND is_default = 1 AND id <> ?")
        .bind(user_id)
        .bind(card_id)
        .execute(&mut *conn)
        .await?;
    let card = sqlx::query_as("UPDATE cards SET is_default = 1 WHERE id = ? AND user_id = ? RETURNING *")
        .bind(card_id)
        .bind(user_id)
        .fetch_one(conn)
        .await?;
    Ok(card)
}
