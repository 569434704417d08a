//! # Card details
//!
//! The marketplace never stores a card number. When a card is saved, only the card type (derived from the number
//! prefix), the last four digits, the expiry and the cardholder name are kept, along with an opaque payment token.
//! The token is a salted `Blake2b512` hash of the owner id and the number, hex encoded, standing in for the token a
//! real payment processor would hand back.
use std::fmt::Debug;

use blake2::{Blake2b512, Digest};
use chrono::{Datelike, NaiveDate};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{CardType, NewCard},
    traits::MarketplaceError,
};

/// A full set of card details, as entered at checkout or on the cards page.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CardDetails {
    pub card_number: String,
    pub cardholder_name: String,
    pub expiry_month: i32,
    pub expiry_year: i32,
}

impl Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDetails")
            .field("card_number", &"****")
            .field("cardholder_name", &self.cardholder_name)
            .field("expiry_month", &self.expiry_month)
            .field("expiry_year", &self.expiry_year)
            .finish()
    }
}

impl CardDetails {
    pub fn new<S: Into<String>>(card_number: S, cardholder_name: S, expiry_month: i32, expiry_year: i32) -> Self {
        Self { card_number: card_number.into(), cardholder_name: cardholder_name.into(), expiry_month, expiry_year }
    }

    /// The card number with spaces and dashes removed.
    pub fn digits(&self) -> String {
        self.card_number.chars().filter(|c| !matches!(c, ' ' | '-')).collect()
    }

    /// Checks the number (digits only, 12-19 long, valid Luhn checksum), the cardholder name and the expiry date.
    /// A card expires at the end of its expiry month.
    pub fn validate(&self, today: NaiveDate) -> Result<(), MarketplaceError> {
        let digits = self.digits();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(MarketplaceError::invalid_input("card_number", "Card number may only contain digits"));
        }
        if !(12..=19).contains(&digits.len()) {
            return Err(MarketplaceError::invalid_input("card_number", "Card number must be 12 to 19 digits long"));
        }
        if !luhn_checksum_valid(&digits) {
            return Err(MarketplaceError::invalid_input("card_number", "Card number is not valid"));
        }
        if self.cardholder_name.trim().is_empty() {
            return Err(MarketplaceError::invalid_input("cardholder_name", "Cardholder name is required"));
        }
        if !(1..=12).contains(&self.expiry_month) {
            return Err(MarketplaceError::invalid_input("expiry_month", "Expiry month must be between 1 and 12"));
        }
        if (self.expiry_year, self.expiry_month) < (today.year(), today.month() as i32) {
            return Err(MarketplaceError::invalid_input("expiry_year", "Card has expired"));
        }
        Ok(())
    }

    pub fn card_type(&self) -> CardType {
        card_type_for_number(&self.digits())
    }

    /// Builds the storable card record for `user_id`. Call [`CardDetails::validate`] first.
    pub fn to_new_card(&self, user_id: i64) -> NewCard {
        let digits = self.digits();
        let last_four = digits.chars().skip(digits.len().saturating_sub(4)).collect();
        NewCard {
            user_id,
            card_type: card_type_for_number(&digits),
            last_four,
            cardholder_name: self.cardholder_name.trim().to_string(),
            expiry_month: self.expiry_month,
            expiry_year: self.expiry_year,
            payment_token: payment_token(user_id, &digits),
        }
    }
}

/// Card fields as they arrive in a checkout request, where any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFields {
    pub card_number: Option<String>,
    pub cardholder_name: Option<String>,
    pub expiry_month: Option<i32>,
    pub expiry_year: Option<i32>,
}

impl CardFields {
    pub fn is_empty(&self) -> bool {
        self.card_number.is_none() &&
            self.cardholder_name.is_none() &&
            self.expiry_month.is_none() &&
            self.expiry_year.is_none()
    }

    /// Returns the card details if, and only if, every field was supplied.
    pub fn complete(&self) -> Option<CardDetails> {
        Some(CardDetails {
            card_number: self.card_number.clone()?,
            cardholder_name: self.cardholder_name.clone()?,
            expiry_month: self.expiry_month?,
            expiry_year: self.expiry_year?,
        })
    }
}

impl From<CardDetails> for CardFields {
    fn from(card: CardDetails) -> Self {
        Self {
            card_number: Some(card.card_number),
            cardholder_name: Some(card.cardholder_name),
            expiry_month: Some(card.expiry_month),
            expiry_year: Some(card.expiry_year),
        }
    }
}

pub fn luhn_checksum_valid(digits: &str) -> bool {
    let mut sum = 0u32;
    for (i, c) in digits.chars().rev().enumerate() {
        let Some(mut d) = c.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
    }
    !digits.is_empty() && sum % 10 == 0
}

pub fn card_type_for_number(digits: &str) -> CardType {
    let prefix = |n: usize| digits.get(..n).and_then(|p| p.parse::<u32>().ok());
    match (prefix(1), prefix(2), prefix(3), prefix(4)) {
        (Some(4), ..) => CardType::Visa,
        (_, Some(51..=55), ..) | (.., Some(2221..=2720)) => CardType::Mastercard,
        (_, Some(34 | 37), ..) => CardType::Amex,
        (.., Some(6011)) | (_, Some(65), ..) | (_, _, Some(644..=649), _) => CardType::Discover,
        _ => CardType::Unknown,
    }
}

fn payment_token(user_id: i64, digits: &str) -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let mut hasher = Blake2b512::new();
    hasher.update(salt);
    hasher.update(user_id.to_le_bytes());
    hasher.update(digits.as_bytes());
    hasher.finalize().iter().map(|b| format!("{b:02x}")).collect()
}
