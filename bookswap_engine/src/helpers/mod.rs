mod card_details;
mod transaction_id;

pub use card_details::{card_type_for_number, luhn_checksum_valid, CardDetails, CardFields};
pub use transaction_id::new_transaction_id;
