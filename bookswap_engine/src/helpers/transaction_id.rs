use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};

/// Generates a reference for a simulated card or cash settlement, e.g. `TXN-20240301142233-K3J9QX2A`.
pub fn new_transaction_id(now: DateTime<Utc>) -> String {
    let suffix: String =
        rand::thread_rng().sample_iter(&Alphanumeric).take(8).map(|c| char::from(c).to_ascii_uppercase()).collect();
    format!("TXN-{}-{suffix}", now.format("%Y%m%d%H%M%S"))
}
