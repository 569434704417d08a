use std::{fmt::Display, str::FromStr};

use bookswap_engine::{
    db_types::OrderStatusType,
    listing_objects::{ProductQueryFilter, MAX_PAGE_SIZE},
    order_lifecycle::Party,
};
use serde::{Deserialize, Serialize};

use crate::errors::{FieldErrors, ServerError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: i64,
}

/// The number of rows a bulk operation touched, e.g. clearing a cart or marking every notification as read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatedResponse {
    pub updated: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListItemRequest {
    pub product_id: i64,
}

impl ListItemRequest {
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.product_id <= 0 {
            return Err(ServerError::validation("product_id", "Must be a product id"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationParams {
    #[serde(default)]
    pub unread_only: bool,
}

/// Query parameters for `GET /api/orders`.
///
/// `role` narrows the list to orders where the caller is the buyer or the seller. `status` is a comma-separated list
/// of order statuses, e.g. `pending,accepted`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderListParams {
    pub role: Option<Party>,
    pub status: Option<String>,
}

impl OrderListParams {
    pub fn statuses(&self) -> Result<Vec<OrderStatusType>, ServerError> {
        let Some(status) = self.status.as_deref() else {
            return Ok(Vec::new());
        };
        let mut errors = Vec::new();
        let statuses = status
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| OrderStatusType::from_str(s).map_err(|_| errors.push(format!("Unknown status: {s}"))).ok())
            .collect::<Vec<_>>();
        if errors.is_empty() {
            Ok(statuses)
        } else {
            let mut fields = FieldErrors::new();
            fields.insert("status".to_string(), errors);
            Err(ServerError::ValidationFailed(fields))
        }
    }
}

/// Checks the parts of a product search that the engine would otherwise silently clamp or ignore.
pub fn validate_product_filter(filter: &ProductQueryFilter) -> Result<(), ServerError> {
    let mut fields = FieldErrors::new();
    let mut add = |field: &str, message: String| fields.entry(field.to_string()).or_default().push(message);
    if let Some(limit) = filter.limit {
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            add("limit", format!("Must be between 1 and {MAX_PAGE_SIZE}"));
        }
    }
    if filter.offset.is_some_and(|offset| offset < 0) {
        add("offset", "Cannot be negative".to_string());
    }
    if filter.min_price.is_some_and(|p| p.cents() < 0) {
        add("min_price", "Cannot be negative".to_string());
    }
    if let (Some(min), Some(max)) = (filter.min_price, filter.max_price) {
        if min > max {
            add("max_price", "Must not be less than min_price".to_string());
        }
    }
    if fields.is_empty() {
        Ok(())
    } else {
        Err(ServerError::ValidationFailed(fields))
    }
}
