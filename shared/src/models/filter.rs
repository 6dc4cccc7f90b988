//! Order list filter

use serde::{Deserialize, Serialize};

use super::OrderStatus;

/// Filter for `list_orders`. Cancelled orders are always excluded; results
/// are ordered newest first and paginated with limit/offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Inclusive lower bound on creation time (epoch millis)
    pub date_from: Option<i64>,
    /// Inclusive upper bound on creation time (epoch millis)
    pub date_to: Option<i64>,
    pub customer_id: Option<i64>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for OrderFilter {
    fn default() -> Self {
        Self {
            status: None,
            date_from: None,
            date_to: None,
            customer_id: None,
            limit: 50,
            offset: 0,
        }
    }
}
