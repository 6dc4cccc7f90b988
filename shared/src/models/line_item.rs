//! Order line items (rows in `bestellung_position`)

use serde::{Deserialize, Serialize};

/// Persisted line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderLineItem {
    pub id: i64,
    pub order_id: i64,
    /// Catalog reference; `None` for custom/free-text lines
    pub product_id: Option<i64>,
    pub sku: String,
    pub name: String,
    /// Ordered quantity, always positive
    pub quantity: f64,
    /// Net price per unit in currency units
    pub unit_price: f64,
    /// Tax rate as a percentage (e.g. 19.0)
    pub tax_rate: f64,
    /// Discount rate as a percentage in [0, 100]
    pub discount_percent: f64,
    /// Dense, zero-based sort position, unique within the order
    pub position: i32,
}

/// Fully populated line item ready for insertion. Catalog fallbacks are
/// already resolved and the sort position assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLineItem {
    pub product_id: Option<i64>,
    pub sku: String,
    pub name: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub tax_rate: f64,
    pub discount_percent: f64,
    pub position: i32,
}
