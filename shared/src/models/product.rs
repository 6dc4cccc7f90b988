//! Catalog product (row in `artikel`, read-only from the engine)

use serde::{Deserialize, Serialize};

/// Catalog entry consulted to fill line-item fields the draft left unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub sku: String,
    pub name: String,
    /// Net unit price in currency units
    pub unit_price: f64,
    /// Tax rate as a percentage
    pub tax_rate: f64,
}
