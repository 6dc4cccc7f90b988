//! Order drafts and their normalized form
//!
//! Callers submit an [`OrderDraft`] with whatever fields they have; the
//! engine's normalization step resolves every fallback (customer snapshot,
//! catalog, literal defaults) into a [`NewOrder`] before anything is
//! persisted.

use serde::{Deserialize, Serialize};

use super::{NewAddress, NewLineItem, OrderStatus};

/// Caller-supplied address fields; anything unset falls back to the
/// customer's default address, then to empty strings (country falls back
/// to "Deutschland"/"DE").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftAddress {
    pub company: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub street: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Caller-supplied line item. Name/SKU/price/tax rate may be omitted when
/// `product_id` is set; the catalog resolver fills them in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftLine {
    pub product_id: Option<i64>,
    pub sku: Option<String>,
    pub name: Option<String>,
    pub quantity: f64,
    pub unit_price: Option<f64>,
    pub tax_rate: Option<f64>,
    pub discount_percent: Option<f64>,
}

/// Order creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub customer_id: i64,
    /// Defaults to [`OrderStatus::Open`] when unset
    pub status: Option<OrderStatus>,
    /// Defaults to "EUR" when unset
    pub currency: Option<String>,
    pub comment: Option<String>,
    pub billing: Option<DraftAddress>,
    pub shipping: Option<DraftAddress>,
    pub lines: Vec<DraftLine>,
}

impl OrderDraft {
    pub fn new(customer_id: i64) -> Self {
        Self {
            customer_id,
            status: None,
            currency: None,
            comment: None,
            billing: None,
            shipping: None,
            lines: Vec::new(),
        }
    }
}

/// Fully populated, validated order ready for atomic insertion. Every
/// fallback rule has been applied; the writer persists it verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    /// Allocated public order number
    pub number: String,
    pub customer_id: i64,
    pub status: OrderStatus,
    pub currency: String,
    pub comment: Option<String>,
    pub billing: NewAddress,
    pub shipping: NewAddress,
    /// Lines with dense positions 0..n
    pub lines: Vec<NewLineItem>,
    /// Creation timestamp (epoch millis)
    pub created_at: i64,
}
