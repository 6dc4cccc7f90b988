//! Order header and aggregate view

use serde::{Deserialize, Serialize};

use super::{Customer, Invoice, OrderAddress, OrderLineItem};

/// Order status lifecycle (SMALLINT codes in the shared schema).
///
/// `Open` is the smallest positive code and the creation default.
/// Cancellation is a separate flag on the header, not a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Open = 1,
    InProgress = 2,
    Shipped = 3,
    Completed = 4,
}

impl OrderStatus {
    pub fn as_i16(self) -> i16 {
        self as i16
    }

    pub fn from_i16(code: i16) -> Option<Self> {
        match code {
            1 => Some(Self::Open),
            2 => Some(Self::InProgress),
            3 => Some(Self::Shipped),
            4 => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Derived monetary totals. Owned exclusively by the totals recalculation
/// step; the writer persists its output verbatim and never computes them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderTotals {
    /// Net total in currency units
    pub net: f64,
    /// Gross total in currency units
    pub gross: f64,
}

/// Order header (row in `bestellung`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    /// Public order number, unique and immutable once assigned
    pub number: String,
    pub customer_id: i64,
    /// Creation timestamp (epoch millis)
    pub created_at: i64,
    /// Last modification timestamp (epoch millis)
    pub updated_at: i64,
    pub status: OrderStatus,
    pub cancelled: bool,
    /// ISO 4217 currency code
    pub currency: String,
    pub totals: OrderTotals,
    /// Free-text internal comment
    pub comment: Option<String>,
}

/// Eagerly loaded order details (the `include_details = true` path).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub customer: Customer,
    /// Line items ordered by sort position
    pub lines: Vec<OrderLineItem>,
    pub billing: OrderAddress,
    pub shipping: OrderAddress,
    /// Non-cancelled invoices linked to the order
    pub invoices: Vec<Invoice>,
}

/// Full order view returned by the reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderView {
    pub header: Order,
    /// Populated only when details were requested
    pub details: Option<OrderDetails>,
}
