//! Downstream documents: invoices and delivery notes
//!
//! Read by the aggregate reader and consulted (existence-only) by the
//! deletion guard. The engine never creates or mutates these rows.

use serde::{Deserialize, Serialize};

/// Invoice linked to an order (row in `rechnung`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Invoice {
    pub id: i64,
    pub order_id: i64,
    pub number: String,
    pub cancelled: bool,
    /// Creation timestamp (epoch millis)
    pub created_at: i64,
}

/// Lightweight reference to a downstream document, enough to name it in a
/// deletion-guard reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DocumentRef {
    pub id: i64,
    pub number: String,
}

/// Downstream documents blocking deletion of one order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockingDocuments {
    /// Non-cancelled invoices referencing the order
    pub invoices: Vec<DocumentRef>,
    /// Delivery notes referencing the order
    pub delivery_notes: Vec<DocumentRef>,
}

impl BlockingDocuments {
    pub fn is_empty(&self) -> bool {
        self.invoices.is_empty() && self.delivery_notes.is_empty()
    }
}
