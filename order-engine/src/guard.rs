//! Deletion guard
//!
//! An order may be destroyed only while no downstream document references
//! it: zero delivery notes and zero non-cancelled invoices. The verdict is
//! a pure function over [`BlockingDocuments`] so both the caller-facing
//! `can_delete` check and the re-check inside the delete transaction share
//! one rule.

use shared::models::{BlockingDocuments, DocumentRef};
use shared::{EngineError, EngineResult};

/// Caller-facing deletion check result.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletionCheck {
    pub allowed: bool,
    /// Human-readable reason naming the blocking document(s); empty when
    /// deletion is allowed.
    pub reason: String,
}

fn name_documents(kind: &str, docs: &[DocumentRef]) -> String {
    let numbers: Vec<&str> = docs.iter().map(|d| d.number.as_str()).collect();
    format!("{} {} ({})", docs.len(), kind, numbers.join(", "))
}

/// Build the human-readable reason for a blocked deletion.
pub fn blocking_reason(order_id: i64, documents: &BlockingDocuments) -> String {
    let mut parts = Vec::new();
    if !documents.invoices.is_empty() {
        parts.push(name_documents("non-cancelled invoice(s)", &documents.invoices));
    }
    if !documents.delivery_notes.is_empty() {
        parts.push(name_documents("delivery note(s)", &documents.delivery_notes));
    }
    format!("order {} is referenced by {}", order_id, parts.join(" and "))
}

/// Evaluate the guard.
pub fn check(order_id: i64, documents: &BlockingDocuments) -> DeletionCheck {
    if documents.is_empty() {
        DeletionCheck {
            allowed: true,
            reason: String::new(),
        }
    } else {
        DeletionCheck {
            allowed: false,
            reason: blocking_reason(order_id, documents),
        }
    }
}

/// Guard as an error: `Ok(())` when deletion may proceed, otherwise
/// `DependencyBlocked`. Used inside the delete transaction.
pub fn verdict(order_id: i64, documents: &BlockingDocuments) -> EngineResult<()> {
    let check = check(order_id, documents);
    if check.allowed {
        Ok(())
    } else {
        Err(EngineError::dependency_blocked(check.reason))
    }
}
