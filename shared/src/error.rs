//! Unified error type for the order engine
//!
//! `EngineError` is the single error surface of the engine. Every variant
//! carries enough context (operation target, entity id) for callers to
//! render a meaningful message without inspecting internals.
//!
//! # Error kinds
//!
//! - [`EngineError::NotFound`]: referenced customer/product/order absent;
//!   surfaced to the caller, never retried
//! - [`EngineError::Conflict`]: sequence allocation contention; retried
//!   internally with bounded attempts, invisible to callers
//! - [`EngineError::Validation`]: malformed draft, rejected before any write
//! - [`EngineError::DependencyBlocked`]: deletion disallowed by downstream
//!   documents, reason names the blocking documents
//! - [`EngineError::RecalculationFailed`]: the external totals recomputation
//!   errored; the enclosing transaction is rolled back
//! - [`EngineError::Configuration`]: missing sequence counter row or other
//!   setup defect
//! - [`EngineError::Storage`]: connectivity/transaction errors, never
//!   silently swallowed

use thiserror::Error;

/// Result type used across the engine.
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A referenced entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Concurrent contention (e.g. a compare-and-swap sequence update lost).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Draft validation failed before any write.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Deletion blocked by downstream documents.
    #[error("deletion blocked: {0}")]
    DependencyBlocked(String),

    /// The authoritative totals recomputation failed; the triggering
    /// operation was rolled back.
    #[error("totals recalculation failed for order {order_id}: {message}")]
    RecalculationFailed { order_id: i64, message: String },

    /// Missing or invalid setup (e.g. no counter row for a number stream).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Database or connectivity failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl EngineError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn dependency_blocked(reason: impl Into<String>) -> Self {
        Self::DependencyBlocked(reason.into())
    }

    pub fn recalculation_failed(order_id: i64, message: impl Into<String>) -> Self {
        Self::RecalculationFailed {
            order_id,
            message: message.into(),
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Whether the engine may retry the failed operation internally.
    /// Only sequence-allocation contention qualifies.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

#[cfg(feature = "db")]
impl From<sqlx::Error> for EngineError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                tracing::warn!(error = %db, "unique violation");
                EngineError::Conflict(db.to_string())
            }
            _ => {
                tracing::error!(error = %e, "database error");
                EngineError::Storage(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_entity_and_id() {
        let err = EngineError::not_found("order", 42);
        assert_eq!(err.to_string(), "order 42 not found");

        let err = EngineError::recalculation_failed(7, "collaborator unavailable");
        assert!(err.to_string().contains("order 7"));
    }

    #[test]
    fn only_conflict_is_retryable() {
        assert!(EngineError::conflict("cas lost").is_retryable());
        assert!(!EngineError::validation("bad quantity").is_retryable());
        assert!(!EngineError::storage("connection reset").is_retryable());
    }
}
