//! Shared types for the order lifecycle engine
//!
//! Domain models and error types used by the engine crate and by callers
//! (UI sessions, API hosts, background workers). Row types carry
//! `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]` so non-database
//! consumers stay free of the sqlx dependency.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{EngineError, EngineResult};
pub use serde::{Deserialize, Serialize};
