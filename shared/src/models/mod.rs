//! Data models
//!
//! Shared between the engine and its callers (UI, API, workers).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64`; timestamps are epoch milliseconds (BIGINT).

pub mod address;
pub mod customer;
pub mod draft;
pub mod filter;
pub mod invoice;
pub mod line_item;
pub mod order;
pub mod product;
pub mod sequence;

// Re-exports
pub use address::*;
pub use customer::*;
pub use draft::*;
pub use filter::*;
pub use invoice::*;
pub use line_item::*;
pub use order::*;
pub use product::*;
pub use sequence::*;
