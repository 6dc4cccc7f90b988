//! Order lifecycle engine
//!
//! Sits between callers (UI, import jobs) and the shared PostgreSQL schema
//! of the surrounding warehouse/accounting system. Owns order creation with
//! counter-based numbering, aggregate reads and mutations, cancellation,
//! and guarded deletion. Monetary totals are always derived by the injected
//! recalculator, never edited directly.

pub mod config;
pub mod db;
pub mod engine;
pub mod guard;
pub mod money;
pub mod normalize;
pub mod recalc;
pub mod sequence;
pub mod store;

pub use config::EngineConfig;
pub use engine::OrderEngine;
pub use guard::DeletionCheck;
pub use recalc::{ReferenceRecalculator, TotalsRecalculator};
pub use store::{MemoryOrderStore, OrderStore, PgOrderStore};
