//! Database access layer (shared warehouse/accounting schema)
//!
//! Plain sqlx functions over the normalized schema the engine does not
//! own. German table names (`bestellung`, `bestellung_adresse`,
//! `bestellung_position`, `nummernkreis`, `kunde`, `artikel`, `rechnung`,
//! `lieferschein`) come from the third-party system; Rust identifiers stay
//! English via column aliases.

pub mod catalog;
pub mod customers;
pub mod documents;
pub mod orders;
pub mod sequences;
