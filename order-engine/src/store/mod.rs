//! Storage boundary of the order engine
//!
//! One trait, two backends:
//! - [`PgOrderStore`]: sqlx/PostgreSQL against the shared warehouse schema
//! - [`MemoryOrderStore`]: in-process state for tests and development
//!
//! Every mutating method is atomic: either the full aggregate change plus
//! the totals recalculation commits, or nothing does. The recalculator is
//! passed into each mutation so backends can run it inside their own
//! transaction and roll everything back when it fails.

pub mod memory;
pub mod postgres;

pub use memory::MemoryOrderStore;
pub use postgres::PgOrderStore;

use async_trait::async_trait;
use shared::models::{
    AddressKind, BlockingDocuments, Customer, NewAddress, NewLineItem, NewOrder, Order,
    OrderDetails, OrderFilter, OrderStatus, Product, SequenceValue,
};
use shared::EngineResult;

use crate::recalc::TotalsRecalculator;

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Atomically increment the counter of one numbering stream and return
    /// the issued value with its formatting affixes. Two concurrent callers
    /// never observe the same value. A missing counter row is a
    /// `Configuration` error, never a silently fabricated default.
    async fn next_sequence(&self, stream: i32) -> EngineResult<SequenceValue>;

    /// Customer snapshot lookup; absence is a normal `None`.
    async fn customer(&self, id: i64) -> EngineResult<Option<Customer>>;

    /// Catalog lookup; absence is a normal `None`.
    async fn product(&self, id: i64) -> EngineResult<Option<Product>>;

    /// Persist header, both addresses, all line items, and the recalculated
    /// totals as one atomic unit. Returns the new order id.
    async fn insert_order(
        &self,
        order: &NewOrder,
        recalc: &dyn TotalsRecalculator,
    ) -> EngineResult<i64>;

    /// Replace all line items of an order (dense positions already
    /// assigned) and recalculate, atomically.
    async fn replace_lines(
        &self,
        order_id: i64,
        lines: &[NewLineItem],
        recalc: &dyn TotalsRecalculator,
    ) -> EngineResult<()>;

    /// Update the status and last-modified timestamp, then recalculate,
    /// atomically.
    async fn update_status(
        &self,
        order_id: i64,
        status: OrderStatus,
        recalc: &dyn TotalsRecalculator,
    ) -> EngineResult<()>;

    /// Set the cancellation flag, then recalculate, atomically.
    async fn cancel_order(
        &self,
        order_id: i64,
        recalc: &dyn TotalsRecalculator,
    ) -> EngineResult<()>;

    /// Replace one of the two owned address rows. Addresses are
    /// totals-neutral, so no recalculation happens here.
    async fn update_address(
        &self,
        order_id: i64,
        kind: AddressKind,
        address: &NewAddress,
    ) -> EngineResult<()>;

    /// Header-only projection. Must not touch lines, addresses, invoices
    /// or the customer profile.
    async fn order_header(&self, id: i64) -> EngineResult<Option<Order>>;

    /// Full detail load: customer, lines by position, both addresses,
    /// non-cancelled invoices.
    async fn order_details(&self, id: i64) -> EngineResult<Option<(Order, OrderDetails)>>;

    /// Non-cancelled orders matching the filter, newest first,
    /// limit/offset pagination.
    async fn list_orders(&self, filter: &OrderFilter) -> EngineResult<Vec<Order>>;

    /// Downstream documents that would block deletion.
    async fn blocking_documents(&self, order_id: i64) -> EngineResult<BlockingDocuments>;

    /// Destroy the order and its owned rows. Re-evaluates the deletion
    /// guard inside the same transaction; a blocked order is left intact
    /// with `DependencyBlocked` surfaced.
    async fn delete_order(&self, order_id: i64) -> EngineResult<()>;
}
