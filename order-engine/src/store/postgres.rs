//! PostgreSQL order store
//!
//! Every mutating method opens one transaction, performs the aggregate
//! change, runs the totals recalculation on the in-flight line snapshot,
//! persists the returned totals, and only then commits. A recalculation
//! failure rolls the whole mutation back.

use async_trait::async_trait;
use shared::models::{
    AddressKind, BlockingDocuments, Customer, NewAddress, NewLineItem, NewOrder, Order,
    OrderDetails, OrderFilter, OrderLineItem, OrderStatus, Product, SequenceValue,
};
use shared::util::now_millis;
use shared::{EngineError, EngineResult};
use sqlx::PgPool;

use crate::db;
use crate::recalc::{recalc_failed, TotalsRecalculator};
use crate::{guard, store::OrderStore};

#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn line_snapshot(lines: Vec<OrderLineItem>) -> Vec<NewLineItem> {
    lines
        .into_iter()
        .map(|line| NewLineItem {
            product_id: line.product_id,
            sku: line.sku,
            name: line.name,
            quantity: line.quantity,
            unit_price: line.unit_price,
            tax_rate: line.tax_rate,
            discount_percent: line.discount_percent,
            position: line.position,
        })
        .collect()
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn next_sequence(&self, stream: i32) -> EngineResult<SequenceValue> {
        let mut conn = self.pool.acquire().await?;
        db::sequences::next_value(&mut conn, stream).await
    }

    async fn customer(&self, id: i64) -> EngineResult<Option<Customer>> {
        let mut conn = self.pool.acquire().await?;
        db::customers::find_by_id(&mut conn, id).await
    }

    async fn product(&self, id: i64) -> EngineResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        db::catalog::find_by_id(&mut conn, id).await
    }

    async fn insert_order(
        &self,
        order: &NewOrder,
        recalc: &dyn TotalsRecalculator,
    ) -> EngineResult<i64> {
        let mut tx = self.pool.begin().await?;

        let id = db::orders::insert_header(&mut tx, order).await?;
        db::orders::insert_address(&mut tx, id, &order.billing).await?;
        db::orders::insert_address(&mut tx, id, &order.shipping).await?;
        db::orders::insert_lines(&mut tx, id, &order.lines).await?;

        let totals = recalc
            .recalculate(id, &order.lines)
            .await
            .map_err(|e| recalc_failed(id, e))?;
        db::orders::write_totals(&mut tx, id, &totals, order.created_at).await?;

        tx.commit().await?;
        Ok(id)
    }

    async fn replace_lines(
        &self,
        order_id: i64,
        lines: &[NewLineItem],
        recalc: &dyn TotalsRecalculator,
    ) -> EngineResult<()> {
        let mut tx = self.pool.begin().await?;

        if !db::orders::lock_header(&mut tx, order_id).await? {
            return Err(EngineError::not_found("order", order_id));
        }
        db::orders::delete_lines(&mut tx, order_id).await?;
        db::orders::insert_lines(&mut tx, order_id, lines).await?;

        let totals = recalc
            .recalculate(order_id, lines)
            .await
            .map_err(|e| recalc_failed(order_id, e))?;
        db::orders::write_totals(&mut tx, order_id, &totals, now_millis()).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn update_status(
        &self,
        order_id: i64,
        status: OrderStatus,
        recalc: &dyn TotalsRecalculator,
    ) -> EngineResult<()> {
        let mut tx = self.pool.begin().await?;

        let now = now_millis();
        if !db::orders::set_status(&mut tx, order_id, status, now).await? {
            return Err(EngineError::not_found("order", order_id));
        }
        let snapshot = line_snapshot(db::orders::fetch_lines(&mut tx, order_id).await?);
        let totals = recalc
            .recalculate(order_id, &snapshot)
            .await
            .map_err(|e| recalc_failed(order_id, e))?;
        db::orders::write_totals(&mut tx, order_id, &totals, now).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn cancel_order(
        &self,
        order_id: i64,
        recalc: &dyn TotalsRecalculator,
    ) -> EngineResult<()> {
        let mut tx = self.pool.begin().await?;

        let now = now_millis();
        if !db::orders::set_cancelled(&mut tx, order_id, now).await? {
            return Err(EngineError::not_found("order", order_id));
        }
        let snapshot = line_snapshot(db::orders::fetch_lines(&mut tx, order_id).await?);
        let totals = recalc
            .recalculate(order_id, &snapshot)
            .await
            .map_err(|e| recalc_failed(order_id, e))?;
        db::orders::write_totals(&mut tx, order_id, &totals, now).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn update_address(
        &self,
        order_id: i64,
        kind: AddressKind,
        address: &NewAddress,
    ) -> EngineResult<()> {
        let mut tx = self.pool.begin().await?;

        if !db::orders::update_address(&mut tx, order_id, kind, address).await? {
            return Err(EngineError::not_found("order", order_id));
        }
        db::orders::touch(&mut tx, order_id, now_millis()).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn order_header(&self, id: i64) -> EngineResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        db::orders::fetch_header(&mut conn, id).await
    }

    async fn order_details(&self, id: i64) -> EngineResult<Option<(Order, OrderDetails)>> {
        // One repeatable-read transaction, so a concurrent mutation cannot
        // pair this header's totals with another commit's line set.
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let Some(header) = db::orders::fetch_header(&mut tx, id).await? else {
            return Ok(None);
        };
        let customer = db::customers::find_by_id(&mut tx, header.customer_id)
            .await?
            .ok_or_else(|| EngineError::not_found("customer", header.customer_id))?;
        let lines = db::orders::fetch_lines(&mut tx, id).await?;
        let addresses = db::orders::fetch_addresses(&mut tx, id).await?;
        let invoices = db::documents::invoices_for_order(&mut tx, id).await?;
        tx.commit().await?;

        let mut billing = None;
        let mut shipping = None;
        for address in addresses {
            match address.kind {
                AddressKind::Billing => billing = Some(address),
                AddressKind::Shipping => shipping = Some(address),
            }
        }
        let billing = billing.ok_or_else(|| {
            EngineError::storage(format!("order {id} is missing its billing address"))
        })?;
        let shipping = shipping.ok_or_else(|| {
            EngineError::storage(format!("order {id} is missing its shipping address"))
        })?;

        Ok(Some((
            header,
            OrderDetails {
                customer,
                lines,
                billing,
                shipping,
                invoices,
            },
        )))
    }

    async fn list_orders(&self, filter: &OrderFilter) -> EngineResult<Vec<Order>> {
        let mut conn = self.pool.acquire().await?;
        db::orders::list(&mut conn, filter).await
    }

    async fn blocking_documents(&self, order_id: i64) -> EngineResult<BlockingDocuments> {
        let mut conn = self.pool.acquire().await?;
        db::documents::blocking_documents(&mut conn, order_id).await
    }

    async fn delete_order(&self, order_id: i64) -> EngineResult<()> {
        let mut tx = self.pool.begin().await?;

        // Lock the header so no invoice/delivery note can slip in between
        // the guard re-check and the delete.
        if !db::orders::lock_header(&mut tx, order_id).await? {
            return Err(EngineError::not_found("order", order_id));
        }
        let documents = db::documents::blocking_documents(&mut tx, order_id).await?;
        guard::verdict(order_id, &documents)?;

        db::orders::delete_order_rows(&mut tx, order_id).await?;
        tx.commit().await?;
        Ok(())
    }
}
