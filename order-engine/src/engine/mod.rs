//! Order lifecycle engine
//!
//! The service layer over one [`OrderStore`]. Orchestration only: number
//! allocation, draft normalization, and the deletion guard live in their
//! own modules; atomicity lives in the store. Monetary totals always come
//! from the injected [`TotalsRecalculator`], never from this layer.

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::sync::Arc;

use shared::models::{
    AddressKind, Customer, DraftAddress, DraftLine, NewLineItem, Order, OrderDraft, OrderFilter,
    OrderStatus, OrderView, Product, ORDER_NUMBER_STREAM,
};
use shared::util::now_millis;
use shared::{EngineError, EngineResult};

use crate::guard::{self, DeletionCheck};
use crate::normalize;
use crate::recalc::TotalsRecalculator;
use crate::sequence;
use crate::store::OrderStore;

pub struct OrderEngine<S: OrderStore> {
    store: S,
    recalc: Arc<dyn TotalsRecalculator>,
}

impl<S: OrderStore> OrderEngine<S> {
    pub fn new(store: S, recalc: Arc<dyn TotalsRecalculator>) -> Self {
        Self { store, recalc }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create an order from a draft.
    ///
    /// Validation happens before the number allocation, so a rejected draft
    /// never burns a number. A number allocated for an insert that later
    /// fails stays consumed; numbers are unique, not gapless.
    pub async fn create_order(&self, draft: &OrderDraft) -> EngineResult<Order> {
        normalize::validate_draft(draft)?;

        let customer = self.require_customer(draft.customer_id).await?;
        let products = self.resolve_products(&draft.lines).await?;
        normalize::validate_catalog_refs(&draft.lines, &products)?;

        let number = sequence::allocate_number(&self.store, ORDER_NUMBER_STREAM).await?;
        let order = normalize::normalize_draft(draft, number, &customer, &products, now_millis());

        let id = self.store.insert_order(&order, self.recalc.as_ref()).await?;
        tracing::info!(order_id = id, number = %order.number, customer_id = customer.id, "order created");

        self.store
            .order_header(id)
            .await?
            .ok_or_else(|| EngineError::not_found("order", id))
    }

    /// Load one order. `include_details` switches between the header-only
    /// projection and the full aggregate; the cheap path never touches
    /// lines, addresses, invoices or the customer profile. A missing order
    /// is a normal `None`, not an error.
    pub async fn get_order(
        &self,
        id: i64,
        include_details: bool,
    ) -> EngineResult<Option<OrderView>> {
        if include_details {
            Ok(self
                .store
                .order_details(id)
                .await?
                .map(|(header, details)| OrderView {
                    header,
                    details: Some(details),
                }))
        } else {
            Ok(self.store.order_header(id).await?.map(|header| OrderView {
                header,
                details: None,
            }))
        }
    }

    /// Non-cancelled orders matching the filter, newest first.
    pub async fn list_orders(&self, filter: &OrderFilter) -> EngineResult<Vec<Order>> {
        self.store.list_orders(filter).await
    }

    /// Set the order status. Always triggers a totals recalculation, like
    /// every other aggregate mutation.
    pub async fn update_status(&self, order_id: i64, status: OrderStatus) -> EngineResult<()> {
        self.store
            .update_status(order_id, status, self.recalc.as_ref())
            .await?;
        tracing::debug!(order_id, ?status, "order status updated");
        Ok(())
    }

    /// Replace the full line set of an order. Positions are reassigned
    /// densely in the given order.
    pub async fn update_lines(&self, order_id: i64, lines: &[DraftLine]) -> EngineResult<()> {
        normalize::validate_lines(lines)?;
        let products = self.resolve_products(lines).await?;
        normalize::validate_catalog_refs(lines, &products)?;
        let normalized: Vec<NewLineItem> = lines
            .iter()
            .enumerate()
            .map(|(i, line)| normalize::normalize_line(line, i as i32, &products))
            .collect();
        self.store
            .replace_lines(order_id, &normalized, self.recalc.as_ref())
            .await?;
        tracing::debug!(order_id, line_count = normalized.len(), "order lines replaced");
        Ok(())
    }

    /// Replace one of the order's two addresses. Unset draft fields fall
    /// back to the customer snapshot, as at creation.
    pub async fn update_address(
        &self,
        order_id: i64,
        kind: AddressKind,
        draft: &DraftAddress,
    ) -> EngineResult<()> {
        let header = self
            .store
            .order_header(order_id)
            .await?
            .ok_or_else(|| EngineError::not_found("order", order_id))?;
        let customer = self.store.customer(header.customer_id).await?;
        let address = normalize::normalize_address(kind, Some(draft), customer.as_ref());
        self.store.update_address(order_id, kind, &address).await
    }

    /// Cancel an order. Cancellation is a flag, not a status; the order
    /// keeps its number and disappears from listings.
    pub async fn cancel_order(&self, order_id: i64) -> EngineResult<()> {
        self.store
            .cancel_order(order_id, self.recalc.as_ref())
            .await?;
        tracing::info!(order_id, "order cancelled");
        Ok(())
    }

    /// Non-destructive deletion check, with a reason naming every blocking
    /// document.
    pub async fn can_delete(&self, order_id: i64) -> EngineResult<DeletionCheck> {
        if self.store.order_header(order_id).await?.is_none() {
            return Err(EngineError::not_found("order", order_id));
        }
        let documents = self.store.blocking_documents(order_id).await?;
        Ok(guard::check(order_id, &documents))
    }

    /// Destroy an order and its owned rows. The store re-evaluates the
    /// guard inside the delete transaction, so a document created between
    /// check and delete still blocks.
    pub async fn delete_order(&self, order_id: i64) -> EngineResult<()> {
        self.store.delete_order(order_id).await?;
        tracing::info!(order_id, "order deleted");
        Ok(())
    }

    async fn require_customer(&self, id: i64) -> EngineResult<Customer> {
        self.store
            .customer(id)
            .await?
            .ok_or_else(|| EngineError::not_found("customer", id))
    }

    /// Catalog rows for every referenced product id that still exists.
    /// Missing rows are skipped; normalization keeps the draft's own values
    /// for those lines.
    async fn resolve_products(&self, lines: &[DraftLine]) -> EngineResult<HashMap<i64, Product>> {
        let mut products = HashMap::new();
        for line in lines {
            if let Some(id) = line.product_id
                && !products.contains_key(&id)
                && let Some(product) = self.store.product(id).await?
            {
                products.insert(id, product);
            }
        }
        Ok(products)
    }
}
