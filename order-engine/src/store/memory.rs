//! In-memory order store for tests and development
//!
//! Mirrors the PostgreSQL backend's atomicity: a mutation stages its whole
//! change locally and commits it into the shared state only after the
//! totals recalculation succeeded. One mutex guards all state, so counter
//! increments serialize exactly like the database's row lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use shared::models::{
    AddressKind, BlockingDocuments, Customer, DocumentRef, Invoice, NewAddress, NewLineItem,
    NewOrder, Order, OrderAddress, OrderDetails, OrderFilter, OrderLineItem, OrderStatus, Product,
    SequenceValue,
};
use shared::util::now_millis;
use shared::{EngineError, EngineResult};
use tokio::sync::Mutex;

use crate::guard;
use crate::recalc::{recalc_failed, TotalsRecalculator};
use crate::store::OrderStore;

#[derive(Debug, Clone)]
struct Counter {
    value: i64,
    prefix: Option<String>,
    suffix: Option<String>,
}

#[derive(Debug, Clone)]
struct StoredOrder {
    header: Order,
    billing: OrderAddress,
    shipping: OrderAddress,
    lines: Vec<OrderLineItem>,
}

#[derive(Debug, Clone)]
struct DeliveryNote {
    id: i64,
    order_id: i64,
    number: String,
}

#[derive(Debug, Default)]
struct State {
    counters: HashMap<i32, Counter>,
    /// Forced `Conflict` results for upcoming `next_sequence` calls
    pending_conflicts: u32,
    customers: HashMap<i64, Customer>,
    products: HashMap<i64, Product>,
    orders: HashMap<i64, StoredOrder>,
    invoices: Vec<Invoice>,
    delivery_notes: Vec<DeliveryNote>,
    next_order_id: i64,
    next_row_id: i64,
}

impl State {
    fn order_id(&mut self) -> i64 {
        self.next_order_id += 1;
        self.next_order_id
    }

    fn row_id(&mut self) -> i64 {
        self.next_row_id += 1;
        self.next_row_id
    }

    fn materialize_address(&mut self, order_id: i64, address: &NewAddress) -> OrderAddress {
        OrderAddress {
            id: self.row_id(),
            order_id,
            kind: address.kind,
            company: address.company.clone(),
            first_name: address.first_name.clone(),
            last_name: address.last_name.clone(),
            street: address.street.clone(),
            postal_code: address.postal_code.clone(),
            city: address.city.clone(),
            country: address.country.clone(),
            country_code: address.country_code.clone(),
            phone: address.phone.clone(),
            email: address.email.clone(),
        }
    }

    fn materialize_lines(&mut self, order_id: i64, lines: &[NewLineItem]) -> Vec<OrderLineItem> {
        lines
            .iter()
            .map(|line| OrderLineItem {
                id: self.row_id(),
                order_id,
                product_id: line.product_id,
                sku: line.sku.clone(),
                name: line.name.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                tax_rate: line.tax_rate,
                discount_percent: line.discount_percent,
                position: line.position,
            })
            .collect()
    }

    fn blocking_documents(&self, order_id: i64) -> BlockingDocuments {
        BlockingDocuments {
            invoices: self
                .invoices
                .iter()
                .filter(|i| i.order_id == order_id && !i.cancelled)
                .map(|i| DocumentRef {
                    id: i.id,
                    number: i.number.clone(),
                })
                .collect(),
            delivery_notes: self
                .delivery_notes
                .iter()
                .filter(|n| n.order_id == order_id)
                .map(|n| DocumentRef {
                    id: n.id,
                    number: n.number.clone(),
                })
                .collect(),
        }
    }
}

fn snapshot(lines: &[OrderLineItem]) -> Vec<NewLineItem> {
    lines
        .iter()
        .map(|line| NewLineItem {
            product_id: line.product_id,
            sku: line.sku.clone(),
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            tax_rate: line.tax_rate,
            discount_percent: line.discount_percent,
            position: line.position,
        })
        .collect()
}

#[derive(Clone, Default)]
pub struct MemoryOrderStore {
    state: Arc<Mutex<State>>,
    header_loads: Arc<AtomicUsize>,
    detail_loads: Arc<AtomicUsize>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_counter(
        &self,
        stream: i32,
        start: i64,
        prefix: Option<&str>,
        suffix: Option<&str>,
    ) {
        self.state.lock().await.counters.insert(
            stream,
            Counter {
                value: start,
                prefix: prefix.map(str::to_string),
                suffix: suffix.map(str::to_string),
            },
        );
    }

    pub async fn seed_customer(&self, customer: Customer) {
        self.state.lock().await.customers.insert(customer.id, customer);
    }

    pub async fn seed_product(&self, product: Product) {
        self.state.lock().await.products.insert(product.id, product);
    }

    pub async fn seed_invoice(&self, order_id: i64, number: &str, cancelled: bool) {
        let mut state = self.state.lock().await;
        let id = state.row_id();
        state.invoices.push(Invoice {
            id,
            order_id,
            number: number.to_string(),
            cancelled,
            created_at: now_millis(),
        });
    }

    pub async fn seed_delivery_note(&self, order_id: i64, number: &str) {
        let mut state = self.state.lock().await;
        let id = state.row_id();
        state.delivery_notes.push(DeliveryNote {
            id,
            order_id,
            number: number.to_string(),
        });
    }

    /// Make the next `n` sequence allocations fail with `Conflict`, to
    /// exercise the bounded retry.
    pub async fn inject_sequence_conflicts(&self, n: u32) {
        self.state.lock().await.pending_conflicts = n;
    }

    /// How many header-only loads happened (the cheap read path).
    pub fn header_load_count(&self) -> usize {
        self.header_loads.load(Ordering::SeqCst)
    }

    /// How many full detail loads happened.
    pub fn detail_load_count(&self) -> usize {
        self.detail_loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn next_sequence(&self, stream: i32) -> EngineResult<SequenceValue> {
        let mut state = self.state.lock().await;
        if state.pending_conflicts > 0 {
            state.pending_conflicts -= 1;
            return Err(EngineError::conflict(format!(
                "counter row for stream {stream} is contended"
            )));
        }
        let counter = state.counters.get_mut(&stream).ok_or_else(|| {
            EngineError::configuration(format!(
                "no counter row configured for number stream {stream}"
            ))
        })?;
        counter.value += 1;
        Ok(SequenceValue {
            value: counter.value,
            prefix: counter.prefix.clone(),
            suffix: counter.suffix.clone(),
        })
    }

    async fn customer(&self, id: i64) -> EngineResult<Option<Customer>> {
        Ok(self.state.lock().await.customers.get(&id).cloned())
    }

    async fn product(&self, id: i64) -> EngineResult<Option<Product>> {
        Ok(self.state.lock().await.products.get(&id).cloned())
    }

    async fn insert_order(
        &self,
        order: &NewOrder,
        recalc: &dyn TotalsRecalculator,
    ) -> EngineResult<i64> {
        let mut state = self.state.lock().await;
        let id = state.order_id();

        // Stage everything locally; nothing lands in `orders` until the
        // recalculation succeeded.
        let billing = state.materialize_address(id, &order.billing);
        let shipping = state.materialize_address(id, &order.shipping);
        let lines = state.materialize_lines(id, &order.lines);
        let totals = recalc
            .recalculate(id, &order.lines)
            .await
            .map_err(|e| recalc_failed(id, e))?;

        state.orders.insert(
            id,
            StoredOrder {
                header: Order {
                    id,
                    number: order.number.clone(),
                    customer_id: order.customer_id,
                    created_at: order.created_at,
                    updated_at: order.created_at,
                    status: order.status,
                    cancelled: false,
                    currency: order.currency.clone(),
                    totals,
                    comment: order.comment.clone(),
                },
                billing,
                shipping,
                lines,
            },
        );
        Ok(id)
    }

    async fn replace_lines(
        &self,
        order_id: i64,
        lines: &[NewLineItem],
        recalc: &dyn TotalsRecalculator,
    ) -> EngineResult<()> {
        let mut state = self.state.lock().await;
        if !state.orders.contains_key(&order_id) {
            return Err(EngineError::not_found("order", order_id));
        }

        let new_lines = state.materialize_lines(order_id, lines);
        let totals = recalc
            .recalculate(order_id, lines)
            .await
            .map_err(|e| recalc_failed(order_id, e))?;

        let stored = state.orders.get_mut(&order_id).unwrap();
        stored.lines = new_lines;
        stored.header.totals = totals;
        stored.header.updated_at = now_millis();
        Ok(())
    }

    async fn update_status(
        &self,
        order_id: i64,
        status: OrderStatus,
        recalc: &dyn TotalsRecalculator,
    ) -> EngineResult<()> {
        let mut state = self.state.lock().await;
        let Some(stored) = state.orders.get(&order_id) else {
            return Err(EngineError::not_found("order", order_id));
        };

        let lines = snapshot(&stored.lines);
        let totals = recalc
            .recalculate(order_id, &lines)
            .await
            .map_err(|e| recalc_failed(order_id, e))?;

        let stored = state.orders.get_mut(&order_id).unwrap();
        stored.header.status = status;
        stored.header.totals = totals;
        stored.header.updated_at = now_millis();
        Ok(())
    }

    async fn cancel_order(
        &self,
        order_id: i64,
        recalc: &dyn TotalsRecalculator,
    ) -> EngineResult<()> {
        let mut state = self.state.lock().await;
        let Some(stored) = state.orders.get(&order_id) else {
            return Err(EngineError::not_found("order", order_id));
        };

        let lines = snapshot(&stored.lines);
        let totals = recalc
            .recalculate(order_id, &lines)
            .await
            .map_err(|e| recalc_failed(order_id, e))?;

        let stored = state.orders.get_mut(&order_id).unwrap();
        stored.header.cancelled = true;
        stored.header.totals = totals;
        stored.header.updated_at = now_millis();
        Ok(())
    }

    async fn update_address(
        &self,
        order_id: i64,
        kind: AddressKind,
        address: &NewAddress,
    ) -> EngineResult<()> {
        let mut state = self.state.lock().await;
        let Some(stored) = state.orders.get_mut(&order_id) else {
            return Err(EngineError::not_found("order", order_id));
        };

        let target = match kind {
            AddressKind::Billing => &mut stored.billing,
            AddressKind::Shipping => &mut stored.shipping,
        };
        // Overwrite in place, keeping the row id
        *target = OrderAddress {
            id: target.id,
            order_id,
            kind,
            company: address.company.clone(),
            first_name: address.first_name.clone(),
            last_name: address.last_name.clone(),
            street: address.street.clone(),
            postal_code: address.postal_code.clone(),
            city: address.city.clone(),
            country: address.country.clone(),
            country_code: address.country_code.clone(),
            phone: address.phone.clone(),
            email: address.email.clone(),
        };
        stored.header.updated_at = now_millis();
        Ok(())
    }

    async fn order_header(&self, id: i64) -> EngineResult<Option<Order>> {
        self.header_loads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .state
            .lock()
            .await
            .orders
            .get(&id)
            .map(|stored| stored.header.clone()))
    }

    async fn order_details(&self, id: i64) -> EngineResult<Option<(Order, OrderDetails)>> {
        self.detail_loads.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().await;
        let Some(stored) = state.orders.get(&id) else {
            return Ok(None);
        };
        let customer = state
            .customers
            .get(&stored.header.customer_id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("customer", stored.header.customer_id))?;

        let mut lines = stored.lines.clone();
        lines.sort_by_key(|l| l.position);
        let invoices = state
            .invoices
            .iter()
            .filter(|i| i.order_id == id && !i.cancelled)
            .cloned()
            .collect();

        Ok(Some((
            stored.header.clone(),
            OrderDetails {
                customer,
                lines,
                billing: stored.billing.clone(),
                shipping: stored.shipping.clone(),
                invoices,
            },
        )))
    }

    async fn list_orders(&self, filter: &OrderFilter) -> EngineResult<Vec<Order>> {
        let state = self.state.lock().await;
        let mut headers: Vec<Order> = state
            .orders
            .values()
            .map(|stored| &stored.header)
            .filter(|h| !h.cancelled)
            .filter(|h| filter.status.is_none_or(|s| h.status == s))
            .filter(|h| filter.date_from.is_none_or(|t| h.created_at >= t))
            .filter(|h| filter.date_to.is_none_or(|t| h.created_at <= t))
            .filter(|h| filter.customer_id.is_none_or(|c| h.customer_id == c))
            .cloned()
            .collect();
        headers.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(headers
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    async fn blocking_documents(&self, order_id: i64) -> EngineResult<BlockingDocuments> {
        Ok(self.state.lock().await.blocking_documents(order_id))
    }

    async fn delete_order(&self, order_id: i64) -> EngineResult<()> {
        let mut state = self.state.lock().await;
        if !state.orders.contains_key(&order_id) {
            return Err(EngineError::not_found("order", order_id));
        }
        let documents = state.blocking_documents(order_id);
        guard::verdict(order_id, &documents)?;
        state.orders.remove(&order_id);
        Ok(())
    }
}
