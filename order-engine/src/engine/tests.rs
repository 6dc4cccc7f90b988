use std::sync::Arc;

use shared::models::{
    AddressKind, Customer, DraftAddress, DraftLine, NewLineItem, OrderDraft, OrderFilter,
    OrderStatus, OrderTotals, Product, ORDER_NUMBER_STREAM,
};
use shared::{EngineError, EngineResult};
use tokio::sync::Mutex;

use super::OrderEngine;
use crate::recalc::{ReferenceRecalculator, TotalsRecalculator};
use crate::store::{MemoryOrderStore, OrderStore};

/// Records every invocation on top of the reference arithmetic.
#[derive(Default)]
struct CountingRecalculator {
    calls: Mutex<Vec<i64>>,
}

#[async_trait::async_trait]
impl TotalsRecalculator for CountingRecalculator {
    async fn recalculate(&self, order_id: i64, lines: &[NewLineItem]) -> EngineResult<OrderTotals> {
        self.calls.lock().await.push(order_id);
        ReferenceRecalculator.recalculate(order_id, lines).await
    }
}

struct FailingRecalculator;

#[async_trait::async_trait]
impl TotalsRecalculator for FailingRecalculator {
    async fn recalculate(&self, _: i64, _: &[NewLineItem]) -> EngineResult<OrderTotals> {
        Err(EngineError::storage("totals service unavailable"))
    }
}

fn customer() -> Customer {
    Customer {
        id: 7,
        company: Some("Musterfirma GmbH".to_string()),
        first_name: Some("Erika".to_string()),
        last_name: Some("Mustermann".to_string()),
        street: Some("Hauptstr. 1".to_string()),
        postal_code: Some("10115".to_string()),
        city: Some("Berlin".to_string()),
        country: None,
        country_code: None,
        phone: None,
        email: Some("erika@example.de".to_string()),
    }
}

fn widget() -> Product {
    Product {
        id: 11,
        sku: "A-100".to_string(),
        name: "Widget".to_string(),
        unit_price: 10.0,
        tax_rate: 19.0,
    }
}

async fn seeded_store() -> MemoryOrderStore {
    let store = MemoryOrderStore::new();
    store
        .seed_counter(ORDER_NUMBER_STREAM, 10000, Some("B-"), None)
        .await;
    store.seed_customer(customer()).await;
    store.seed_product(widget()).await;
    store
}

fn engine(store: MemoryOrderStore) -> OrderEngine<MemoryOrderStore> {
    OrderEngine::new(store, Arc::new(ReferenceRecalculator))
}

fn widget_draft(quantity: f64) -> OrderDraft {
    OrderDraft {
        lines: vec![DraftLine {
            product_id: Some(11),
            quantity,
            ..DraftLine::default()
        }],
        ..OrderDraft::new(7)
    }
}

#[tokio::test]
async fn created_order_carries_allocated_number_and_totals() {
    let engine = engine(seeded_store().await);

    let order = engine.create_order(&widget_draft(2.0)).await.unwrap();

    assert_eq!(order.number, "B-10001");
    assert_eq!(order.status, OrderStatus::Open);
    assert_eq!(order.currency, "EUR");
    assert!(!order.cancelled);
    // 2 x 10.00 net, 19% tax
    assert_eq!(order.totals.net, 20.0);
    assert_eq!(order.totals.gross, 23.8);
}

#[tokio::test]
async fn aggregate_has_both_addresses_and_dense_positions() {
    let engine = engine(seeded_store().await);

    let mut draft = widget_draft(1.0);
    draft.lines.push(DraftLine {
        name: Some("Freight".to_string()),
        quantity: 1.0,
        unit_price: Some(4.9),
        tax_rate: Some(19.0),
        ..DraftLine::default()
    });
    let order = engine.create_order(&draft).await.unwrap();

    let view = engine.get_order(order.id, true).await.unwrap().unwrap();
    let details = view.details.unwrap();
    assert_eq!(details.billing.kind, AddressKind::Billing);
    assert_eq!(details.shipping.kind, AddressKind::Shipping);
    // Customer snapshot fell through into the billing address
    assert_eq!(details.billing.city, "Berlin");
    assert_eq!(details.billing.country, "Deutschland");
    let positions: Vec<i32> = details.lines.iter().map(|l| l.position).collect();
    assert_eq!(positions, vec![0, 1]);
    assert_eq!(details.lines[0].sku, "A-100");
    assert_eq!(details.customer.id, 7);
}

#[tokio::test]
async fn concurrent_creation_never_reuses_a_number() {
    let engine = Arc::new(engine(seeded_store().await));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine.create_order(&widget_draft(1.0)).await
        }));
    }

    let mut numbers = Vec::new();
    for handle in handles {
        numbers.push(handle.await.unwrap().unwrap().number);
    }
    numbers.sort();
    numbers.dedup();
    assert_eq!(numbers.len(), 16);
}

#[tokio::test]
async fn recalculation_runs_exactly_once_per_creation_with_the_new_id() {
    let store = seeded_store().await;
    let recalc = Arc::new(CountingRecalculator::default());
    let engine = OrderEngine::new(store, Arc::clone(&recalc) as Arc<dyn TotalsRecalculator>);

    let order = engine.create_order(&widget_draft(2.0)).await.unwrap();

    let calls = recalc.calls.lock().await;
    assert_eq!(*calls, vec![order.id]);
}

#[tokio::test]
async fn failed_recalculation_rolls_the_creation_back() {
    let store = seeded_store().await;
    let engine = OrderEngine::new(store.clone(), Arc::new(FailingRecalculator));

    let err = engine.create_order(&widget_draft(1.0)).await.unwrap_err();
    assert!(matches!(err, EngineError::RecalculationFailed { .. }));

    // Nothing persisted, not even partially
    let listed = store.list_orders(&OrderFilter::default()).await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn failed_recalculation_rolls_a_line_replacement_back() {
    let store = seeded_store().await;
    let engine = engine(store.clone());
    let order = engine.create_order(&widget_draft(2.0)).await.unwrap();

    let failing = OrderEngine::new(store, Arc::new(FailingRecalculator));
    let err = failing
        .update_lines(order.id, &[DraftLine {
            product_id: Some(11),
            quantity: 5.0,
            ..DraftLine::default()
        }])
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::RecalculationFailed { .. }));

    // Old lines and totals survive
    let view = engine.get_order(order.id, true).await.unwrap().unwrap();
    assert_eq!(view.header.totals.net, 20.0);
    assert_eq!(view.details.unwrap().lines[0].quantity, 2.0);
}

#[tokio::test]
async fn status_change_recalculates_totals() {
    let store = seeded_store().await;
    let recalc = Arc::new(CountingRecalculator::default());
    let engine = OrderEngine::new(store, Arc::clone(&recalc) as Arc<dyn TotalsRecalculator>);

    let order = engine.create_order(&widget_draft(1.0)).await.unwrap();
    engine
        .update_status(order.id, OrderStatus::Shipped)
        .await
        .unwrap();

    assert_eq!(recalc.calls.lock().await.len(), 2);
    let view = engine.get_order(order.id, false).await.unwrap().unwrap();
    assert_eq!(view.header.status, OrderStatus::Shipped);
}

#[tokio::test]
async fn replacing_lines_updates_totals_and_positions() {
    let engine = engine(seeded_store().await);
    let order = engine.create_order(&widget_draft(2.0)).await.unwrap();

    engine
        .update_lines(
            order.id,
            &[
                DraftLine {
                    product_id: Some(11),
                    quantity: 1.0,
                    ..DraftLine::default()
                },
                DraftLine {
                    name: Some("Setup fee".to_string()),
                    quantity: 1.0,
                    unit_price: Some(50.0),
                    tax_rate: Some(19.0),
                    ..DraftLine::default()
                },
            ],
        )
        .await
        .unwrap();

    let view = engine.get_order(order.id, true).await.unwrap().unwrap();
    assert_eq!(view.header.totals.net, 60.0);
    let details = view.details.unwrap();
    let positions: Vec<i32> = details.lines.iter().map(|l| l.position).collect();
    assert_eq!(positions, vec![0, 1]);
}

#[tokio::test]
async fn header_only_read_skips_the_detail_load() {
    let store = seeded_store().await;
    let engine = engine(store.clone());
    let order = engine.create_order(&widget_draft(1.0)).await.unwrap();

    let view = engine.get_order(order.id, false).await.unwrap().unwrap();
    assert!(view.details.is_none());
    assert_eq!(store.detail_load_count(), 0);
}

#[tokio::test]
async fn updating_an_address_falls_back_to_the_customer_snapshot() {
    let engine = engine(seeded_store().await);
    let order = engine.create_order(&widget_draft(1.0)).await.unwrap();

    engine
        .update_address(
            order.id,
            AddressKind::Shipping,
            &DraftAddress {
                street: Some("Lagerstr. 9".to_string()),
                city: Some("Hamburg".to_string()),
                ..DraftAddress::default()
            },
        )
        .await
        .unwrap();

    let view = engine.get_order(order.id, true).await.unwrap().unwrap();
    let shipping = view.details.unwrap().shipping;
    assert_eq!(shipping.street, "Lagerstr. 9");
    assert_eq!(shipping.city, "Hamburg");
    assert_eq!(shipping.last_name, "Mustermann"); // snapshot fallback
    assert_eq!(shipping.country, "Deutschland");
}

#[tokio::test]
async fn cancelled_orders_keep_their_number_and_leave_listings() {
    let engine = engine(seeded_store().await);
    let order = engine.create_order(&widget_draft(1.0)).await.unwrap();

    engine.cancel_order(order.id).await.unwrap();

    let view = engine.get_order(order.id, false).await.unwrap().unwrap();
    assert!(view.header.cancelled);
    assert_eq!(view.header.number, "B-10001");

    let listed = engine.list_orders(&OrderFilter::default()).await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn listing_paginates_newest_first() {
    let engine = engine(seeded_store().await);
    let first = engine.create_order(&widget_draft(1.0)).await.unwrap();
    let second = engine.create_order(&widget_draft(1.0)).await.unwrap();
    let third = engine.create_order(&widget_draft(1.0)).await.unwrap();

    let page = engine
        .list_orders(&OrderFilter {
            limit: 1,
            offset: 1,
            ..OrderFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, second.id);

    let all = engine.list_orders(&OrderFilter::default()).await.unwrap();
    let ids: Vec<i64> = all.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![third.id, second.id, first.id]);
}

#[tokio::test]
async fn listing_filters_by_status_and_customer() {
    let engine = engine(seeded_store().await);
    let order = engine.create_order(&widget_draft(1.0)).await.unwrap();
    engine.create_order(&widget_draft(1.0)).await.unwrap();
    engine
        .update_status(order.id, OrderStatus::Shipped)
        .await
        .unwrap();

    let shipped = engine
        .list_orders(&OrderFilter {
            status: Some(OrderStatus::Shipped),
            ..OrderFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(shipped.len(), 1);
    assert_eq!(shipped[0].id, order.id);

    let other_customer = engine
        .list_orders(&OrderFilter {
            customer_id: Some(99),
            ..OrderFilter::default()
        })
        .await
        .unwrap();
    assert!(other_customer.is_empty());
}

#[tokio::test]
async fn deletion_is_blocked_by_documents_and_names_them() {
    let store = seeded_store().await;
    let engine = engine(store.clone());
    let order = engine.create_order(&widget_draft(1.0)).await.unwrap();

    store.seed_invoice(order.id, "RE-2024-001", false).await;
    store.seed_delivery_note(order.id, "LS-10").await;

    let check = engine.can_delete(order.id).await.unwrap();
    assert!(!check.allowed);
    assert!(check.reason.contains("RE-2024-001"));
    assert!(check.reason.contains("LS-10"));

    let err = engine.delete_order(order.id).await.unwrap_err();
    assert!(matches!(err, EngineError::DependencyBlocked(_)));

    // The blocked delete left the order intact
    assert!(engine.get_order(order.id, true).await.unwrap().is_some());
}

#[tokio::test]
async fn cancelled_invoices_do_not_block_deletion() {
    let store = seeded_store().await;
    let engine = engine(store.clone());
    let order = engine.create_order(&widget_draft(1.0)).await.unwrap();

    store.seed_invoice(order.id, "RE-2024-002", true).await;

    let check = engine.can_delete(order.id).await.unwrap();
    assert!(check.allowed);

    engine.delete_order(order.id).await.unwrap();
    assert!(engine.get_order(order.id, false).await.unwrap().is_none());
}

#[tokio::test]
async fn reading_a_missing_order_is_a_normal_none() {
    let engine = engine(seeded_store().await);

    assert!(engine.get_order(999, false).await.unwrap().is_none());
    assert!(engine.get_order(999, true).await.unwrap().is_none());
}

#[tokio::test]
async fn allocation_retries_through_transient_contention() {
    let store = seeded_store().await;
    store.inject_sequence_conflicts(2).await;
    let engine = engine(store);

    let order = engine.create_order(&widget_draft(1.0)).await.unwrap();
    assert_eq!(order.number, "B-10001");
}

#[tokio::test]
async fn allocation_gives_up_after_bounded_retries() {
    let store = seeded_store().await;
    store.inject_sequence_conflicts(3).await;
    let engine = engine(store);

    let err = engine.create_order(&widget_draft(1.0)).await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
}

#[tokio::test]
async fn rejected_draft_burns_no_number() {
    let engine = engine(seeded_store().await);

    let bad = widget_draft(-1.0);
    assert!(matches!(
        engine.create_order(&bad).await.unwrap_err(),
        EngineError::Validation(_)
    ));

    // The first valid creation still gets the first number
    let order = engine.create_order(&widget_draft(1.0)).await.unwrap();
    assert_eq!(order.number, "B-10001");
}

#[tokio::test]
async fn unknown_customer_is_a_not_found() {
    let engine = engine(seeded_store().await);

    let mut draft = widget_draft(1.0);
    draft.customer_id = 999;
    let err = engine.create_order(&draft).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::NotFound { entity: "customer", .. }
    ));
}

#[tokio::test]
async fn missing_counter_row_is_a_configuration_error() {
    let store = MemoryOrderStore::new();
    store.seed_customer(customer()).await;
    store.seed_product(widget()).await;
    let engine = engine(store);

    let err = engine.create_order(&widget_draft(1.0)).await.unwrap_err();
    assert!(matches!(err, EngineError::Configuration(_)));
}

#[tokio::test]
async fn vanished_catalog_row_keeps_the_draft_values() {
    let store = seeded_store().await;
    let engine = engine(store);

    let draft = OrderDraft {
        lines: vec![DraftLine {
            product_id: Some(404), // no such catalog row
            name: Some("Discontinued widget".to_string()),
            quantity: 1.0,
            unit_price: Some(7.5),
            tax_rate: Some(19.0),
            ..DraftLine::default()
        }],
        ..OrderDraft::new(7)
    };
    let order = engine.create_order(&draft).await.unwrap();

    let view = engine.get_order(order.id, true).await.unwrap().unwrap();
    let line = &view.details.unwrap().lines[0];
    assert_eq!(line.product_id, Some(404));
    assert_eq!(line.name, "Discontinued widget");
    assert_eq!(line.unit_price, 7.5);
}

#[tokio::test]
async fn vanished_catalog_row_without_own_values_is_rejected() {
    let engine = engine(seeded_store().await);

    let draft = OrderDraft {
        lines: vec![DraftLine {
            product_id: Some(404), // no such catalog row, no draft fallback
            quantity: 1.0,
            ..DraftLine::default()
        }],
        ..OrderDraft::new(7)
    };
    let err = engine.create_order(&draft).await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    // The rejection happened before allocation, so no number was burnt
    let order = engine.create_order(&widget_draft(1.0)).await.unwrap();
    assert_eq!(order.number, "B-10001");
}
