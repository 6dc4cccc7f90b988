//! Aggregate totals recalculation seam
//!
//! The authoritative totals computation is owned by the surrounding
//! warehouse/accounting system; the engine only invokes it. It is modelled
//! as an injected capability so storage backends can run it inside the same
//! atomic unit as the triggering mutation, and so tests can substitute a
//! deterministic stub.
//!
//! Contract:
//! - called after order creation, any line-item change, and any status
//!   change (mandatory, never skipped)
//! - idempotent: the same line snapshot yields the same totals
//! - a failure aborts the enclosing operation; the backend must roll the
//!   whole mutation back

use async_trait::async_trait;
use shared::models::{NewLineItem, OrderTotals};
use shared::{EngineError, EngineResult};

use crate::money;

/// Derives authoritative monetary totals for one order.
///
/// The `lines` snapshot is the order's line items as they stand inside the
/// in-flight transaction (the persisted state the collaborator would read
/// once committed).
#[async_trait]
pub trait TotalsRecalculator: Send + Sync {
    async fn recalculate(&self, order_id: i64, lines: &[NewLineItem]) -> EngineResult<OrderTotals>;
}

/// Wrap a recalculation error so the surfaced failure names the order.
pub(crate) fn recalc_failed(order_id: i64, err: EngineError) -> EngineError {
    match err {
        e @ EngineError::RecalculationFailed { .. } => e,
        other => EngineError::recalculation_failed(order_id, other.to_string()),
    }
}

/// Reference implementation of the warehouse system's arithmetic.
///
/// Per line: net = quantity * unit price less the discount rate, gross =
/// net plus tax, each rounded to 2dp half-up; totals are the sums. Used as
/// the dev/test stand-in for the external collaborator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceRecalculator;

#[async_trait]
impl TotalsRecalculator for ReferenceRecalculator {
    async fn recalculate(&self, order_id: i64, lines: &[NewLineItem]) -> EngineResult<OrderTotals> {
        let mut net = rust_decimal::Decimal::ZERO;
        let mut gross = rust_decimal::Decimal::ZERO;
        for line in lines {
            net += money::line_net(line);
            gross += money::line_gross(line);
        }
        let totals = OrderTotals {
            net: money::to_f64(net),
            gross: money::to_f64(gross),
        };
        tracing::debug!(order_id, net = totals.net, gross = totals.gross, "totals recalculated");
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines() -> Vec<NewLineItem> {
        vec![
            NewLineItem {
                product_id: Some(1),
                sku: "A-100".to_string(),
                name: "Widget".to_string(),
                quantity: 2.0,
                unit_price: 10.0,
                tax_rate: 19.0,
                discount_percent: 0.0,
                position: 0,
            },
            NewLineItem {
                product_id: None,
                sku: String::new(),
                name: "Freight".to_string(),
                quantity: 1.0,
                unit_price: 4.9,
                tax_rate: 19.0,
                discount_percent: 0.0,
                position: 1,
            },
        ]
    }

    #[tokio::test]
    async fn reference_totals_sum_lines() {
        let totals = ReferenceRecalculator
            .recalculate(1, &lines())
            .await
            .unwrap();
        assert_eq!(totals.net, 24.9);
        assert_eq!(totals.gross, 29.63); // 23.80 + 5.83
    }

    #[tokio::test]
    async fn recalculation_is_idempotent() {
        let snapshot = lines();
        let first = ReferenceRecalculator.recalculate(1, &snapshot).await.unwrap();
        let second = ReferenceRecalculator.recalculate(1, &snapshot).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn empty_order_has_zero_totals() {
        let totals = ReferenceRecalculator.recalculate(1, &[]).await.unwrap();
        assert_eq!(totals, OrderTotals::default());
    }

    #[test]
    fn recalc_failed_preserves_existing_variant() {
        let inner = EngineError::recalculation_failed(5, "boom");
        assert_eq!(recalc_failed(5, inner.clone()), inner);

        let wrapped = recalc_failed(5, EngineError::storage("io"));
        match wrapped {
            EngineError::RecalculationFailed { order_id, .. } => assert_eq!(order_id, 5),
            other => panic!("expected RecalculationFailed, got {other:?}"),
        }
    }
}
