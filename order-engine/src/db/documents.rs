//! Downstream document queries: invoices and delivery notes
//!
//! The engine only ever reads these tables. Invoices feed the detail view
//! and the deletion guard; delivery notes exist solely for the guard.

use shared::models::{BlockingDocuments, DocumentRef, Invoice};
use shared::EngineResult;
use sqlx::PgConnection;

/// Non-cancelled invoices of one order, for the detail view.
pub async fn invoices_for_order(
    conn: &mut PgConnection,
    order_id: i64,
) -> EngineResult<Vec<Invoice>> {
    let invoices = sqlx::query_as::<_, Invoice>(
        r#"
        SELECT id,
               bestellung_id AS order_id,
               rechnung_nr   AS number,
               storniert     AS cancelled,
               erstellt_am   AS created_at
        FROM rechnung
        WHERE bestellung_id = $1 AND storniert = FALSE
        ORDER BY erstellt_am ASC, id ASC
        "#,
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(invoices)
}

/// Everything that blocks deletion of one order. A cancelled invoice does
/// not block; a delivery note always does.
pub async fn blocking_documents(
    conn: &mut PgConnection,
    order_id: i64,
) -> EngineResult<BlockingDocuments> {
    let invoices = sqlx::query_as::<_, DocumentRef>(
        r#"
        SELECT id, rechnung_nr AS number
        FROM rechnung
        WHERE bestellung_id = $1 AND storniert = FALSE
        ORDER BY id ASC
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    let delivery_notes = sqlx::query_as::<_, DocumentRef>(
        r#"
        SELECT id, lieferschein_nr AS number
        FROM lieferschein
        WHERE bestellung_id = $1
        ORDER BY id ASC
        "#,
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;

    Ok(BlockingDocuments {
        invoices,
        delivery_notes,
    })
}
