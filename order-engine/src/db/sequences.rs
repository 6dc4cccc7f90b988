//! Number stream counter operations

use shared::models::SequenceValue;
use shared::{EngineError, EngineResult};
use sqlx::PgConnection;

/// Increment the counter of one stream and return the issued value.
///
/// Read-then-increment as two statements races under concurrent creation;
/// the single UPDATE .. RETURNING makes the database serialize issuance per
/// stream row, so every caller gets a distinct value.
pub async fn next_value(conn: &mut PgConnection, stream: i32) -> EngineResult<SequenceValue> {
    let row: Option<(i64, Option<String>, Option<String>)> = sqlx::query_as(
        r#"
        UPDATE nummernkreis
        SET aktueller_wert = aktueller_wert + 1
        WHERE id = $1
        RETURNING aktueller_wert, praefix, suffix
        "#,
    )
    .bind(stream)
    .fetch_optional(conn)
    .await?;

    match row {
        Some((value, prefix, suffix)) => Ok(SequenceValue {
            value,
            prefix,
            suffix,
        }),
        None => Err(EngineError::configuration(format!(
            "no counter row configured for number stream {stream}"
        ))),
    }
}
