//! Catalog lookups (read-only)

use shared::models::Product;
use shared::EngineResult;
use sqlx::PgConnection;

pub async fn find_by_id(conn: &mut PgConnection, id: i64) -> EngineResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT id,
               artikel_nr AS sku,
               name,
               einzelpreis AS unit_price,
               steuersatz  AS tax_rate
        FROM artikel
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(product)
}
