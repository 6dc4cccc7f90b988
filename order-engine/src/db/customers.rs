//! Customer lookups (read-only)

use shared::models::Customer;
use shared::EngineResult;
use sqlx::PgConnection;

pub async fn find_by_id(conn: &mut PgConnection, id: i64) -> EngineResult<Option<Customer>> {
    let customer = sqlx::query_as::<_, Customer>(
        r#"
        SELECT id,
               firma      AS company,
               vorname    AS first_name,
               nachname   AS last_name,
               strasse    AS street,
               plz        AS postal_code,
               ort        AS city,
               land       AS country,
               land_code  AS country_code,
               telefon    AS phone,
               email
        FROM kunde
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(customer)
}
