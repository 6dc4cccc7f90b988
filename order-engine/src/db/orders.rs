//! Order aggregate persistence: header, addresses, line items
//!
//! Every function takes a `&mut PgConnection` so the store can compose them
//! inside one transaction. None of them commits.

use shared::models::{
    AddressKind, NewAddress, NewLineItem, NewOrder, Order, OrderAddress, OrderFilter,
    OrderLineItem, OrderStatus, OrderTotals,
};
use shared::{EngineError, EngineResult};
use sqlx::PgConnection;

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    number: String,
    customer_id: i64,
    created_at: i64,
    updated_at: i64,
    status: i16,
    cancelled: bool,
    currency: String,
    net: f64,
    gross: f64,
    comment: Option<String>,
}

impl OrderRow {
    fn into_order(self) -> EngineResult<Order> {
        let status = OrderStatus::from_i16(self.status).ok_or_else(|| {
            EngineError::storage(format!(
                "order {} carries unknown status code {}",
                self.id, self.status
            ))
        })?;
        Ok(Order {
            id: self.id,
            number: self.number,
            customer_id: self.customer_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            status,
            cancelled: self.cancelled,
            currency: self.currency,
            totals: OrderTotals {
                net: self.net,
                gross: self.gross,
            },
            comment: self.comment,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: i64,
    order_id: i64,
    kind: i16,
    company: String,
    first_name: String,
    last_name: String,
    street: String,
    postal_code: String,
    city: String,
    country: String,
    country_code: String,
    phone: String,
    email: String,
}

impl AddressRow {
    fn into_address(self) -> EngineResult<OrderAddress> {
        let kind = AddressKind::from_i16(self.kind).ok_or_else(|| {
            EngineError::storage(format!(
                "address {} carries unknown kind code {}",
                self.id, self.kind
            ))
        })?;
        Ok(OrderAddress {
            id: self.id,
            order_id: self.order_id,
            kind,
            company: self.company,
            first_name: self.first_name,
            last_name: self.last_name,
            street: self.street,
            postal_code: self.postal_code,
            city: self.city,
            country: self.country,
            country_code: self.country_code,
            phone: self.phone,
            email: self.email,
        })
    }
}

const HEADER_COLUMNS: &str = r#"
    id,
    bestell_nr   AS number,
    kunde_id     AS customer_id,
    erstellt_am  AS created_at,
    geaendert_am AS updated_at,
    status,
    storniert    AS cancelled,
    waehrung     AS currency,
    netto        AS net,
    brutto       AS gross,
    kommentar    AS comment
"#;

/// Insert the header row with zeroed totals. The totals recalculation
/// writes the real values before the transaction commits.
pub async fn insert_header(conn: &mut PgConnection, order: &NewOrder) -> EngineResult<i64> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO bestellung
            (bestell_nr, kunde_id, erstellt_am, geaendert_am, status,
             storniert, waehrung, netto, brutto, kommentar)
        VALUES ($1, $2, $3, $3, $4, FALSE, $5, 0, 0, $6)
        RETURNING id
        "#,
    )
    .bind(&order.number)
    .bind(order.customer_id)
    .bind(order.created_at)
    .bind(order.status.as_i16())
    .bind(&order.currency)
    .bind(&order.comment)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn insert_address(
    conn: &mut PgConnection,
    order_id: i64,
    address: &NewAddress,
) -> EngineResult<()> {
    sqlx::query(
        r#"
        INSERT INTO bestellung_adresse
            (bestellung_id, art, firma, vorname, nachname, strasse, plz,
             ort, land, land_code, telefon, email)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(order_id)
    .bind(address.kind.as_i16())
    .bind(&address.company)
    .bind(&address.first_name)
    .bind(&address.last_name)
    .bind(&address.street)
    .bind(&address.postal_code)
    .bind(&address.city)
    .bind(&address.country)
    .bind(&address.country_code)
    .bind(&address.phone)
    .bind(&address.email)
    .execute(conn)
    .await?;
    Ok(())
}

/// Bulk line insert via UNNEST, one round trip for the whole order.
pub async fn insert_lines(
    conn: &mut PgConnection,
    order_id: i64,
    lines: &[NewLineItem],
) -> EngineResult<()> {
    if lines.is_empty() {
        return Ok(());
    }

    let mut product_ids = Vec::with_capacity(lines.len());
    let mut skus = Vec::with_capacity(lines.len());
    let mut names = Vec::with_capacity(lines.len());
    let mut quantities = Vec::with_capacity(lines.len());
    let mut unit_prices = Vec::with_capacity(lines.len());
    let mut tax_rates = Vec::with_capacity(lines.len());
    let mut discounts = Vec::with_capacity(lines.len());
    let mut positions = Vec::with_capacity(lines.len());
    for line in lines {
        product_ids.push(line.product_id);
        skus.push(line.sku.clone());
        names.push(line.name.clone());
        quantities.push(line.quantity);
        unit_prices.push(line.unit_price);
        tax_rates.push(line.tax_rate);
        discounts.push(line.discount_percent);
        positions.push(line.position);
    }

    sqlx::query(
        r#"
        INSERT INTO bestellung_position
            (bestellung_id, artikel_id, artikel_nr, name, menge,
             einzelpreis, steuersatz, rabatt, sortierung)
        SELECT $1, * FROM UNNEST(
            $2::BIGINT[], $3::TEXT[], $4::TEXT[], $5::DOUBLE PRECISION[],
            $6::DOUBLE PRECISION[], $7::DOUBLE PRECISION[],
            $8::DOUBLE PRECISION[], $9::INT[]
        )
        "#,
    )
    .bind(order_id)
    .bind(&product_ids)
    .bind(&skus)
    .bind(&names)
    .bind(&quantities)
    .bind(&unit_prices)
    .bind(&tax_rates)
    .bind(&discounts)
    .bind(&positions)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn delete_lines(conn: &mut PgConnection, order_id: i64) -> EngineResult<()> {
    sqlx::query("DELETE FROM bestellung_position WHERE bestellung_id = $1")
        .bind(order_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Persist recalculated totals and bump the modification timestamp.
pub async fn write_totals(
    conn: &mut PgConnection,
    order_id: i64,
    totals: &OrderTotals,
    updated_at: i64,
) -> EngineResult<()> {
    sqlx::query(
        r#"
        UPDATE bestellung
        SET netto = $2, brutto = $3, geaendert_am = $4
        WHERE id = $1
        "#,
    )
    .bind(order_id)
    .bind(totals.net)
    .bind(totals.gross)
    .bind(updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Bump the modification timestamp only.
pub async fn touch(
    conn: &mut PgConnection,
    order_id: i64,
    updated_at: i64,
) -> EngineResult<()> {
    sqlx::query("UPDATE bestellung SET geaendert_am = $2 WHERE id = $1")
        .bind(order_id)
        .bind(updated_at)
        .execute(conn)
        .await?;
    Ok(())
}

/// Returns false when the order does not exist.
pub async fn set_status(
    conn: &mut PgConnection,
    order_id: i64,
    status: OrderStatus,
    updated_at: i64,
) -> EngineResult<bool> {
    let result = sqlx::query(
        "UPDATE bestellung SET status = $2, geaendert_am = $3 WHERE id = $1",
    )
    .bind(order_id)
    .bind(status.as_i16())
    .bind(updated_at)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Returns false when the order does not exist.
pub async fn set_cancelled(
    conn: &mut PgConnection,
    order_id: i64,
    updated_at: i64,
) -> EngineResult<bool> {
    let result = sqlx::query(
        "UPDATE bestellung SET storniert = TRUE, geaendert_am = $2 WHERE id = $1",
    )
    .bind(order_id)
    .bind(updated_at)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Overwrite one of the two owned address rows in place. Returns false
/// when no row of that kind exists (i.e. no such order).
pub async fn update_address(
    conn: &mut PgConnection,
    order_id: i64,
    kind: AddressKind,
    address: &NewAddress,
) -> EngineResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE bestellung_adresse
        SET firma = $3, vorname = $4, nachname = $5, strasse = $6,
            plz = $7, ort = $8, land = $9, land_code = $10,
            telefon = $11, email = $12
        WHERE bestellung_id = $1 AND art = $2
        "#,
    )
    .bind(order_id)
    .bind(kind.as_i16())
    .bind(&address.company)
    .bind(&address.first_name)
    .bind(&address.last_name)
    .bind(&address.street)
    .bind(&address.postal_code)
    .bind(&address.city)
    .bind(&address.country)
    .bind(&address.country_code)
    .bind(&address.phone)
    .bind(&address.email)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fetch_header(conn: &mut PgConnection, id: i64) -> EngineResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(&format!(
        "SELECT {HEADER_COLUMNS} FROM bestellung WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;
    row.map(OrderRow::into_order).transpose()
}

/// Lock the header row for the remainder of the transaction. Returns false
/// when the order does not exist.
pub async fn lock_header(conn: &mut PgConnection, id: i64) -> EngineResult<bool> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM bestellung WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row.is_some())
}

pub async fn fetch_lines(
    conn: &mut PgConnection,
    order_id: i64,
) -> EngineResult<Vec<OrderLineItem>> {
    let lines = sqlx::query_as::<_, OrderLineItem>(
        r#"
        SELECT id,
               bestellung_id AS order_id,
               artikel_id    AS product_id,
               artikel_nr    AS sku,
               name,
               menge         AS quantity,
               einzelpreis   AS unit_price,
               steuersatz    AS tax_rate,
               rabatt        AS discount_percent,
               sortierung    AS position
        FROM bestellung_position
        WHERE bestellung_id = $1
        ORDER BY sortierung ASC
        "#,
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(lines)
}

pub async fn fetch_addresses(
    conn: &mut PgConnection,
    order_id: i64,
) -> EngineResult<Vec<OrderAddress>> {
    let rows: Vec<AddressRow> = sqlx::query_as(
        r#"
        SELECT id,
               bestellung_id AS order_id,
               art           AS kind,
               firma         AS company,
               vorname       AS first_name,
               nachname      AS last_name,
               strasse       AS street,
               plz           AS postal_code,
               ort           AS city,
               land          AS country,
               land_code     AS country_code,
               telefon       AS phone,
               email
        FROM bestellung_adresse
        WHERE bestellung_id = $1
        ORDER BY art ASC
        "#,
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    rows.into_iter().map(AddressRow::into_address).collect()
}

/// Non-cancelled orders matching the filter, newest first. NULL binds
/// disable the corresponding predicate.
pub async fn list(conn: &mut PgConnection, filter: &OrderFilter) -> EngineResult<Vec<Order>> {
    let rows: Vec<OrderRow> = sqlx::query_as(&format!(
        r#"
        SELECT {HEADER_COLUMNS}
        FROM bestellung
        WHERE storniert = FALSE
          AND ($1::SMALLINT IS NULL OR status = $1)
          AND ($2::BIGINT IS NULL OR erstellt_am >= $2)
          AND ($3::BIGINT IS NULL OR erstellt_am <= $3)
          AND ($4::BIGINT IS NULL OR kunde_id = $4)
        ORDER BY erstellt_am DESC, id DESC
        LIMIT $5 OFFSET $6
        "#
    ))
    .bind(filter.status.map(OrderStatus::as_i16))
    .bind(filter.date_from)
    .bind(filter.date_to)
    .bind(filter.customer_id)
    .bind(filter.limit)
    .bind(filter.offset)
    .fetch_all(conn)
    .await?;
    Ok(collect_known(rows))
}

/// Convert listing rows, skipping any whose status code this engine does
/// not know. The schema is shared with the warehouse/accounting process,
/// which may write codes outside our lifecycle; one foreign row must not
/// take down the whole page.
fn collect_known(rows: Vec<OrderRow>) -> Vec<Order> {
    rows.into_iter()
        .filter_map(|row| {
            let (id, status) = (row.id, row.status);
            match row.into_order() {
                Ok(order) => Some(order),
                Err(_) => {
                    tracing::warn!(order_id = id, status, "skipping order with foreign status code");
                    None
                }
            }
        })
        .collect()
}

/// Remove the order and its owned rows. Lines and addresses go first so
/// the header delete never trips the foreign keys.
pub async fn delete_order_rows(conn: &mut PgConnection, order_id: i64) -> EngineResult<()> {
    sqlx::query("DELETE FROM bestellung_position WHERE bestellung_id = $1")
        .bind(order_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM bestellung_adresse WHERE bestellung_id = $1")
        .bind(order_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM bestellung WHERE id = $1")
        .bind(order_id)
        .execute(conn)
        .await?;
    Ok(())
}
