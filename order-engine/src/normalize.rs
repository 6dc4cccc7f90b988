//! Draft validation and normalization
//!
//! All fallback rules live here as pure functions: caller-supplied draft
//! fields win, then the customer snapshot, then literal defaults
//! ("Deutschland"/"DE" for country, empty strings elsewhere, "EUR" for the
//! currency, `Open` for the status). The writer only ever persists the
//! fully populated [`NewOrder`] this module produces.

use std::collections::HashMap;

use shared::models::{
    AddressKind, Customer, DraftAddress, DraftLine, NewAddress, NewLineItem, NewOrder, OrderDraft,
    OrderStatus, Product,
};
use shared::{EngineError, EngineResult};

/// Country literals used when neither draft nor customer carry one.
pub const DEFAULT_COUNTRY: &str = "Deutschland";
pub const DEFAULT_COUNTRY_CODE: &str = "DE";
/// Currency used when the draft carries none.
pub const DEFAULT_CURRENCY: &str = "EUR";

/// Maximum allowed unit price per line (1,000,000 currency units)
const MAX_UNIT_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per line
const MAX_QUANTITY: f64 = 99_999.0;

#[inline]
fn require_finite(value: f64, field: &str, position: usize) -> EngineResult<()> {
    if !value.is_finite() {
        return Err(EngineError::validation(format!(
            "line {position}: {field} must be a finite number, got {value}"
        )));
    }
    Ok(())
}

/// Validate a draft before any allocation or write happens.
///
/// Checks positive quantities, sane rates, and that
/// every free-text line (no catalog reference) carries its own name and
/// unit price.
pub fn validate_draft(draft: &OrderDraft) -> EngineResult<()> {
    validate_lines(&draft.lines)?;
    if let Some(currency) = &draft.currency
        && currency.len() != 3
    {
        return Err(EngineError::validation(format!(
            "currency must be a 3-letter code, got '{currency}'"
        )));
    }
    Ok(())
}

/// Validate a line set on its own (used by line replacement, where no full
/// draft exists).
pub fn validate_lines(lines: &[DraftLine]) -> EngineResult<()> {
    for (position, line) in lines.iter().enumerate() {
        validate_line(line, position)?;
    }
    Ok(())
}

/// Reject lines whose catalog reference vanished and whose draft carries
/// no usable values of its own. Without this, resolution would persist an
/// empty name and a zero unit price.
pub fn validate_catalog_refs(
    lines: &[DraftLine],
    products: &HashMap<i64, Product>,
) -> EngineResult<()> {
    for (position, line) in lines.iter().enumerate() {
        if let Some(id) = line.product_id
            && !products.contains_key(&id)
        {
            if line.name.as_deref().unwrap_or("").is_empty() {
                return Err(EngineError::validation(format!(
                    "line {position}: product {id} no longer exists in the catalog and the line carries no name"
                )));
            }
            if line.unit_price.is_none() {
                return Err(EngineError::validation(format!(
                    "line {position}: product {id} no longer exists in the catalog and the line carries no unit_price"
                )));
            }
        }
    }
    Ok(())
}

fn validate_line(line: &DraftLine, position: usize) -> EngineResult<()> {
    require_finite(line.quantity, "quantity", position)?;
    if line.quantity <= 0.0 {
        return Err(EngineError::validation(format!(
            "line {position}: quantity must be positive, got {}",
            line.quantity
        )));
    }
    if line.quantity > MAX_QUANTITY {
        return Err(EngineError::validation(format!(
            "line {position}: quantity exceeds maximum allowed ({MAX_QUANTITY}), got {}",
            line.quantity
        )));
    }

    if let Some(price) = line.unit_price {
        require_finite(price, "unit_price", position)?;
        if price < 0.0 {
            return Err(EngineError::validation(format!(
                "line {position}: unit_price must be non-negative, got {price}"
            )));
        }
        if price > MAX_UNIT_PRICE {
            return Err(EngineError::validation(format!(
                "line {position}: unit_price exceeds maximum allowed ({MAX_UNIT_PRICE}), got {price}"
            )));
        }
    }

    if let Some(rate) = line.tax_rate {
        require_finite(rate, "tax_rate", position)?;
        if rate < 0.0 {
            return Err(EngineError::validation(format!(
                "line {position}: tax_rate must be non-negative, got {rate}"
            )));
        }
    }

    if let Some(discount) = line.discount_percent {
        require_finite(discount, "discount_percent", position)?;
        if !(0.0..=100.0).contains(&discount) {
            return Err(EngineError::validation(format!(
                "line {position}: discount_percent must be between 0 and 100, got {discount}"
            )));
        }
    }

    // Free-text lines have no catalog row to resolve from.
    if line.product_id.is_none() {
        if line.name.as_deref().unwrap_or("").is_empty() {
            return Err(EngineError::validation(format!(
                "line {position}: free-text line requires a name"
            )));
        }
        if line.unit_price.is_none() {
            return Err(EngineError::validation(format!(
                "line {position}: free-text line requires a unit_price"
            )));
        }
    }

    Ok(())
}

/// Build one fully populated address: draft field → customer snapshot →
/// empty string, with the country literals as the last resort.
pub fn normalize_address(
    kind: AddressKind,
    draft: Option<&DraftAddress>,
    customer: Option<&Customer>,
) -> NewAddress {
    let d = draft.cloned().unwrap_or_default();
    let pick = |explicit: Option<String>, snapshot: Option<&String>| -> String {
        explicit
            .filter(|s| !s.is_empty())
            .or_else(|| snapshot.filter(|s| !s.is_empty()).cloned())
            .unwrap_or_default()
    };
    let c = customer;
    let mut address = NewAddress {
        kind,
        company: pick(d.company, c.and_then(|c| c.company.as_ref())),
        first_name: pick(d.first_name, c.and_then(|c| c.first_name.as_ref())),
        last_name: pick(d.last_name, c.and_then(|c| c.last_name.as_ref())),
        street: pick(d.street, c.and_then(|c| c.street.as_ref())),
        postal_code: pick(d.postal_code, c.and_then(|c| c.postal_code.as_ref())),
        city: pick(d.city, c.and_then(|c| c.city.as_ref())),
        country: pick(d.country, c.and_then(|c| c.country.as_ref())),
        country_code: pick(d.country_code, c.and_then(|c| c.country_code.as_ref())),
        phone: pick(d.phone, c.and_then(|c| c.phone.as_ref())),
        email: pick(d.email, c.and_then(|c| c.email.as_ref())),
    };
    if address.country.is_empty() {
        address.country = DEFAULT_COUNTRY.to_string();
    }
    if address.country_code.is_empty() {
        address.country_code = DEFAULT_COUNTRY_CODE.to_string();
    }
    address
}

/// Resolve one draft line against the catalog and assign its sort position.
///
/// Draft fields win over catalog fields; a missing product (already-deleted
/// catalog row) simply leaves the draft values in place.
pub fn normalize_line(
    line: &DraftLine,
    position: i32,
    products: &HashMap<i64, Product>,
) -> NewLineItem {
    let product = line.product_id.and_then(|id| products.get(&id));
    NewLineItem {
        product_id: line.product_id,
        sku: line
            .sku
            .clone()
            .filter(|s| !s.is_empty())
            .or_else(|| product.map(|p| p.sku.clone()))
            .unwrap_or_default(),
        name: line
            .name
            .clone()
            .filter(|s| !s.is_empty())
            .or_else(|| product.map(|p| p.name.clone()))
            .unwrap_or_default(),
        quantity: line.quantity,
        unit_price: line
            .unit_price
            .or_else(|| product.map(|p| p.unit_price))
            .unwrap_or(0.0),
        tax_rate: line
            .tax_rate
            .or_else(|| product.map(|p| p.tax_rate))
            .unwrap_or(0.0),
        discount_percent: line.discount_percent.unwrap_or(0.0),
        position,
    }
}

/// Produce the fully populated order the writer persists.
///
/// `products` holds the catalog rows for every referenced product id that
/// still exists. Line positions come out dense and zero-based in draft
/// order.
pub fn normalize_draft(
    draft: &OrderDraft,
    number: String,
    customer: &Customer,
    products: &HashMap<i64, Product>,
    created_at: i64,
) -> NewOrder {
    let lines = draft
        .lines
        .iter()
        .enumerate()
        .map(|(i, line)| normalize_line(line, i as i32, products))
        .collect();

    NewOrder {
        number,
        customer_id: draft.customer_id,
        status: draft.status.unwrap_or(OrderStatus::Open),
        currency: draft
            .currency
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        comment: draft.comment.clone(),
        billing: normalize_address(AddressKind::Billing, draft.billing.as_ref(), Some(customer)),
        shipping: normalize_address(AddressKind::Shipping, draft.shipping.as_ref(), Some(customer)),
        lines,
        created_at,
    }
}
