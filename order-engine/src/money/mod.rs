//! Money calculation utilities using rust_decimal for precision
//!
//! Monetary values are stored as `f64` (DOUBLE PRECISION in the shared
//! schema) but every calculation runs on `Decimal` and is rounded to two
//! decimal places before conversion back.

use rust_decimal::prelude::*;
use shared::models::NewLineItem;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal for calculation
///
/// Input values are pre-validated as finite at the draft boundary. If
/// NaN/Infinity somehow reaches here, logs an error and returns ZERO to
/// avoid silent corruption in monetary calculations.
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        // SAFETY: Decimal rounded to 2dp with bounded inputs (validated at
        // the draft boundary) is always representable as f64
        .expect("Decimal rounded to 2dp is always representable as f64")
}

/// Net amount of one line: quantity * unit price, less the discount rate,
/// rounded to 2dp.
pub fn line_net(line: &NewLineItem) -> Decimal {
    let base = to_decimal(line.quantity) * to_decimal(line.unit_price);
    let discount = base * to_decimal(line.discount_percent) / Decimal::ONE_HUNDRED;
    (base - discount).round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Gross amount of one line: the net amount plus its tax, rounded to 2dp.
pub fn line_gross(line: &NewLineItem) -> Decimal {
    let net = line_net(line);
    let tax = net * to_decimal(line.tax_rate) / Decimal::ONE_HUNDRED;
    (net + tax).round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests;
