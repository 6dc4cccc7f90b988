//! Order number allocation
//!
//! Numbers come from a per-stream counter row (`nummernkreis`). The store
//! guarantees exactly-once issuance per call (atomic increment-and-return
//! or a compare-and-swap loop); this module adds the bounded, invisible
//! retry for CAS-style backends and the public formatting.

use shared::models::SequenceValue;
use shared::{EngineError, EngineResult};

use crate::store::OrderStore;

/// Bounded internal retry on allocation contention.
const MAX_ALLOCATION_ATTEMPTS: u32 = 3;

/// Format a counter value into the public number:
/// `prefix + decimal(value) + suffix`, empty affixes when unset.
pub fn format_number(value: &SequenceValue) -> String {
    format!(
        "{}{}{}",
        value.prefix.as_deref().unwrap_or(""),
        value.value,
        value.suffix.as_deref().unwrap_or("")
    )
}

/// Allocate the next formatted number for one stream.
///
/// Contention (`Conflict`) is retried up to [`MAX_ALLOCATION_ATTEMPTS`]
/// times and never surfaces to the caller unless all attempts lose.
pub async fn allocate_number<S: OrderStore + ?Sized>(
    store: &S,
    stream: i32,
) -> EngineResult<String> {
    let mut last_conflict = None;
    for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
        match store.next_sequence(stream).await {
            Ok(value) => return Ok(format_number(&value)),
            Err(err @ EngineError::Conflict(_)) => {
                tracing::debug!(stream, attempt, error = %err, "sequence allocation contention, retrying");
                last_conflict = Some(err);
            }
            Err(other) => return Err(other),
        }
    }
    Err(last_conflict.unwrap_or_else(|| {
        EngineError::conflict(format!("sequence allocation failed for stream {stream}"))
    }))
}
