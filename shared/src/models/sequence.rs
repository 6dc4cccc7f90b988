//! Number sequence streams (rows in `nummernkreis`)

use serde::{Deserialize, Serialize};

/// Numbering stream for public order numbers.
pub const ORDER_NUMBER_STREAM: i32 = 1;

/// One issued counter value plus the stream's formatting affixes.
/// Produced by an atomic increment-and-return; no two callers ever
/// observe the same `value` for the same stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceValue {
    pub value: i64,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
}
