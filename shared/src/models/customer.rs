//! Customer profile (row in `kunde`, read-only from the engine)

use serde::{Deserialize, Serialize};

/// Customer snapshot used to seed order address defaults. The engine never
/// mutates customers; absence of individual fields is normal and falls back
/// to literals during draft normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: i64,
    pub company: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub street: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}
