//! Order addresses (rows in `bestellung_adresse`)

use serde::{Deserialize, Serialize};

/// Discriminates the two address rows every order owns.
/// Exactly one of each kind exists per order, never more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressKind {
    Billing = 1,
    Shipping = 2,
}

impl AddressKind {
    pub fn as_i16(self) -> i16 {
        self as i16
    }

    pub fn from_i16(code: i16) -> Option<Self> {
        match code {
            1 => Some(Self::Billing),
            2 => Some(Self::Shipping),
            _ => None,
        }
    }
}

/// Persisted order address. Created with the order, updatable afterwards,
/// deleted only together with the order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAddress {
    pub id: i64,
    pub order_id: i64,
    pub kind: AddressKind,
    pub company: String,
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
    pub country_code: String,
    pub phone: String,
    pub email: String,
}

/// Fully populated address ready for insertion (output of draft
/// normalization; every fallback already applied).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAddress {
    pub kind: AddressKind,
    pub company: String,
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
    pub country_code: String,
    pub phone: String,
    pub email: String,
}
