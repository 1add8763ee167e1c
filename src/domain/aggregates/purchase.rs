//! Purchase Record

use chrono::{DateTime, Utc};
use uuid::Uuid;
use crate::domain::value_objects::Price;

/// Append-only record of a committed sale.
#[derive(Clone, Debug, PartialEq)]
pub struct PurchaseRecord {
    pub id: Uuid,
    pub username: String,
    pub good_name: String,
    pub price: Price,
    pub created_at: DateTime<Utc>,
}

impl PurchaseRecord {
    pub fn new(username: impl Into<String>, good_name: impl Into<String>, price: Price) -> Self {
        Self { id: Uuid::now_v7(), username: username.into(), good_name: good_name.into(), price, created_at: Utc::now() }
    }
}
