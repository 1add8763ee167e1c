//! Domain events
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SaleEvent {
    Completed {
        purchase_id: Uuid,
        username: String,
        good_name: String,
        price: Decimal,
        remaining_balance: Decimal,
    },
}

impl SaleEvent {
    /// NATS subject the event is published on.
    pub fn subject(&self) -> &'static str {
        match self { Self::Completed { .. } => "sales.completed" }
    }
}
