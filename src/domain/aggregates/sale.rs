//! Sale validation
//!
//! A sale is checked against a snapshot of one good and one wallet before any
//! write is attempted. The checks run in a fixed order and the first failure
//! wins:
//!
//! 1. the good exists
//! 2. the user exists and their balance covers the price
//! 3. the good has at least one unit in stock
//!
//! Passing validation does not reserve anything. The store re-checks the
//! same conditions atomically when the draft is committed.

use crate::domain::aggregates::{Good, Wallet};
use crate::domain::value_objects::Price;
use crate::SaleError;

/// A validated, not yet committed, sale.
#[derive(Clone, Debug, PartialEq)]
pub struct SaleDraft {
    pub username: String,
    pub good_name: String,
    pub price: Price,
}

impl SaleDraft {
    pub fn validate(good: Option<&Good>, username: &str, wallet: Option<&Wallet>) -> Result<Self, SaleError> {
        let good = good.ok_or(SaleError::GoodNotFound)?;
        let wallet = wallet.ok_or(SaleError::UserNotFound)?;
        if !wallet.balance().covers(good.price()) {
            return Err(SaleError::InsufficientBalance);
        }
        if !good.is_in_stock() {
            return Err(SaleError::OutOfStock);
        }
        Ok(Self { username: username.to_string(), good_name: good.name().to_string(), price: good.price() })
    }
}
