//! Wallet Aggregate

use crate::domain::value_objects::{Amount, Balance, Price};

/// Per-user balance that funds purchases. Lives and dies with its user.
#[derive(Clone, Debug, PartialEq)]
pub struct Wallet {
    username: String,
    balance: Balance,
}

impl Wallet {
    pub fn new(username: impl Into<String>, balance: Balance) -> Self {
        Self { username: username.into(), balance }
    }

    pub fn username(&self) -> &str { &self.username }
    pub fn balance(&self) -> Balance { self.balance }

    pub fn debit(&mut self, price: Price) -> Option<Balance> {
        self.balance = self.balance.debit(price)?;
        Some(self.balance)
    }

    pub fn credit(&mut self, amount: Amount) -> Option<Balance> {
        self.balance = self.balance.credit(amount)?;
        Some(self.balance)
    }

    pub fn withdraw(&mut self, amount: Amount) -> Option<Balance> {
        self.balance = self.balance.withdraw(amount)?;
        Some(self.balance)
    }
}
