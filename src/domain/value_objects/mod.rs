//! Value Objects for the sales domain

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest good name, in characters.
pub const MAX_NAME_CHARS: usize = 200;
/// Decimal places a stored amount may carry.
pub const MONEY_SCALE: u32 = 2;
/// Largest amount a `NUMERIC(14, 2)` column holds.
pub const MAX_MONEY: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

/// Checks an amount fits the stored money representation exactly.
pub fn check_money(amount: Decimal) -> Result<(), ValueError> {
    if amount.is_sign_negative() && !amount.is_zero() { return Err(ValueError::NegativeAmount(amount)); }
    if amount.normalize().scale() > MONEY_SCALE { return Err(ValueError::TooPrecise(amount)); }
    if amount > MAX_MONEY { return Err(ValueError::AmountTooLarge(amount)); }
    Ok(())
}

/// Catalog name of a good; doubles as its key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoodName(String);

impl GoodName {
    pub fn new(value: impl Into<String>) -> Result<Self, ValueError> {
        let value = value.into().trim().to_string();
        if value.is_empty() { return Err(ValueError::EmptyName); }
        if value.chars().count() > MAX_NAME_CHARS { return Err(ValueError::NameTooLong); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for GoodName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Price of a single unit. Never negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    pub fn new(amount: Decimal) -> Result<Self, ValueError> {
        check_money(amount)?;
        Ok(Self(amount))
    }
    pub fn amount(&self) -> Decimal { self.0 }
}

/// Sum moved into or out of a wallet. Always positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(amount: Decimal) -> Result<Self, ValueError> {
        check_money(amount)?;
        if amount.is_zero() { return Err(ValueError::ZeroAmount); }
        Ok(Self(amount))
    }
    pub fn value(&self) -> Decimal { self.0 }
}

/// Wallet balance. Never negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balance(Decimal);

impl Balance {
    pub fn new(amount: Decimal) -> Result<Self, ValueError> {
        check_money(amount)?;
        Ok(Self(amount))
    }
    pub fn zero() -> Self { Self(Decimal::ZERO) }
    pub fn amount(&self) -> Decimal { self.0 }
    pub fn covers(&self, price: Price) -> bool { self.0 >= price.0 }

    /// Balance left after paying `price`, or `None` if it does not cover it.
    pub fn debit(&self, price: Price) -> Option<Self> {
        if !self.covers(price) { return None; }
        self.0.checked_sub(price.0).map(Self)
    }

    /// Balance after adding `amount`, or `None` past [`MAX_MONEY`].
    pub fn credit(&self, amount: Amount) -> Option<Self> {
        self.0.checked_add(amount.0).filter(|total| *total <= MAX_MONEY).map(Self)
    }

    pub fn withdraw(&self, amount: Amount) -> Option<Self> {
        if self.0 < amount.0 { return None; }
        self.0.checked_sub(amount.0).map(Self)
    }
}

impl Default for Balance { fn default() -> Self { Self::zero() } }

/// Units of a good left in stock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stock(u32);

impl Stock {
    pub fn new(value: u32) -> Self { Self(value) }
    pub fn value(&self) -> u32 { self.0 }
    pub fn is_zero(&self) -> bool { self.0 == 0 }
    pub fn take_one(&self) -> Option<Self> { self.0.checked_sub(1).map(Self) }
}

impl TryFrom<i32> for Stock {
    type Error = ValueError;
    fn try_from(value: i32) -> Result<Self, Self::Error> {
        u32::try_from(value).map(Self).map_err(|_| ValueError::NegativeCount(value))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("name too long")]
    NameTooLong,
    #[error("amount must not be negative: {0}")]
    NegativeAmount(Decimal),
    #[error("amount must be positive")]
    ZeroAmount,
    #[error("amount has more than two decimal places: {0}")]
    TooPrecise(Decimal),
    #[error("amount too large: {0}")]
    AmountTooLarge(Decimal),
    #[error("count must not be negative: {0}")]
    NegativeCount(i32),
}
