//! Document store adapter
//!
//! [`SalesStore`] is the only way the rest of the crate touches persisted
//! state. Reads return typed records that have already been checked
//! (non-negative prices, balances and counts). The single write that matters
//! for correctness, [`SalesStore::commit_sale`], is conditional: every backend
//! must apply the debit, the stock decrement and the purchase record together,
//! and only while the conditions that validation observed still hold.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::fmt;

use crate::domain::aggregates::{Good, PurchaseRecord, SaleDraft, Wallet};
use crate::domain::value_objects::{Amount, Balance};
use crate::StoreResult;

#[async_trait]
pub trait SalesStore: Send + Sync {
    async fn find_good(&self, name: &str) -> StoreResult<Option<Good>>;

    /// Goods with at least one unit left, ordered by name.
    async fn list_goods_in_stock(&self, limit: u32) -> StoreResult<Vec<Good>>;

    /// Returns `false` without writing if the name is already taken.
    async fn insert_good(&self, good: &Good) -> StoreResult<bool>;

    async fn find_wallet(&self, username: &str) -> StoreResult<Option<Wallet>>;

    /// Adds funds, refusing to push the balance past the representable maximum.
    async fn credit_wallet(&self, username: &str, amount: Amount) -> StoreResult<WalletUpdate>;

    /// Removes funds only while the balance covers `amount`.
    async fn debit_wallet(&self, username: &str, amount: Amount) -> StoreResult<WalletUpdate>;

    /// Debits the wallet, takes one unit of stock and appends a purchase
    /// record, all or nothing.
    async fn commit_sale(&self, draft: &SaleDraft) -> StoreResult<CommitOutcome>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    Committed { purchase: PurchaseRecord, remaining_balance: Balance },
    Rejected(Conflict),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletUpdate {
    Applied(Balance),
    NotFound,
    InsufficientFunds,
    LimitExceeded,
}

/// The condition that no longer held when a sale was committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    StockExhausted,
    InsufficientFunds,
    PriceChanged,
    GoodRemoved,
    WalletRemoved,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::StockExhausted => "good sold out",
            Self::InsufficientFunds => "balance no longer covers the price",
            Self::PriceChanged => "price changed",
            Self::GoodRemoved => "good no longer exists",
            Self::WalletRemoved => "wallet no longer exists",
        };
        f.write_str(reason)
    }
}
