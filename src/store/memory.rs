//! In-process store
//!
//! Everything lives behind one mutex, so a commit observes and mutates goods,
//! wallets and purchases as a single step. The lock is never held across an
//! await point.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use super::{CommitOutcome, Conflict, SalesStore, WalletUpdate};
use crate::domain::aggregates::{Good, PurchaseRecord, SaleDraft, Wallet};
use crate::domain::value_objects::{Amount, Balance};
use crate::{StoreError, StoreResult};

#[derive(Debug, Default)]
struct State {
    goods: BTreeMap<String, Good>,
    wallets: HashMap<String, Wallet>,
    purchases: Vec<PurchaseRecord>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    fn lock(&self) -> StoreResult<MutexGuard<'_, State>> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Creates or replaces the wallet for `username`.
    pub fn put_wallet(&self, username: &str, balance: Balance) -> StoreResult<()> {
        self.lock()?.wallets.insert(username.to_string(), Wallet::new(username, balance));
        Ok(())
    }

    /// Drops the wallet along with its user.
    pub fn remove_wallet(&self, username: &str) -> StoreResult<bool> {
        Ok(self.lock()?.wallets.remove(username).is_some())
    }

    /// Snapshot of every purchase recorded so far, oldest first.
    pub fn purchases(&self) -> StoreResult<Vec<PurchaseRecord>> {
        Ok(self.lock()?.purchases.clone())
    }
}

#[async_trait]
impl SalesStore for MemoryStore {
    async fn find_good(&self, name: &str) -> StoreResult<Option<Good>> {
        Ok(self.lock()?.goods.get(name).cloned())
    }

    async fn list_goods_in_stock(&self, limit: u32) -> StoreResult<Vec<Good>> {
        let state = self.lock()?;
        Ok(state.goods.values().filter(|g| g.is_in_stock()).take(limit as usize).cloned().collect())
    }

    async fn insert_good(&self, good: &Good) -> StoreResult<bool> {
        let mut state = self.lock()?;
        if state.goods.contains_key(good.name().as_str()) { return Ok(false); }
        state.goods.insert(good.name().to_string(), good.clone());
        Ok(true)
    }

    async fn find_wallet(&self, username: &str) -> StoreResult<Option<Wallet>> {
        Ok(self.lock()?.wallets.get(username).cloned())
    }

    async fn credit_wallet(&self, username: &str, amount: Amount) -> StoreResult<WalletUpdate> {
        let mut state = self.lock()?;
        let Some(wallet) = state.wallets.get_mut(username) else { return Ok(WalletUpdate::NotFound) };
        Ok(wallet.credit(amount).map_or(WalletUpdate::LimitExceeded, WalletUpdate::Applied))
    }

    async fn debit_wallet(&self, username: &str, amount: Amount) -> StoreResult<WalletUpdate> {
        let mut state = self.lock()?;
        let Some(wallet) = state.wallets.get_mut(username) else { return Ok(WalletUpdate::NotFound) };
        Ok(wallet.withdraw(amount).map_or(WalletUpdate::InsufficientFunds, WalletUpdate::Applied))
    }

    async fn commit_sale(&self, draft: &SaleDraft) -> StoreResult<CommitOutcome> {
        let mut state = self.lock()?;

        let Some(mut good) = state.goods.get(&draft.good_name).cloned() else {
            return Ok(CommitOutcome::Rejected(Conflict::GoodRemoved));
        };
        let Some(mut wallet) = state.wallets.get(&draft.username).cloned() else {
            return Ok(CommitOutcome::Rejected(Conflict::WalletRemoved));
        };
        if good.price() != draft.price {
            return Ok(CommitOutcome::Rejected(Conflict::PriceChanged));
        }
        if good.take_one().is_none() {
            return Ok(CommitOutcome::Rejected(Conflict::StockExhausted));
        }
        let Some(remaining_balance) = wallet.debit(draft.price) else {
            return Ok(CommitOutcome::Rejected(Conflict::InsufficientFunds));
        };

        // All conditions hold; nothing has been written yet.
        let purchase = PurchaseRecord::new(&draft.username, &draft.good_name, draft.price);
        state.goods.insert(draft.good_name.clone(), good);
        state.wallets.insert(draft.username.clone(), wallet);
        state.purchases.push(purchase.clone());
        Ok(CommitOutcome::Committed { purchase, remaining_balance })
    }
}
