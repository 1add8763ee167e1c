//! Sale transaction processor
//!
//! `process_sale` reads a snapshot of the good and the buyer's wallet,
//! validates it, and hands a [`SaleDraft`] to the store for a conditional
//! commit. The commit runs on its own task: once issued it finishes even if
//! the caller stops waiting, so a sale is never left half applied.

use rust_decimal::Decimal;
use std::sync::Arc;

use crate::domain::aggregates::SaleDraft;
use crate::domain::events::SaleEvent;
use crate::store::{CommitOutcome, SalesStore};
use crate::{Result, SaleError, StoreError};

pub const PURCHASE_SUCCESSFUL: &str = "Purchase successful";

#[derive(Clone, Debug, PartialEq)]
pub struct SaleReceipt {
    pub message: String,
    pub remaining_balance: Decimal,
    pub purchased_item: String,
    pub event: SaleEvent,
}

#[derive(Clone)]
pub struct SaleProcessor {
    store: Arc<dyn SalesStore>,
}

impl SaleProcessor {
    pub fn new(store: Arc<dyn SalesStore>) -> Self { Self { store } }

    #[tracing::instrument(skip(self))]
    pub async fn process_sale(&self, username: &str, good_name: &str) -> Result<SaleReceipt> {
        let good = self.store.find_good(good_name).await?;
        let wallet = match good {
            Some(_) => self.store.find_wallet(username).await?,
            None => None,
        };
        let draft = SaleDraft::validate(good.as_ref(), username, wallet.as_ref()).map_err(|e| {
            tracing::warn!(error = %e, "sale rejected");
            e
        })?;

        let store = Arc::clone(&self.store);
        let commit = tokio::spawn(async move { store.commit_sale(&draft).await });
        let outcome = commit.await.map_err(|e| {
            tracing::error!(error = %e, "sale commit task failed");
            SaleError::Store(StoreError::from(e))
        })??;

        match outcome {
            CommitOutcome::Committed { purchase, remaining_balance } => {
                tracing::info!(purchase_id = %purchase.id, price = %purchase.price.amount(), remaining = %remaining_balance.amount(), "sale committed");
                let event = SaleEvent::Completed {
                    purchase_id: purchase.id,
                    username: purchase.username,
                    good_name: purchase.good_name.clone(),
                    price: purchase.price.amount(),
                    remaining_balance: remaining_balance.amount(),
                };
                Ok(SaleReceipt {
                    message: PURCHASE_SUCCESSFUL.to_string(),
                    remaining_balance: remaining_balance.amount(),
                    purchased_item: purchase.good_name,
                    event,
                })
            }
            CommitOutcome::Rejected(conflict) => {
                tracing::warn!(%conflict, "sale lost at commit");
                Err(SaleError::Conflict(conflict))
            }
        }
    }
}
