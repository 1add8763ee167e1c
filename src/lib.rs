//! Storefront Sales
//!
//! Goods catalog, user wallets and the purchase path that ties them together.
//!
//! ## Features
//! - Goods catalog (list in-stock goods, details, add goods)
//! - Wallet balances with top-ups and withdrawals
//! - Atomic sales: stock and balance are debited together or not at all
//! - Append-only purchase records
//! - Sale events on NATS

pub mod api;
pub mod config;
pub mod domain;
pub mod sales;
pub mod store;

pub use config::Config;
pub use sales::{SaleProcessor, SaleReceipt};
pub use store::{memory::MemoryStore, postgres::PgStore, CommitOutcome, Conflict, SalesStore, WalletUpdate};

use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Store lock poisoned")]
    Poisoned,

    #[error("Commit task failed: {0}")]
    CommitTask(#[from] tokio::task::JoinError),
}

#[derive(Error, Debug)]
pub enum SaleError {
    #[error("Good not available")]
    GoodNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("Good is out of stock")]
    OutOfStock,

    #[error("Sale lost to a concurrent update: {0}")]
    Conflict(Conflict),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Coarse classification used to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidRequest,
    Conflict,
    Internal,
}

impl SaleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::GoodNotFound => ErrorKind::NotFound,
            Self::UserNotFound | Self::InsufficientBalance | Self::OutOfStock => ErrorKind::InvalidRequest,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Store(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, SaleError>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;
