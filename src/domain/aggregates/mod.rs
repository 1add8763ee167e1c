//! Aggregates module
pub mod good;
pub mod wallet;
pub mod purchase;
pub mod sale;

pub use good::Good;
pub use wallet::Wallet;
pub use purchase::PurchaseRecord;
pub use sale::SaleDraft;
