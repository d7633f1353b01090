//! Minimal single-node ledger: signed transfers sealed into hash-linked,
//! proof-of-work blocks that can be audited end to end.

pub mod blockchain;
pub mod config;
pub mod error;
pub mod transaction;
pub mod wallet;

pub use blockchain::{Block, Ledger};
pub use config::{LedgerConfig, PendingPolicy};
pub use error::{AdmissionError, LedgerError};
pub use transaction::{Transaction, TxKind};
pub use wallet::Wallet;
