//! Coin Ledger Core
//!
//! A small ledger of named accounts ("wallets") and a reserve account
//! ("treasure") whose balances move only through paired, auditable
//! transactions against a key-value document store.
//!
//! # Architecture
//!
//! - **Idempotency**: every balance mutation is guarded by a unique
//!   (subject, action, action-entity-id) transaction record
//! - **Audit trail**: one immutable log entry per applied mutation, never
//!   updated or deleted
//! - **Ordering**: validate balance, record the log entry, commit the
//!   balance; a log entry is never orphaned and a balance never
//!   double-applied
//!
//! # Invariants
//!
//! - Wallet and treasure balances are never negative
//! - At most one transaction record ever exists per triple
//! - Compound transfers do not roll back a committed first leg; the log is
//!   the reconciliation source of truth

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod balance;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod keyspace;
pub mod ledger;
pub mod metrics;
pub mod query;
pub mod store;
pub mod txlog;
pub mod types;

// Re-exports
pub use config::Config;
pub use dispatch::{Dispatcher, Response};
pub use error::{Error, Result};
pub use keyspace::{CompositeKey, Subject};
pub use ledger::Ledger;
pub use query::Page;
pub use store::Store;
pub use types::{
    DocType, OpContext, Options, Treasure, TreasureTransaction, Wallet, WalletTransaction,
};
