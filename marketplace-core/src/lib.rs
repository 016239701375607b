//! Marketplace Ledger Core
//!
//! Role-gated marketplace ledger: administrators grant roles, store owners
//! manage stores and inventories, customers purchase items by attaching
//! value, and sales accrue to per-store balances the owner can withdraw.
//!
//! # Architecture
//!
//! - **Single Writer**: one actor task owns all state; transactions are
//!   strictly serialized
//! - **All-or-Nothing**: every operation validates all preconditions before
//!   mutating anything
//! - **Event Log**: every committed mutation appends exactly one structured
//!   event
//!
//! # Invariants
//!
//! - Balance conservation: a store's sales balance equals purchases accounted
//!   minus amounts withdrawn, never negative
//! - Index density: live-item positions per store form a dense 0..count
//!   permutation after every transaction
//! - Role growth: administrators and store owners are granted, never revoked
//! - Reentrancy safety: a withdrawal zeroes the balance before the external
//!   transfer is invoked

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod actor;
pub mod config;
pub mod error;
pub mod marketplace;
pub mod metrics;
pub mod roles;
pub mod state;
pub mod transfer;
pub mod types;

// Re-exports
pub use config::{Config, GenesisConfig, LimitsConfig};
pub use error::{Error, Result};
pub use marketplace::Marketplace;
pub use metrics::Metrics;
pub use transfer::{CurrencyChannel, InProcessChannel};
pub use types::{
    EventRecord, Item, ItemId, MarketplaceEvent, Principal, Store, StoreId, Wei,
};
