//! Currency transfer channel interface
//!
//! The engine only tracks accounted amounts; moving real value is delegated
//! to a channel behind this trait. From the engine's perspective a credit is
//! side-effecting and non-retryable: by the time the channel is invoked the
//! withdrawal is already committed, and re-delivery after a failure is the
//! channel's concern.

use crate::{
    types::{Principal, Wei},
    Error, Result,
};
use async_trait::async_trait;
use dashmap::DashMap;

/// Outbound value-transfer boundary
#[async_trait]
pub trait CurrencyChannel: Send + Sync {
    /// Credit an amount to a recipient
    async fn credit(&self, recipient: &Principal, amount: Wei) -> Result<()>;

    /// Channel name for logging
    fn name(&self) -> &str;
}

/// In-process channel keeping per-principal balances
///
/// Used by the demo and tests; a production deployment would put a payment
/// rail behind [`CurrencyChannel`] instead.
#[derive(Debug, Default)]
pub struct InProcessChannel {
    balances: DashMap<Principal, Wei>,
}

impl InProcessChannel {
    /// Create an empty channel
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance of a recipient (zero if never credited)
    pub fn balance_of(&self, principal: &Principal) -> Wei {
        self.balances
            .get(principal)
            .map(|entry| *entry.value())
            .unwrap_or(Wei::ZERO)
    }
}

#[async_trait]
impl CurrencyChannel for InProcessChannel {
    async fn credit(&self, recipient: &Principal, amount: Wei) -> Result<()> {
        let mut entry = self
            .balances
            .entry(recipient.clone())
            .or_insert(Wei::ZERO);
        *entry = entry.checked_add(amount).ok_or_else(|| {
            Error::Transfer(format!("Balance overflow crediting {}", recipient))
        })?;
        Ok(())
    }

    fn name(&self) -> &str {
        "in-process"
    }
}
