//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `marketplace_transactions_total` - Committed mutations
//! - `marketplace_rejections_total` - Rejected transactions
//! - `marketplace_purchases_total` - Committed purchases
//! - `marketplace_withdrawals_total` - Committed withdrawals
//! - `marketplace_events_total` - Events appended to the log

use prometheus::{IntCounter, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
///
/// Each instance owns its registry, so independent engines (and parallel
/// tests) never collide on registration.
#[derive(Clone)]
pub struct Metrics {
    /// Committed mutations
    pub transactions_total: IntCounter,

    /// Rejected transactions
    pub rejections_total: IntCounter,

    /// Committed purchases
    pub purchases_total: IntCounter,

    /// Committed withdrawals
    pub withdrawals_total: IntCounter,

    /// Events appended to the log
    pub events_total: IntCounter,

    /// Prometheus registry
    registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let transactions_total = IntCounter::with_opts(Opts::new(
            "marketplace_transactions_total",
            "Committed mutations",
        ))?;
        registry.register(Box::new(transactions_total.clone()))?;

        let rejections_total = IntCounter::with_opts(Opts::new(
            "marketplace_rejections_total",
            "Rejected transactions",
        ))?;
        registry.register(Box::new(rejections_total.clone()))?;

        let purchases_total = IntCounter::with_opts(Opts::new(
            "marketplace_purchases_total",
            "Committed purchases",
        ))?;
        registry.register(Box::new(purchases_total.clone()))?;

        let withdrawals_total = IntCounter::with_opts(Opts::new(
            "marketplace_withdrawals_total",
            "Committed withdrawals",
        ))?;
        registry.register(Box::new(withdrawals_total.clone()))?;

        let events_total = IntCounter::with_opts(Opts::new(
            "marketplace_events_total",
            "Events appended to the log",
        ))?;
        registry.register(Box::new(events_total.clone()))?;

        Ok(Self {
            transactions_total,
            rejections_total,
            purchases_total,
            withdrawals_total,
            events_total,
            registry,
        })
    }

    /// Record a committed mutation and its event
    pub fn record_commit(&self) {
        self.transactions_total.inc();
        self.events_total.inc();
    }

    /// Record a rejected transaction
    pub fn record_rejection(&self) {
        self.rejections_total.inc();
    }

    /// Record a committed purchase
    pub fn record_purchase(&self) {
        self.purchases_total.inc();
    }

    /// Record a committed withdrawal
    pub fn record_withdrawal(&self) {
        self.withdrawals_total.inc();
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("transactions_total", &self.transactions_total.get())
            .field("rejections_total", &self.rejections_total.get())
            .finish()
    }
}
