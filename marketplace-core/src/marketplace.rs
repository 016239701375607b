//! Main marketplace orchestration layer
//!
//! Ties the state machine, actor, transfer channel, and metrics together
//! into the engine's public API. Every operation takes the invoking
//! principal as its first argument; the engine trusts that identity as
//! given and enforces roles and ownership on top of it.
//!
//! # Example
//!
//! ```no_run
//! use marketplace_core::{Config, Marketplace, Principal};
//!
//! #[tokio::main]
//! async fn main() -> marketplace_core::Result<()> {
//!     let config = Config::default();
//!     let market = Marketplace::open(config)?;
//!
//!     let deployer = Principal::new("genesis-administrator");
//!     market
//!         .add_store_owner(deployer, Principal::new("0xowner"))
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

use crate::{
    actor::{spawn_marketplace_actor, MarketplaceHandle},
    metrics::Metrics,
    state::MarketplaceState,
    transfer::{CurrencyChannel, InProcessChannel},
    types::{EventRecord, Item, ItemId, Principal, Store, StoreId, Wei},
    Config, Result,
};
use std::sync::Arc;

/// Main marketplace engine interface
pub struct Marketplace {
    /// Actor handle
    handle: MarketplaceHandle,

    /// Metrics collector
    metrics: Metrics,

    /// Configuration
    config: Config,
}

impl Marketplace {
    /// Open the engine with an in-process transfer channel
    pub fn open(config: Config) -> Result<Self> {
        Self::open_with_channel(config, Arc::new(InProcessChannel::new()))
    }

    /// Open the engine with a caller-supplied transfer channel
    pub fn open_with_channel(config: Config, channel: Arc<dyn CurrencyChannel>) -> Result<Self> {
        let state = MarketplaceState::new(
            config.genesis.administrator.clone(),
            config.limits.clone(),
        )?;
        let metrics = Metrics::new()
            .map_err(|e| crate::Error::Config(format!("Failed to create metrics: {}", e)))?;

        tracing::info!(
            service = %config.service_name,
            genesis_administrator = %config.genesis.administrator,
            channel = channel.name(),
            "Opening marketplace engine"
        );

        let handle = spawn_marketplace_actor(
            state,
            channel,
            metrics.clone(),
            config.mailbox_capacity,
        );

        Ok(Self {
            handle,
            metrics,
            config,
        })
    }

    // Role management

    /// Grant the administrator role; caller must be an administrator
    pub async fn add_administrator(&self, caller: Principal, target: Principal) -> Result<()> {
        self.handle.add_administrator(caller, target).await
    }

    /// Grant the store-owner role; caller must be an administrator
    pub async fn add_store_owner(&self, caller: Principal, target: Principal) -> Result<()> {
        self.handle.add_store_owner(caller, target).await
    }

    /// Administrator membership query
    pub async fn is_administrator(&self, principal: Principal) -> Result<bool> {
        self.handle.is_administrator(principal).await
    }

    /// Store-owner membership query
    pub async fn is_store_owner(&self, principal: Principal) -> Result<bool> {
        self.handle.is_store_owner(principal).await
    }

    /// Full administrator set in grant order
    pub async fn administrators(&self) -> Result<Vec<Principal>> {
        self.handle.administrators().await
    }

    /// Full store-owner set in grant order
    pub async fn store_owners(&self) -> Result<Vec<Principal>> {
        self.handle.store_owners().await
    }

    // Store management

    /// Create a store owned by the caller; caller must be a store owner
    pub async fn create_store(&self, caller: Principal, name: impl Into<String>) -> Result<StoreId> {
        self.handle.create_store(caller, name.into()).await
    }

    /// Store lookup by id
    pub async fn store(&self, store_id: StoreId) -> Result<Store> {
        self.handle.store(store_id).await
    }

    /// Store lookup by position in the global creation order
    pub async fn store_by_index(&self, index: usize) -> Result<Store> {
        self.handle.store_by_index(index).await
    }

    /// Every store id ever created, in creation order
    pub async fn all_store_ids(&self) -> Result<Vec<StoreId>> {
        self.handle.all_store_ids().await
    }

    /// Store ids owned by a principal, in creation order
    pub async fn owner_store_ids(&self, owner: Principal) -> Result<Vec<StoreId>> {
        self.handle.owner_store_ids(owner).await
    }

    /// Number of stores ever created
    pub async fn store_count(&self) -> Result<usize> {
        self.handle.store_count().await
    }

    // Item management

    /// Add an item to a store; caller must own the store
    pub async fn create_item(
        &self,
        caller: Principal,
        store_id: StoreId,
        name: impl Into<String>,
        description: impl Into<String>,
        price: Wei,
        quantity: u64,
    ) -> Result<ItemId> {
        self.handle
            .create_item(caller, store_id, name.into(), description.into(), price, quantity)
            .await
    }

    /// Item lookup by id; removed ids fail forever after
    pub async fn item(&self, item_id: ItemId) -> Result<Item> {
        self.handle.item(item_id).await
    }

    /// Live item ids for a store, in index order
    pub async fn store_item_ids(&self, store_id: StoreId) -> Result<Vec<ItemId>> {
        self.handle.store_item_ids(store_id).await
    }

    /// Number of live items in a store
    pub async fn item_count(&self, store_id: StoreId) -> Result<usize> {
        self.handle.item_count(store_id).await
    }

    /// Update an item's unit price; caller must own the store
    pub async fn update_item_price(
        &self,
        caller: Principal,
        store_id: StoreId,
        item_id: ItemId,
        price: Wei,
    ) -> Result<()> {
        self.handle
            .update_item_price(caller, store_id, item_id, price)
            .await
    }

    /// Update an item's stock level; caller must own the store
    pub async fn update_item_quantity(
        &self,
        caller: Principal,
        store_id: StoreId,
        item_id: ItemId,
        quantity: u64,
    ) -> Result<()> {
        self.handle
            .update_item_quantity(caller, store_id, item_id, quantity)
            .await
    }

    /// Remove an item from its store; caller must own the store
    ///
    /// Removal is swap-and-pop: the last item in the store's live list moves
    /// into the vacated position, so enumeration order changes.
    pub async fn remove_item(
        &self,
        caller: Principal,
        store_id: StoreId,
        item_id: ItemId,
    ) -> Result<()> {
        self.handle.remove_item(caller, store_id, item_id).await
    }

    // Commerce

    /// Purchase units of an item with value attached
    ///
    /// Excess attached value is retained, not refunded. Any principal may
    /// buy, including the store's own owner.
    pub async fn purchase_item(
        &self,
        caller: Principal,
        store_id: StoreId,
        item_id: ItemId,
        quantity: u64,
        attached_value: Wei,
    ) -> Result<()> {
        self.handle
            .purchase_item(caller, store_id, item_id, quantity, attached_value)
            .await
    }

    /// Withdraw a store's entire sales balance to the caller
    ///
    /// The balance is zeroed before the transfer channel is invoked, and the
    /// withdrawal stays committed even if the payout fails; returns the
    /// amount paid out. Zero-balance withdrawal is a permitted no-op.
    pub async fn withdraw_sales(&self, caller: Principal, store_id: StoreId) -> Result<Wei> {
        self.handle.withdraw_sales(caller, store_id).await
    }

    // Introspection

    /// Full ordered event log, one record per committed mutation
    pub async fn events(&self) -> Result<Vec<EventRecord>> {
        self.handle.events().await
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Engine configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shutdown the engine
    pub async fn shutdown(&self) -> Result<()> {
        self.handle.shutdown().await
    }
}
