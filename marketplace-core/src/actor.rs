//! Actor-based sequencing for the marketplace engine
//!
//! This module implements the single-writer pattern using Tokio actors:
//! one task owns the whole state, every operation arrives as a message, and
//! transactions execute to completion before the next one starts. Callers
//! therefore observe strict serializability without any locking.
//!
//! The currency transfer inside a withdrawal also runs inside the actor
//! turn, after the balance is zeroed. A reentrant call issued during the
//! transfer queues behind it in the mailbox and can never observe a stale
//! nonzero balance.

use crate::{
    metrics::Metrics,
    state::MarketplaceState,
    transfer::CurrencyChannel,
    types::{EventRecord, Item, ItemId, Principal, Store, StoreId, Wei},
    Error, Result,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Message sent to the marketplace actor
pub enum MarketplaceMessage {
    /// Grant the administrator role
    AddAdministrator {
        /// Invoking principal
        caller: Principal,
        /// Principal to grant
        target: Principal,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Grant the store-owner role
    AddStoreOwner {
        /// Invoking principal
        caller: Principal,
        /// Principal to grant
        target: Principal,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Administrator membership query
    IsAdministrator {
        /// Principal to check
        principal: Principal,
        /// Reply channel
        response: oneshot::Sender<Result<bool>>,
    },

    /// Store-owner membership query
    IsStoreOwner {
        /// Principal to check
        principal: Principal,
        /// Reply channel
        response: oneshot::Sender<Result<bool>>,
    },

    /// Full administrator set in grant order
    Administrators {
        /// Reply channel
        response: oneshot::Sender<Result<Vec<Principal>>>,
    },

    /// Full store-owner set in grant order
    StoreOwners {
        /// Reply channel
        response: oneshot::Sender<Result<Vec<Principal>>>,
    },

    /// Create a store
    CreateStore {
        /// Invoking principal
        caller: Principal,
        /// Store name
        name: String,
        /// Reply channel
        response: oneshot::Sender<Result<StoreId>>,
    },

    /// Store lookup by id
    GetStore {
        /// Store id
        store_id: StoreId,
        /// Reply channel
        response: oneshot::Sender<Result<Store>>,
    },

    /// Store lookup by global creation index
    GetStoreByIndex {
        /// Position in the global creation order
        index: usize,
        /// Reply channel
        response: oneshot::Sender<Result<Store>>,
    },

    /// Every store id ever created
    AllStoreIds {
        /// Reply channel
        response: oneshot::Sender<Result<Vec<StoreId>>>,
    },

    /// Store ids owned by a principal
    OwnerStoreIds {
        /// Owner
        owner: Principal,
        /// Reply channel
        response: oneshot::Sender<Result<Vec<StoreId>>>,
    },

    /// Number of stores ever created
    StoreCount {
        /// Reply channel
        response: oneshot::Sender<Result<usize>>,
    },

    /// Add an item to a store
    CreateItem {
        /// Invoking principal
        caller: Principal,
        /// Owning store
        store_id: StoreId,
        /// Item name
        name: String,
        /// Item description
        description: String,
        /// Price per unit
        price: Wei,
        /// Initial stock
        quantity: u64,
        /// Reply channel
        response: oneshot::Sender<Result<ItemId>>,
    },

    /// Item lookup by id
    GetItem {
        /// Item id
        item_id: ItemId,
        /// Reply channel
        response: oneshot::Sender<Result<Item>>,
    },

    /// Live item ids for a store
    StoreItemIds {
        /// Store id
        store_id: StoreId,
        /// Reply channel
        response: oneshot::Sender<Result<Vec<ItemId>>>,
    },

    /// Number of live items in a store
    ItemCount {
        /// Store id
        store_id: StoreId,
        /// Reply channel
        response: oneshot::Sender<Result<usize>>,
    },

    /// Update an item's unit price
    UpdateItemPrice {
        /// Invoking principal
        caller: Principal,
        /// Owning store
        store_id: StoreId,
        /// Item
        item_id: ItemId,
        /// New price per unit
        price: Wei,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Update an item's stock level
    UpdateItemQuantity {
        /// Invoking principal
        caller: Principal,
        /// Owning store
        store_id: StoreId,
        /// Item
        item_id: ItemId,
        /// New stock
        quantity: u64,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Remove an item (swap-and-pop)
    RemoveItem {
        /// Invoking principal
        caller: Principal,
        /// Owning store
        store_id: StoreId,
        /// Item
        item_id: ItemId,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Purchase units of an item
    PurchaseItem {
        /// Invoking principal (buyer)
        caller: Principal,
        /// Store sold from
        store_id: StoreId,
        /// Item sold
        item_id: ItemId,
        /// Units requested
        quantity: u64,
        /// Value attached to the call
        attached_value: Wei,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Withdraw a store's sales balance to its owner
    WithdrawSales {
        /// Invoking principal (must own the store)
        caller: Principal,
        /// Store
        store_id: StoreId,
        /// Reply channel, carries the amount paid out
        response: oneshot::Sender<Result<Wei>>,
    },

    /// Full ordered event log
    Events {
        /// Reply channel
        response: oneshot::Sender<Result<Vec<EventRecord>>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that processes marketplace messages
pub struct MarketplaceActor {
    /// Engine state (sole mutator)
    state: MarketplaceState,

    /// Append-only event log
    events: Vec<EventRecord>,

    /// Outbound value-transfer boundary
    channel: Arc<dyn CurrencyChannel>,

    /// Metrics collector
    metrics: Metrics,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<MarketplaceMessage>,
}

impl MarketplaceActor {
    /// Create new actor
    pub fn new(
        state: MarketplaceState,
        channel: Arc<dyn CurrencyChannel>,
        metrics: Metrics,
        mailbox: mpsc::Receiver<MarketplaceMessage>,
    ) -> Self {
        Self {
            state,
            events: Vec::new(),
            channel,
            metrics,
            mailbox,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                MarketplaceMessage::Shutdown => break,
                other => self.handle_message(other).await,
            }
        }
        tracing::debug!("Marketplace actor stopped");
    }

    /// Record a committed event, returning unit for the reply
    fn commit(&mut self, event: crate::types::MarketplaceEvent) {
        tracing::info!(event = event.kind(), "Transaction committed");
        self.events.push(EventRecord::new(event));
        self.metrics.record_commit();
    }

    /// Count a rejection before handing the error back
    fn reject<T>(&self, err: Error) -> Result<T> {
        tracing::warn!(kind = err.kind(), "Transaction rejected: {}", err);
        self.metrics.record_rejection();
        Err(err)
    }

    /// Handle a single message
    async fn handle_message(&mut self, msg: MarketplaceMessage) {
        match msg {
            MarketplaceMessage::AddAdministrator {
                caller,
                target,
                response,
            } => {
                let result = match self.state.add_administrator(&caller, target) {
                    Ok(event) => {
                        self.commit(event);
                        Ok(())
                    }
                    Err(err) => self.reject(err),
                };
                let _ = response.send(result);
            }

            MarketplaceMessage::AddStoreOwner {
                caller,
                target,
                response,
            } => {
                let result = match self.state.add_store_owner(&caller, target) {
                    Ok(event) => {
                        self.commit(event);
                        Ok(())
                    }
                    Err(err) => self.reject(err),
                };
                let _ = response.send(result);
            }

            MarketplaceMessage::IsAdministrator {
                principal,
                response,
            } => {
                let _ = response.send(Ok(self.state.is_administrator(&principal)));
            }

            MarketplaceMessage::IsStoreOwner {
                principal,
                response,
            } => {
                let _ = response.send(Ok(self.state.is_store_owner(&principal)));
            }

            MarketplaceMessage::Administrators { response } => {
                let _ = response.send(Ok(self.state.administrators()));
            }

            MarketplaceMessage::StoreOwners { response } => {
                let _ = response.send(Ok(self.state.store_owners()));
            }

            MarketplaceMessage::CreateStore {
                caller,
                name,
                response,
            } => {
                let result = match self.state.create_store(&caller, name) {
                    Ok((store_id, event)) => {
                        self.commit(event);
                        Ok(store_id)
                    }
                    Err(err) => self.reject(err),
                };
                let _ = response.send(result);
            }

            MarketplaceMessage::GetStore { store_id, response } => {
                let _ = response.send(self.state.store(store_id));
            }

            MarketplaceMessage::GetStoreByIndex { index, response } => {
                let _ = response.send(self.state.store_by_index(index));
            }

            MarketplaceMessage::AllStoreIds { response } => {
                let _ = response.send(Ok(self.state.all_store_ids()));
            }

            MarketplaceMessage::OwnerStoreIds { owner, response } => {
                let _ = response.send(Ok(self.state.owner_store_ids(&owner)));
            }

            MarketplaceMessage::StoreCount { response } => {
                let _ = response.send(Ok(self.state.store_count()));
            }

            MarketplaceMessage::CreateItem {
                caller,
                store_id,
                name,
                description,
                price,
                quantity,
                response,
            } => {
                let result = match self
                    .state
                    .create_item(&caller, store_id, name, description, price, quantity)
                {
                    Ok((item_id, event)) => {
                        self.commit(event);
                        Ok(item_id)
                    }
                    Err(err) => self.reject(err),
                };
                let _ = response.send(result);
            }

            MarketplaceMessage::GetItem { item_id, response } => {
                let _ = response.send(self.state.item(item_id));
            }

            MarketplaceMessage::StoreItemIds { store_id, response } => {
                let _ = response.send(self.state.store_item_ids(store_id));
            }

            MarketplaceMessage::ItemCount { store_id, response } => {
                let _ = response.send(self.state.item_count(store_id));
            }

            MarketplaceMessage::UpdateItemPrice {
                caller,
                store_id,
                item_id,
                price,
                response,
            } => {
                let result = match self
                    .state
                    .update_item_price(&caller, store_id, item_id, price)
                {
                    Ok(event) => {
                        self.commit(event);
                        Ok(())
                    }
                    Err(err) => self.reject(err),
                };
                let _ = response.send(result);
            }

            MarketplaceMessage::UpdateItemQuantity {
                caller,
                store_id,
                item_id,
                quantity,
                response,
            } => {
                let result = match self
                    .state
                    .update_item_quantity(&caller, store_id, item_id, quantity)
                {
                    Ok(event) => {
                        self.commit(event);
                        Ok(())
                    }
                    Err(err) => self.reject(err),
                };
                let _ = response.send(result);
            }

            MarketplaceMessage::RemoveItem {
                caller,
                store_id,
                item_id,
                response,
            } => {
                let result = match self.state.remove_item(&caller, store_id, item_id) {
                    Ok(event) => {
                        self.commit(event);
                        Ok(())
                    }
                    Err(err) => self.reject(err),
                };
                let _ = response.send(result);
            }

            MarketplaceMessage::PurchaseItem {
                caller,
                store_id,
                item_id,
                quantity,
                attached_value,
                response,
            } => {
                let result = match self
                    .state
                    .purchase_item(store_id, item_id, quantity, attached_value)
                {
                    Ok(event) => {
                        tracing::debug!(buyer = %caller, store = %store_id, item = %item_id, quantity);
                        self.commit(event);
                        self.metrics.record_purchase();
                        Ok(())
                    }
                    Err(err) => self.reject(err),
                };
                let _ = response.send(result);
            }

            MarketplaceMessage::WithdrawSales {
                caller,
                store_id,
                response,
            } => {
                let result = match self.state.withdraw_sales(&caller, store_id) {
                    Ok((amount, event)) => {
                        // Balance is already zeroed; the credit below is the
                        // external-interaction step and must come last.
                        self.commit(event);
                        self.metrics.record_withdrawal();
                        if amount.is_zero() {
                            Ok(amount)
                        } else {
                            match self.channel.credit(&caller, amount).await {
                                Ok(()) => Ok(amount),
                                Err(err) => {
                                    // The withdrawal stays committed; payout
                                    // re-delivery is the channel's concern.
                                    tracing::error!(
                                        channel = self.channel.name(),
                                        store = %store_id,
                                        %amount,
                                        "Payout transfer failed: {}",
                                        err
                                    );
                                    Err(err)
                                }
                            }
                        }
                    }
                    Err(err) => self.reject(err),
                };
                let _ = response.send(result);
            }

            MarketplaceMessage::Events { response } => {
                let _ = response.send(Ok(self.events.clone()));
            }

            MarketplaceMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Clone)]
pub struct MarketplaceHandle {
    sender: mpsc::Sender<MarketplaceMessage>,
}

impl MarketplaceHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<MarketplaceMessage>) -> Self {
        Self { sender }
    }

    /// Send a message and await its reply
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T>>) -> MarketplaceMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Reply channel closed".to_string()))?
    }

    /// Grant the administrator role
    pub async fn add_administrator(&self, caller: Principal, target: Principal) -> Result<()> {
        self.request(|response| MarketplaceMessage::AddAdministrator {
            caller,
            target,
            response,
        })
        .await
    }

    /// Grant the store-owner role
    pub async fn add_store_owner(&self, caller: Principal, target: Principal) -> Result<()> {
        self.request(|response| MarketplaceMessage::AddStoreOwner {
            caller,
            target,
            response,
        })
        .await
    }

    /// Administrator membership query
    pub async fn is_administrator(&self, principal: Principal) -> Result<bool> {
        self.request(|response| MarketplaceMessage::IsAdministrator {
            principal,
            response,
        })
        .await
    }

    /// Store-owner membership query
    pub async fn is_store_owner(&self, principal: Principal) -> Result<bool> {
        self.request(|response| MarketplaceMessage::IsStoreOwner {
            principal,
            response,
        })
        .await
    }

    /// Full administrator set in grant order
    pub async fn administrators(&self) -> Result<Vec<Principal>> {
        self.request(|response| MarketplaceMessage::Administrators { response })
            .await
    }

    /// Full store-owner set in grant order
    pub async fn store_owners(&self) -> Result<Vec<Principal>> {
        self.request(|response| MarketplaceMessage::StoreOwners { response })
            .await
    }

    /// Create a store
    pub async fn create_store(&self, caller: Principal, name: String) -> Result<StoreId> {
        self.request(|response| MarketplaceMessage::CreateStore {
            caller,
            name,
            response,
        })
        .await
    }

    /// Store lookup by id
    pub async fn store(&self, store_id: StoreId) -> Result<Store> {
        self.request(|response| MarketplaceMessage::GetStore { store_id, response })
            .await
    }

    /// Store lookup by global creation index
    pub async fn store_by_index(&self, index: usize) -> Result<Store> {
        self.request(|response| MarketplaceMessage::GetStoreByIndex { index, response })
            .await
    }

    /// Every store id ever created
    pub async fn all_store_ids(&self) -> Result<Vec<StoreId>> {
        self.request(|response| MarketplaceMessage::AllStoreIds { response })
            .await
    }

    /// Store ids owned by a principal
    pub async fn owner_store_ids(&self, owner: Principal) -> Result<Vec<StoreId>> {
        self.request(|response| MarketplaceMessage::OwnerStoreIds { owner, response })
            .await
    }

    /// Number of stores ever created
    pub async fn store_count(&self) -> Result<usize> {
        self.request(|response| MarketplaceMessage::StoreCount { response })
            .await
    }

    /// Add an item to a store
    #[allow(clippy::too_many_arguments)]
    pub async fn create_item(
        &self,
        caller: Principal,
        store_id: StoreId,
        name: String,
        description: String,
        price: Wei,
        quantity: u64,
    ) -> Result<ItemId> {
        self.request(|response| MarketplaceMessage::CreateItem {
            caller,
            store_id,
            name,
            description,
            price,
            quantity,
            response,
        })
        .await
    }

    /// Item lookup by id
    pub async fn item(&self, item_id: ItemId) -> Result<Item> {
        self.request(|response| MarketplaceMessage::GetItem { item_id, response })
            .await
    }

    /// Live item ids for a store
    pub async fn store_item_ids(&self, store_id: StoreId) -> Result<Vec<ItemId>> {
        self.request(|response| MarketplaceMessage::StoreItemIds { store_id, response })
            .await
    }

    /// Number of live items in a store
    pub async fn item_count(&self, store_id: StoreId) -> Result<usize> {
        self.request(|response| MarketplaceMessage::ItemCount { store_id, response })
            .await
    }

    /// Update an item's unit price
    pub async fn update_item_price(
        &self,
        caller: Principal,
        store_id: StoreId,
        item_id: ItemId,
        price: Wei,
    ) -> Result<()> {
        self.request(|response| MarketplaceMessage::UpdateItemPrice {
            caller,
            store_id,
            item_id,
            price,
            response,
        })
        .await
    }

    /// Update an item's stock level
    pub async fn update_item_quantity(
        &self,
        caller: Principal,
        store_id: StoreId,
        item_id: ItemId,
        quantity: u64,
    ) -> Result<()> {
        self.request(|response| MarketplaceMessage::UpdateItemQuantity {
            caller,
            store_id,
            item_id,
            quantity,
            response,
        })
        .await
    }

    /// Remove an item (swap-and-pop)
    pub async fn remove_item(
        &self,
        caller: Principal,
        store_id: StoreId,
        item_id: ItemId,
    ) -> Result<()> {
        self.request(|response| MarketplaceMessage::RemoveItem {
            caller,
            store_id,
            item_id,
            response,
        })
        .await
    }

    /// Purchase units of an item
    pub async fn purchase_item(
        &self,
        caller: Principal,
        store_id: StoreId,
        item_id: ItemId,
        quantity: u64,
        attached_value: Wei,
    ) -> Result<()> {
        self.request(|response| MarketplaceMessage::PurchaseItem {
            caller,
            store_id,
            item_id,
            quantity,
            attached_value,
            response,
        })
        .await
    }

    /// Withdraw a store's sales balance to its owner
    pub async fn withdraw_sales(&self, caller: Principal, store_id: StoreId) -> Result<Wei> {
        self.request(|response| MarketplaceMessage::WithdrawSales {
            caller,
            store_id,
            response,
        })
        .await
    }

    /// Full ordered event log
    pub async fn events(&self) -> Result<Vec<EventRecord>> {
        self.request(|response| MarketplaceMessage::Events { response })
            .await
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(MarketplaceMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the marketplace actor
pub fn spawn_marketplace_actor(
    state: MarketplaceState,
    channel: Arc<dyn CurrencyChannel>,
    metrics: Metrics,
    mailbox_capacity: usize,
) -> MarketplaceHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity); // Bounded channel for backpressure
    let actor = MarketplaceActor::new(state, channel, metrics, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    MarketplaceHandle::new(tx)
}
