//! Pure marketplace state machine
//!
//! Owns every entity (roles, stores, items, balances) and applies one
//! transaction at a time. Each mutating method validates all preconditions
//! before touching any structure, so a rejected call leaves the state
//! byte-for-byte unchanged and a committed call is all-or-nothing.
//!
//! # Indexing
//!
//! Per-store live-item lists are dense vectors of item ids; each item carries
//! its own position as `index_within_store`. Removal is swap-and-pop: the
//! last id moves into the vacated slot and its index is rewritten in the same
//! transaction, keeping `position == index` as an invariant.

use crate::{
    config::LimitsConfig,
    roles::RoleSet,
    types::{Item, ItemId, MarketplaceEvent, Principal, Store, StoreId, Wei},
    Error, Result,
};
use std::collections::HashMap;

/// Whole-engine state, mutated only by the single sequencer
#[derive(Debug)]
pub struct MarketplaceState {
    /// Administrator role set (growth-only)
    administrators: RoleSet,

    /// Store-owner role set (growth-only)
    store_owners: RoleSet,

    /// Store registry
    stores: HashMap<StoreId, Store>,

    /// Item registry (live items only; removed ids are gone for good)
    items: HashMap<ItemId, Item>,

    /// Every store id ever created, in creation order
    store_order: Vec<StoreId>,

    /// Store ids per owner, in creation order
    owner_stores: HashMap<Principal, Vec<StoreId>>,

    /// Live item ids per store, in `index_within_store` order
    store_items: HashMap<StoreId, Vec<ItemId>>,

    /// Field validation limits
    limits: LimitsConfig,
}

impl MarketplaceState {
    /// Create state with the genesis administrator seeded
    ///
    /// The administrator set is non-empty from initialization onward.
    pub fn new(genesis_administrator: Principal, limits: LimitsConfig) -> Result<Self> {
        if genesis_administrator.is_empty() {
            return Err(Error::Config(
                "Genesis administrator must not be empty".to_string(),
            ));
        }

        let mut administrators = RoleSet::new();
        administrators.grant(genesis_administrator);

        Ok(Self {
            administrators,
            store_owners: RoleSet::new(),
            stores: HashMap::new(),
            items: HashMap::new(),
            store_order: Vec::new(),
            owner_stores: HashMap::new(),
            store_items: HashMap::new(),
            limits,
        })
    }

    // Role management

    /// Grant the administrator role
    pub fn add_administrator(
        &mut self,
        caller: &Principal,
        target: Principal,
    ) -> Result<MarketplaceEvent> {
        self.require_administrator(caller)?;

        if self.administrators.contains(&target) {
            return Err(Error::AlreadyExists(format!(
                "{} is already an administrator",
                target
            )));
        }

        self.administrators.grant(target.clone());
        Ok(MarketplaceEvent::AdministratorAdded { admin: target })
    }

    /// Grant the store-owner role
    pub fn add_store_owner(
        &mut self,
        caller: &Principal,
        target: Principal,
    ) -> Result<MarketplaceEvent> {
        self.require_administrator(caller)?;

        if self.store_owners.contains(&target) {
            return Err(Error::AlreadyExists(format!(
                "{} is already a store owner",
                target
            )));
        }

        self.store_owners.grant(target.clone());
        Ok(MarketplaceEvent::StoreOwnerAdded {
            store_owner: target,
            administrator: caller.clone(),
        })
    }

    /// Membership query
    pub fn is_administrator(&self, principal: &Principal) -> bool {
        self.administrators.contains(principal)
    }

    /// Membership query
    pub fn is_store_owner(&self, principal: &Principal) -> bool {
        self.store_owners.contains(principal)
    }

    /// All administrators in grant order
    pub fn administrators(&self) -> Vec<Principal> {
        self.administrators.as_slice().to_vec()
    }

    /// All store owners in grant order
    pub fn store_owners(&self) -> Vec<Principal> {
        self.store_owners.as_slice().to_vec()
    }

    // Store management

    /// Create a store owned by the caller
    pub fn create_store(
        &mut self,
        caller: &Principal,
        name: String,
    ) -> Result<(StoreId, MarketplaceEvent)> {
        if !self.store_owners.contains(caller) {
            return Err(Error::Unauthorized(format!(
                "{} is not a store owner",
                caller
            )));
        }
        if name.len() > self.limits.max_name_len {
            return Err(Error::InvalidArgument(format!(
                "Store name exceeds {} bytes",
                self.limits.max_name_len
            )));
        }

        let store_id = StoreId::generate();
        self.stores.insert(
            store_id,
            Store {
                store_id,
                name,
                owner: caller.clone(),
                sales_balance: Wei::ZERO,
            },
        );
        self.store_order.push(store_id);
        self.owner_stores
            .entry(caller.clone())
            .or_default()
            .push(store_id);
        self.store_items.insert(store_id, Vec::new());

        Ok((
            store_id,
            MarketplaceEvent::StoreCreated {
                store_owner: caller.clone(),
                store_id,
            },
        ))
    }

    /// Store lookup by id
    pub fn store(&self, store_id: StoreId) -> Result<Store> {
        self.store_ref(store_id).cloned()
    }

    /// Store lookup by position in the global creation order
    pub fn store_by_index(&self, index: usize) -> Result<Store> {
        let store_id = self
            .store_order
            .get(index)
            .ok_or_else(|| Error::NotFound(format!("No store at index {}", index)))?;
        self.store(*store_id)
    }

    /// Every store id ever created, in creation order
    pub fn all_store_ids(&self) -> Vec<StoreId> {
        self.store_order.clone()
    }

    /// Number of stores ever created
    pub fn store_count(&self) -> usize {
        self.store_order.len()
    }

    /// Store ids owned by the caller, in creation order
    pub fn owner_store_ids(&self, owner: &Principal) -> Vec<StoreId> {
        self.owner_stores.get(owner).cloned().unwrap_or_default()
    }

    // Item management

    /// Add an item to a store owned by the caller
    pub fn create_item(
        &mut self,
        caller: &Principal,
        store_id: StoreId,
        name: String,
        description: String,
        price: Wei,
        quantity: u64,
    ) -> Result<(ItemId, MarketplaceEvent)> {
        self.require_store_ownership(caller, store_id)?;
        self.validate_item_fields(&name, &description)?;
        if price.is_zero() {
            return Err(Error::InvalidArgument(
                "Item price must be positive".to_string(),
            ));
        }
        if quantity == 0 {
            return Err(Error::InvalidArgument(
                "Item quantity must be positive".to_string(),
            ));
        }

        let item_id = ItemId::generate();
        let live = self
            .store_items
            .get_mut(&store_id)
            .expect("store registry and live-item lists are kept in sync");
        let index_within_store = live.len();
        live.push(item_id);
        self.items.insert(
            item_id,
            Item {
                item_id,
                store_id,
                index_within_store,
                name: name.clone(),
                description: description.clone(),
                price,
                quantity,
            },
        );

        Ok((
            item_id,
            MarketplaceEvent::ItemCreated {
                store_id,
                item_id,
                name,
                description,
                price,
                quantity,
            },
        ))
    }

    /// Item lookup by id
    ///
    /// Removed ids are not resurrectable; they fail here forever after.
    pub fn item(&self, item_id: ItemId) -> Result<Item> {
        self.items
            .get(&item_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Item {} does not exist", item_id)))
    }

    /// Live item ids for a store, in `index_within_store` order
    pub fn store_item_ids(&self, store_id: StoreId) -> Result<Vec<ItemId>> {
        self.store_ref(store_id)?;
        Ok(self
            .store_items
            .get(&store_id)
            .cloned()
            .unwrap_or_default())
    }

    /// Number of live items in a store
    pub fn item_count(&self, store_id: StoreId) -> Result<usize> {
        Ok(self.store_item_ids(store_id)?.len())
    }

    /// Update an item's unit price in place
    pub fn update_item_price(
        &mut self,
        caller: &Principal,
        store_id: StoreId,
        item_id: ItemId,
        price: Wei,
    ) -> Result<MarketplaceEvent> {
        self.require_store_ownership(caller, store_id)?;
        self.item_in_store(store_id, item_id)?;
        if price.is_zero() {
            return Err(Error::InvalidArgument(
                "Item price must be positive".to_string(),
            ));
        }

        let item = self
            .items
            .get_mut(&item_id)
            .expect("presence checked above");
        item.price = price;

        Ok(MarketplaceEvent::ItemPriceUpdated {
            store_id,
            item_id,
            price,
        })
    }

    /// Update an item's stock level in place
    pub fn update_item_quantity(
        &mut self,
        caller: &Principal,
        store_id: StoreId,
        item_id: ItemId,
        quantity: u64,
    ) -> Result<MarketplaceEvent> {
        self.require_store_ownership(caller, store_id)?;
        self.item_in_store(store_id, item_id)?;

        let item = self
            .items
            .get_mut(&item_id)
            .expect("presence checked above");
        item.quantity = quantity;

        Ok(MarketplaceEvent::ItemQuantityUpdated {
            store_id,
            item_id,
            quantity,
        })
    }

    /// Remove an item from its store
    ///
    /// Swap-and-pop: the last live item moves into the vacated position and
    /// its `index_within_store` is rewritten. O(1), but callers must not
    /// assume index stability across removals.
    pub fn remove_item(
        &mut self,
        caller: &Principal,
        store_id: StoreId,
        item_id: ItemId,
    ) -> Result<MarketplaceEvent> {
        self.require_store_ownership(caller, store_id)?;
        let removed_index = self.item_in_store(store_id, item_id)?.index_within_store;

        self.items.remove(&item_id);
        let live = self
            .store_items
            .get_mut(&store_id)
            .expect("store registry and live-item lists are kept in sync");
        live.swap_remove(removed_index);

        if let Some(moved_id) = live.get(removed_index).copied() {
            let moved = self
                .items
                .get_mut(&moved_id)
                .expect("live lists hold only registered items");
            moved.index_within_store = removed_index;
        }

        Ok(MarketplaceEvent::ItemRemoved { store_id, item_id })
    }

    // Commerce

    /// Purchase units of an item, crediting the store's sales balance
    ///
    /// Any value attached beyond the exact required amount is retained, not
    /// refunded. There is no buyer/owner restriction: a store owner may
    /// purchase from their own store.
    pub fn purchase_item(
        &mut self,
        store_id: StoreId,
        item_id: ItemId,
        quantity: u64,
        attached_value: Wei,
    ) -> Result<MarketplaceEvent> {
        self.store_ref(store_id)?;
        let item = self.item_in_store(store_id, item_id)?;

        if quantity == 0 {
            return Err(Error::InvalidArgument(
                "Purchase quantity must be positive".to_string(),
            ));
        }
        if quantity > item.quantity {
            return Err(Error::InsufficientStock {
                requested: quantity,
                available: item.quantity,
            });
        }

        let required = item.price.checked_mul_qty(quantity).ok_or_else(|| {
            Error::InvariantViolation("Purchase total overflows wei range".to_string())
        })?;
        if attached_value < required {
            return Err(Error::InsufficientPayment {
                required,
                attached: attached_value,
            });
        }

        // All preconditions hold; compute the new balance before mutating
        // anything so an overflow cannot leave a half-applied purchase.
        let store = self.stores.get(&store_id).expect("presence checked above");
        let new_balance = store.sales_balance.checked_add(required).ok_or_else(|| {
            Error::InvariantViolation("Store sales balance overflows wei range".to_string())
        })?;

        let item = self
            .items
            .get_mut(&item_id)
            .expect("presence checked above");
        item.quantity -= quantity;
        let store = self
            .stores
            .get_mut(&store_id)
            .expect("presence checked above");
        store.sales_balance = new_balance;

        Ok(MarketplaceEvent::ItemPurchased {
            store_id,
            item_id,
            quantity,
        })
    }

    /// Zero a store's sales balance, returning the amount to pay out
    ///
    /// The balance is cleared here, before any external transfer happens, so
    /// a reentrant caller can never observe (or withdraw) a stale balance.
    /// Withdrawing a zero balance is a permitted no-op.
    pub fn withdraw_sales(
        &mut self,
        caller: &Principal,
        store_id: StoreId,
    ) -> Result<(Wei, MarketplaceEvent)> {
        self.require_store_ownership(caller, store_id)?;

        let store = self
            .stores
            .get_mut(&store_id)
            .expect("ownership check resolved the store");
        let amount = store.sales_balance;
        store.sales_balance = Wei::ZERO;

        Ok((
            amount,
            MarketplaceEvent::SalesWithdrawnFromStore { store_id, amount },
        ))
    }

    // Precondition helpers

    fn require_administrator(&self, caller: &Principal) -> Result<()> {
        if !self.administrators.contains(caller) {
            return Err(Error::Unauthorized(format!(
                "{} is not an administrator",
                caller
            )));
        }
        Ok(())
    }

    fn require_store_ownership(&self, caller: &Principal, store_id: StoreId) -> Result<&Store> {
        let store = self.store_ref(store_id)?;
        if store.owner != *caller {
            return Err(Error::Unauthorized(format!(
                "{} does not own store {}",
                caller, store_id
            )));
        }
        Ok(store)
    }

    fn store_ref(&self, store_id: StoreId) -> Result<&Store> {
        self.stores
            .get(&store_id)
            .ok_or_else(|| Error::NotFound(format!("Store {} does not exist", store_id)))
    }

    fn item_in_store(&self, store_id: StoreId, item_id: ItemId) -> Result<&Item> {
        let item = self
            .items
            .get(&item_id)
            .ok_or_else(|| Error::NotFound(format!("Item {} does not exist", item_id)))?;
        if item.store_id != store_id {
            return Err(Error::NotFound(format!(
                "Item {} is not in store {}",
                item_id, store_id
            )));
        }
        Ok(item)
    }

    fn validate_item_fields(&self, name: &str, description: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "Item name must not be empty".to_string(),
            ));
        }
        if description.is_empty() {
            return Err(Error::InvalidArgument(
                "Item description must not be empty".to_string(),
            ));
        }
        if name.len() > self.limits.max_name_len {
            return Err(Error::InvalidArgument(format!(
                "Item name exceeds {} bytes",
                self.limits.max_name_len
            )));
        }
        if description.len() > self.limits.max_description_len {
            return Err(Error::InvalidArgument(format!(
                "Item description exceeds {} bytes",
                self.limits.max_description_len
            )));
        }
        Ok(())
    }
}
