//! Core types for the marketplace ledger
//!
//! All types are designed for:
//! - Deterministic behavior (no hidden clocks inside state transitions)
//! - Memory safety (no unsafe code)
//! - Exact arithmetic (checked integer math for money)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Caller identity (wallet address, session subject, etc.)
///
/// The engine trusts this value as given; authentication happens upstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Principal(String);

impl Principal {
    /// Create new principal
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the empty identity, which no operation accepts
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Amount in the smallest accounted currency unit (wei)
///
/// All arithmetic is checked; an overflow is surfaced as an invariant
/// violation instead of wrapping.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Wei(u128);

impl Wei {
    /// Zero amount
    pub const ZERO: Wei = Wei(0);

    /// Create from raw units
    pub fn new(units: u128) -> Self {
        Self(units)
    }

    /// Raw unit count
    pub fn as_u128(&self) -> u128 {
        self.0
    }

    /// True if zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition
    pub fn checked_add(self, other: Wei) -> Option<Wei> {
        self.0.checked_add(other.0).map(Wei)
    }

    /// Checked subtraction
    pub fn checked_sub(self, other: Wei) -> Option<Wei> {
        self.0.checked_sub(other.0).map(Wei)
    }

    /// Checked per-unit price times quantity
    pub fn checked_mul_qty(self, qty: u64) -> Option<Wei> {
        self.0.checked_mul(u128::from(qty)).map(Wei)
    }
}

impl From<u128> for Wei {
    fn from(units: u128) -> Self {
        Self(units)
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Store identifier
///
/// Opaque and unique for the lifetime of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreId(Uuid);

impl StoreId {
    /// Allocate a fresh id
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Item identifier
///
/// Opaque and unique; never reused after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    /// Allocate a fresh id
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named inventory container owned by one store owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    /// Store id
    pub store_id: StoreId,

    /// Display name (not required to be unique)
    pub name: String,

    /// Owning principal, immutable after creation
    pub owner: Principal,

    /// Accumulated sales, incremented by purchases and zeroed by withdrawal
    pub sales_balance: Wei,
}

/// A priced, quantity-tracked good belonging to exactly one store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Item id
    pub item_id: ItemId,

    /// Owning store
    pub store_id: StoreId,

    /// Dense zero-based position in the store's live-item list
    ///
    /// Not stable across removals: removing another item may move the last
    /// item of the list into the vacated slot.
    pub index_within_store: usize,

    /// Display name
    pub name: String,

    /// Description
    pub description: String,

    /// Price per unit
    pub price: Wei,

    /// Units in stock
    pub quantity: u64,
}

/// Structured fact emitted by exactly one committed mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketplaceEvent {
    /// A principal was granted the administrator role
    AdministratorAdded {
        /// New administrator
        admin: Principal,
    },

    /// A principal was granted the store-owner role
    StoreOwnerAdded {
        /// New store owner
        store_owner: Principal,
        /// Administrator who granted the role
        administrator: Principal,
    },

    /// A store was created
    StoreCreated {
        /// Owning principal
        store_owner: Principal,
        /// New store id
        store_id: StoreId,
    },

    /// An item was added to a store
    ItemCreated {
        /// Owning store
        store_id: StoreId,
        /// New item id
        item_id: ItemId,
        /// Item name
        name: String,
        /// Item description
        description: String,
        /// Price per unit
        price: Wei,
        /// Initial stock
        quantity: u64,
    },

    /// An item's unit price changed
    ItemPriceUpdated {
        /// Owning store
        store_id: StoreId,
        /// Item
        item_id: ItemId,
        /// New price per unit
        price: Wei,
    },

    /// An item's stock level changed
    ItemQuantityUpdated {
        /// Owning store
        store_id: StoreId,
        /// Item
        item_id: ItemId,
        /// New stock
        quantity: u64,
    },

    /// An item was removed from its store
    ItemRemoved {
        /// Owning store
        store_id: StoreId,
        /// Removed item id (never reused)
        item_id: ItemId,
    },

    /// A purchase was committed
    ItemPurchased {
        /// Store sold from
        store_id: StoreId,
        /// Item sold
        item_id: ItemId,
        /// Units sold
        quantity: u64,
    },

    /// A store's sales balance was paid out to its owner
    SalesWithdrawnFromStore {
        /// Store
        store_id: StoreId,
        /// Amount paid out (may be zero)
        amount: Wei,
    },
}

impl MarketplaceEvent {
    /// Short name for logging and metrics labels
    pub fn kind(&self) -> &'static str {
        match self {
            MarketplaceEvent::AdministratorAdded { .. } => "administrator_added",
            MarketplaceEvent::StoreOwnerAdded { .. } => "store_owner_added",
            MarketplaceEvent::StoreCreated { .. } => "store_created",
            MarketplaceEvent::ItemCreated { .. } => "item_created",
            MarketplaceEvent::ItemPriceUpdated { .. } => "item_price_updated",
            MarketplaceEvent::ItemQuantityUpdated { .. } => "item_quantity_updated",
            MarketplaceEvent::ItemRemoved { .. } => "item_removed",
            MarketplaceEvent::ItemPurchased { .. } => "item_purchased",
            MarketplaceEvent::SalesWithdrawnFromStore { .. } => "sales_withdrawn_from_store",
        }
    }
}

/// Committed event with engine-assigned id and timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Unique event id
    pub event_id: Uuid,

    /// Commit time
    pub recorded_at: DateTime<Utc>,

    /// The fact itself
    pub event: MarketplaceEvent,
}

impl EventRecord {
    /// Wrap a freshly committed event
    pub fn new(event: MarketplaceEvent) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            event,
        }
    }
}
