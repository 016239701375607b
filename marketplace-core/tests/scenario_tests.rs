//! Behavioral tests for the marketplace engine
//!
//! These drive the public async API end to end: role grants, store and item
//! management, purchases, and withdrawal, asserting events, balances,
//! indices, and error kinds.

use marketplace_core::{
    Config, InProcessChannel, Marketplace, MarketplaceEvent, Principal, Wei,
};
use std::sync::Arc;

fn config_with_genesis(admin: &str) -> Config {
    let mut config = Config::default();
    config.genesis.administrator = Principal::new(admin);
    config
}

fn p(name: &str) -> Principal {
    Principal::new(name)
}

async fn open_market() -> Marketplace {
    Marketplace::open(config_with_genesis("a0")).unwrap()
}

#[tokio::test]
async fn add_administrator() {
    let market = open_market().await;

    market.add_administrator(p("a0"), p("a1")).await.unwrap();
    assert!(market.is_administrator(p("a1")).await.unwrap());

    // The grant emitted exactly one fact
    let events = market.events().await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].event,
        MarketplaceEvent::AdministratorAdded { admin: p("a1") }
    );

    // A freshly granted administrator can grant in turn
    market.add_administrator(p("a1"), p("a2")).await.unwrap();
    assert!(market.is_administrator(p("a2")).await.unwrap());

    // A non-administrator cannot
    let err = market
        .add_administrator(p("nobody"), p("a3"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "unauthorized");
    assert!(!market.is_administrator(p("a3")).await.unwrap());

    // Duplicate grant is rejected, not silently ignored
    let err = market.add_administrator(p("a0"), p("a1")).await.unwrap_err();
    assert_eq!(err.kind(), "already_exists");

    assert_eq!(
        market.administrators().await.unwrap(),
        vec![p("a0"), p("a1"), p("a2")]
    );

    market.shutdown().await.unwrap();
}

#[tokio::test]
async fn create_store_owner() {
    let market = open_market().await;
    market.add_administrator(p("a0"), p("a1")).await.unwrap();

    market.add_store_owner(p("a1"), p("s1")).await.unwrap();
    assert!(market.is_store_owner(p("s1")).await.unwrap());
    assert_eq!(market.store_owners().await.unwrap(), vec![p("s1")]);

    let events = market.events().await.unwrap();
    assert_eq!(
        events.last().unwrap().event,
        MarketplaceEvent::StoreOwnerAdded {
            store_owner: p("s1"),
            administrator: p("a1"),
        }
    );

    let err = market.add_store_owner(p("a1"), p("s1")).await.unwrap_err();
    assert_eq!(err.kind(), "already_exists");

    market.shutdown().await.unwrap();
}

#[tokio::test]
async fn create_and_get_stores() {
    let market = open_market().await;
    market.add_store_owner(p("a0"), p("s1")).await.unwrap();

    let first = market.create_store(p("s1"), "First Store").await.unwrap();
    let second = market.create_store(p("s1"), "Second Store").await.unwrap();

    let owned = market.owner_store_ids(p("s1")).await.unwrap();
    assert_eq!(owned, vec![first, second]);
    assert_eq!(market.all_store_ids().await.unwrap(), vec![first, second]);
    assert_eq!(market.store_count().await.unwrap(), 2);

    let events = market.events().await.unwrap();
    assert_eq!(
        events.last().unwrap().event,
        MarketplaceEvent::StoreCreated {
            store_owner: p("s1"),
            store_id: second,
        }
    );

    let store = market.store(first).await.unwrap();
    assert_eq!(store.name, "First Store");
    assert_eq!(store.owner, p("s1"));
    assert_eq!(store.sales_balance, Wei::ZERO);

    let store = market.store_by_index(1).await.unwrap();
    assert_eq!(store.name, "Second Store");
    assert_eq!(market.store_by_index(2).await.unwrap_err().kind(), "not_found");

    // Not a store owner
    let err = market
        .create_store(p("s2"), "First Store")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "unauthorized");
    assert_eq!(market.store_count().await.unwrap(), 2);

    market.shutdown().await.unwrap();
}

#[tokio::test]
async fn create_get_update_remove_items() {
    let market = open_market().await;
    market.add_store_owner(p("a0"), p("s1")).await.unwrap();
    let store_id = market.create_store(p("s1"), "First Store").await.unwrap();

    let first = market
        .create_item(
            p("s1"),
            store_id,
            "First Item",
            "This is a cool item",
            Wei::new(500),
            10,
        )
        .await
        .unwrap();
    let second = market
        .create_item(
            p("s1"),
            store_id,
            "Second Item",
            "This is another cool item",
            Wei::new(650),
            400,
        )
        .await
        .unwrap();

    assert_eq!(
        market.store_item_ids(store_id).await.unwrap(),
        vec![first, second]
    );

    let events = market.events().await.unwrap();
    assert_eq!(
        events.last().unwrap().event,
        MarketplaceEvent::ItemCreated {
            store_id,
            item_id: second,
            name: "Second Item".to_string(),
            description: "This is another cool item".to_string(),
            price: Wei::new(650),
            quantity: 400,
        }
    );

    let item = market.item(first).await.unwrap();
    assert_eq!(item.item_id, first);
    assert_eq!(item.index_within_store, 0);
    assert_eq!(item.name, "First Item");
    assert_eq!(item.description, "This is a cool item");
    assert_eq!(item.price, Wei::new(500));
    assert_eq!(item.quantity, 10);

    let item = market.item(second).await.unwrap();
    assert_eq!(item.index_within_store, 1);

    // In-place updates: no index change
    market
        .update_item_price(p("s1"), store_id, first, Wei::new(200))
        .await
        .unwrap();
    market
        .update_item_quantity(p("s1"), store_id, first, 300)
        .await
        .unwrap();
    let item = market.item(first).await.unwrap();
    assert_eq!(item.price, Wei::new(200));
    assert_eq!(item.quantity, 300);
    assert_eq!(item.index_within_store, 0);

    // Removal compacts the live list and kills the id forever
    market.remove_item(p("s1"), store_id, first).await.unwrap();
    assert_eq!(market.item(first).await.unwrap_err().kind(), "not_found");

    let remaining = market.store_item_ids(store_id).await.unwrap();
    assert_eq!(remaining, vec![second]);

    let item = market.item(second).await.unwrap();
    assert_eq!(item.index_within_store, 0);
    assert_eq!(item.price, Wei::new(650));
    assert_eq!(item.quantity, 400);

    market.remove_item(p("s1"), store_id, second).await.unwrap();
    assert!(market.store_item_ids(store_id).await.unwrap().is_empty());
    assert_eq!(market.item_count(store_id).await.unwrap(), 0);

    market.shutdown().await.unwrap();
}

#[tokio::test]
async fn item_purchase_and_store_withdrawal() {
    let channel = Arc::new(InProcessChannel::new());
    let market =
        Marketplace::open_with_channel(config_with_genesis("a0"), channel.clone()).unwrap();
    market.add_store_owner(p("a0"), p("s1")).await.unwrap();
    let store_id = market.create_store(p("s1"), "First Store").await.unwrap();

    let item_price = Wei::new(1_000_000_000_000_000_000); // 1 ether in wei
    let first = market
        .create_item(p("s1"), store_id, "First Item", "This is a cool item", item_price, 10)
        .await
        .unwrap();
    market
        .create_item(
            p("s1"),
            store_id,
            "Second Item",
            "This is another cool item",
            Wei::new(650),
            400,
        )
        .await
        .unwrap();

    let five_ether = item_price.checked_mul_qty(5).unwrap();
    market
        .purchase_item(p("c1"), store_id, first, 5, five_ether)
        .await
        .unwrap();

    let events = market.events().await.unwrap();
    assert_eq!(
        events.last().unwrap().event,
        MarketplaceEvent::ItemPurchased {
            store_id,
            item_id: first,
            quantity: 5,
        }
    );

    assert_eq!(
        market.store(store_id).await.unwrap().sales_balance,
        five_ether
    );
    assert_eq!(market.item(first).await.unwrap().quantity, 5);

    // More units than stock
    let err = market
        .purchase_item(p("c1"), store_id, first, 6, item_price.checked_mul_qty(6).unwrap())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "insufficient_stock");

    // Underpayment
    let err = market
        .purchase_item(p("c1"), store_id, first, 4, item_price)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "insufficient_payment");

    // Rejected purchases changed nothing
    assert_eq!(market.item(first).await.unwrap().quantity, 5);
    assert_eq!(
        market.store(store_id).await.unwrap().sales_balance,
        five_ether
    );

    // Withdrawal pays the owner through the channel and zeroes the balance
    let amount = market.withdraw_sales(p("s1"), store_id).await.unwrap();
    assert_eq!(amount, five_ether);
    assert_eq!(channel.balance_of(&p("s1")), five_ether);
    assert_eq!(market.store(store_id).await.unwrap().sales_balance, Wei::ZERO);

    let events = market.events().await.unwrap();
    assert_eq!(
        events.last().unwrap().event,
        MarketplaceEvent::SalesWithdrawnFromStore {
            store_id,
            amount: five_ether,
        }
    );

    market.shutdown().await.unwrap();
}

#[tokio::test]
async fn withdrawal_requires_ownership() {
    let market = open_market().await;
    market.add_store_owner(p("a0"), p("s1")).await.unwrap();
    let store_id = market.create_store(p("s1"), "Shop").await.unwrap();

    let err = market.withdraw_sales(p("c1"), store_id).await.unwrap_err();
    assert_eq!(err.kind(), "unauthorized");

    // Zero-balance withdrawal by the owner is a permitted no-op
    let amount = market.withdraw_sales(p("s1"), store_id).await.unwrap();
    assert_eq!(amount, Wei::ZERO);

    market.shutdown().await.unwrap();
}

#[tokio::test]
async fn excess_payment_is_retained() {
    let market = open_market().await;
    market.add_store_owner(p("a0"), p("s1")).await.unwrap();
    let store_id = market.create_store(p("s1"), "Shop").await.unwrap();
    let item = market
        .create_item(p("s1"), store_id, "Widget", "A widget", Wei::new(100), 10)
        .await
        .unwrap();

    // 1000 attached for a 300 total: only the exact price is accounted
    market
        .purchase_item(p("c1"), store_id, item, 3, Wei::new(1000))
        .await
        .unwrap();
    assert_eq!(
        market.store(store_id).await.unwrap().sales_balance,
        Wei::new(300)
    );

    market.shutdown().await.unwrap();
}

#[tokio::test]
async fn owner_may_buy_from_own_store() {
    let market = open_market().await;
    market.add_store_owner(p("a0"), p("s1")).await.unwrap();
    let store_id = market.create_store(p("s1"), "Shop").await.unwrap();
    let item = market
        .create_item(p("s1"), store_id, "Widget", "A widget", Wei::new(100), 10)
        .await
        .unwrap();

    // No buyer/owner restriction exists
    market
        .purchase_item(p("s1"), store_id, item, 1, Wei::new(100))
        .await
        .unwrap();
    assert_eq!(market.item(item).await.unwrap().quantity, 9);

    market.shutdown().await.unwrap();
}

#[tokio::test]
async fn queries_are_idempotent() {
    let market = open_market().await;
    market.add_store_owner(p("a0"), p("s1")).await.unwrap();
    let store_id = market.create_store(p("s1"), "Shop").await.unwrap();
    let item = market
        .create_item(p("s1"), store_id, "Widget", "A widget", Wei::new(100), 10)
        .await
        .unwrap();

    let store_a = market.store(store_id).await.unwrap();
    let store_b = market.store(store_id).await.unwrap();
    assert_eq!(store_a, store_b);

    let item_a = market.item(item).await.unwrap();
    let item_b = market.item(item).await.unwrap();
    assert_eq!(item_a, item_b);

    market.shutdown().await.unwrap();
}

#[tokio::test]
async fn event_log_orders_one_fact_per_mutation() {
    let market = open_market().await;
    market.add_store_owner(p("a0"), p("s1")).await.unwrap();
    let store_id = market.create_store(p("s1"), "Shop").await.unwrap();
    let item = market
        .create_item(p("s1"), store_id, "Widget", "A widget", Wei::new(100), 10)
        .await
        .unwrap();
    market
        .update_item_price(p("s1"), store_id, item, Wei::new(150))
        .await
        .unwrap();
    market
        .purchase_item(p("c1"), store_id, item, 1, Wei::new(150))
        .await
        .unwrap();
    market.remove_item(p("s1"), store_id, item).await.unwrap();
    market.withdraw_sales(p("s1"), store_id).await.unwrap();

    // A rejected call emits nothing
    let _ = market.add_store_owner(p("nobody"), p("x")).await;

    let kinds: Vec<&str> = market
        .events()
        .await
        .unwrap()
        .iter()
        .map(|record| record.event.kind())
        .collect();
    assert_eq!(
        kinds,
        vec![
            "store_owner_added",
            "store_created",
            "item_created",
            "item_price_updated",
            "item_purchased",
            "item_removed",
            "sales_withdrawn_from_store",
        ]
    );

    market.shutdown().await.unwrap();
}
