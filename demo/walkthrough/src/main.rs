//! Marketplace walkthrough - drives the engine end to end
//!
//! Opens the engine, grants roles, stocks a store, runs purchases and a
//! withdrawal, then dumps the event log and metrics. Useful as a smoke test
//! and as a living example of the engine API.

use anyhow::Result;
use marketplace_core::{Config, InProcessChannel, Marketplace, Principal, Wei};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut config = Config::default();
    config.genesis.administrator = Principal::new("0xdeployer");

    let channel = Arc::new(InProcessChannel::new());
    let market = Marketplace::open_with_channel(config, channel.clone())?;

    let deployer = Principal::new("0xdeployer");
    let admin = Principal::new("0xadmin");
    let owner = Principal::new("0xowner");
    let customer = Principal::new("0xcustomer");

    // Roles: deployer grants an administrator, who grants a store owner
    market.add_administrator(deployer, admin.clone()).await?;
    market.add_store_owner(admin, owner.clone()).await?;
    info!(owners = ?market.store_owners().await?, "Roles granted");

    // The owner opens a store and stocks it
    let store_id = market.create_store(owner.clone(), "First Store").await?;
    let coffee = market
        .create_item(
            owner.clone(),
            store_id,
            "Coffee",
            "Single-origin beans, 250g",
            Wei::new(500),
            10,
        )
        .await?;
    let mug = market
        .create_item(
            owner.clone(),
            store_id,
            "Mug",
            "Stoneware, 300ml",
            Wei::new(650),
            400,
        )
        .await?;
    info!(store = %store_id, items = market.item_count(store_id).await?, "Store stocked");

    // A customer buys five bags of coffee at the exact price
    market
        .purchase_item(customer.clone(), store_id, coffee, 5, Wei::new(2500))
        .await?;

    // Overpaying works too; the excess is retained
    market
        .purchase_item(customer.clone(), store_id, mug, 1, Wei::new(1000))
        .await?;

    // A purchase beyond stock is rejected with no state change
    if let Err(err) = market
        .purchase_item(customer, store_id, coffee, 100, Wei::new(50_000))
        .await
    {
        info!(kind = err.kind(), "Oversized purchase rejected: {}", err);
    }

    let store = market.store(store_id).await?;
    info!(balance = %store.sales_balance, "Sales accrued");

    // The owner removes the mug; the live list compacts
    market.remove_item(owner.clone(), store_id, mug).await?;
    info!(items = ?market.store_item_ids(store_id).await?, "After removal");

    // The owner withdraws everything; balance moves through the channel
    let amount = market.withdraw_sales(owner.clone(), store_id).await?;
    info!(
        %amount,
        owner_balance = %channel.balance_of(&owner),
        "Sales withdrawn"
    );

    // Dump the event log
    for record in market.events().await? {
        println!("{}", serde_json::to_string(&record)?);
    }

    info!(
        transactions = market.metrics().transactions_total.get(),
        rejections = market.metrics().rejections_total.get(),
        "Walkthrough complete"
    );

    market.shutdown().await?;
    Ok(())
}
