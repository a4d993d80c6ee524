//! Scenarios 1, 2 and 4 of the testable-properties table: the straight-line
//! create/donate/withdraw path, a duplicate delivery, and a refund that
//! doesn't reach the goal.

use super::bootstrap_store;
use crate::fixtures::*;
use indexer_consumer::dispatch::{process_message, Verdict};
use indexer_store::StateStore;
use indexer_types::CampaignStatus;

#[tokio::test]
async fn create_donate_to_goal_then_withdraw() {
    let store = bootstrap_store().await;

    assert_eq!(process_message(&store, &campaign_created(100, "0xtx0")).await, Verdict::Ack);
    assert_eq!(
        process_message(&store, &donation_received(101, "0xtx1", 0, 2_000_000_000_000_000_000, 2_000_000_000_000_000_000)).await,
        Verdict::Ack
    );
    assert_eq!(
        process_message(&store, &donation_received(102, "0xtx2", 0, 8_000_000_000_000_000_000, 10_000_000_000_000_000_000)).await,
        Verdict::Ack
    );
    assert_eq!(
        process_message(&store, &withdrawn(103, "0xtx3", 10_000_000_000_000_000_000)).await,
        Verdict::Ack
    );

    let mut uow = store.begin().await.unwrap();
    let campaign = uow.get_campaign(addr(CAMPAIGN)).await.unwrap().unwrap();
    assert_eq!(campaign.status, CampaignStatus::Withdrawn);
    assert_eq!(campaign.withdrawn_amount_wei, Some(10_000_000_000_000_000_000));
    assert_eq!(campaign.total_raised_wei, 10_000_000_000_000_000_000);

    let contribution = uow.get_contribution(addr(CAMPAIGN), addr(DONOR)).await.unwrap().unwrap();
    assert_eq!(contribution.contributed_wei, 10_000_000_000_000_000_000);
    assert_eq!(contribution.refunded_wei, 0);
}

#[tokio::test]
async fn duplicate_campaign_created_delivery_is_a_single_row() {
    let store = bootstrap_store().await;
    let message = campaign_created(100, "0xtx0");

    assert_eq!(process_message(&store, &message).await, Verdict::Ack);
    assert_eq!(process_message(&store, &message).await, Verdict::Ack);

    let mut uow = store.begin().await.unwrap();
    let campaign = uow.get_campaign(addr(CAMPAIGN)).await.unwrap();
    assert!(campaign.is_some());
}

#[tokio::test]
async fn refund_below_goal_leaves_campaign_active_until_reconciled() {
    let store = bootstrap_store().await;

    process_message(&store, &campaign_created(100, "0xtx0")).await;
    process_message(
        &store,
        &donation_received(101, "0xtx1", 0, 2_000_000_000_000_000_000, 2_000_000_000_000_000_000),
    )
    .await;
    assert_eq!(
        process_message(&store, &refunded(102, "0xtx2", 2_000_000_000_000_000_000)).await,
        Verdict::Ack
    );

    let mut uow = store.begin().await.unwrap();
    let contribution = uow.get_contribution(addr(CAMPAIGN), addr(DONOR)).await.unwrap().unwrap();
    assert_eq!(contribution.contributed_wei, 2_000_000_000_000_000_000);
    assert_eq!(contribution.refunded_wei, 2_000_000_000_000_000_000);

    let campaign = uow.get_campaign(addr(CAMPAIGN)).await.unwrap().unwrap();
    assert_eq!(campaign.status, CampaignStatus::Active);
    assert_eq!(campaign.total_raised_wei, 2_000_000_000_000_000_000);
}
