//! Scenario 3: a rollback over the block containing the first donation,
//! followed by a *different* donation landing at the same height.

use super::bootstrap_store;
use crate::fixtures::*;
use indexer_consumer::dispatch::{process_message, Verdict};
use indexer_store::StateStore;
use indexer_types::CampaignStatus;

#[tokio::test]
async fn rollback_then_replay_with_a_different_donation() {
    let store = bootstrap_store().await;

    process_message(&store, &campaign_created(99, "0xtx0")).await;
    assert_eq!(
        process_message(&store, &donation_received(100, "0xtx1", 0, 2_000_000_000_000_000_000, 2_000_000_000_000_000_000)).await,
        Verdict::Ack
    );

    assert_eq!(process_message(&store, &rollback(100, 100)).await, Verdict::Ack);

    {
        let mut uow = store.begin().await.unwrap();
        let campaign = uow.get_campaign(addr(CAMPAIGN)).await.unwrap().unwrap();
        assert_eq!(campaign.total_raised_wei, 0);
        assert_eq!(campaign.status, CampaignStatus::Active);

        let contribution = uow.get_contribution(addr(CAMPAIGN), addr(DONOR)).await.unwrap().unwrap();
        assert_eq!(contribution.contributed_wei, 0);
        assert_eq!(contribution.refunded_wei, 0);
    }

    assert_eq!(
        process_message(&store, &donation_received(100, "0xtx2", 0, 3_000_000_000_000_000_000, 3_000_000_000_000_000_000)).await,
        Verdict::Ack
    );

    let mut uow = store.begin().await.unwrap();
    let campaign = uow.get_campaign(addr(CAMPAIGN)).await.unwrap().unwrap();
    assert_eq!(campaign.total_raised_wei, 3_000_000_000_000_000_000);
}
