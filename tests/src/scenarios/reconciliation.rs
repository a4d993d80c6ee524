//! Scenario 5: an underfunded campaign past its deadline is marked
//! `FAILED` by reconciliation, and a second run is a no-op.

use super::bootstrap_store;
use crate::fixtures::*;
use indexer_consumer::dispatch::{process_message, Verdict};
use indexer_store::StateStore;
use indexer_types::CampaignStatus;

#[tokio::test]
async fn expired_underfunded_campaign_is_marked_failed_once() {
    let store = bootstrap_store().await;

    process_message(&store, &campaign_created(100, "0xtx0")).await;
    process_message(
        &store,
        &donation_received(101, "0xtx1", 0, 4_000_000_000_000_000_000, 4_000_000_000_000_000_000),
    )
    .await;

    // DEADLINE_TS is in the past relative to the wall clock `reconciliation`
    // stamps as `published_at`, so this campaign is already eligible.
    assert_eq!(
        process_message(&store, &reconciliation("mark_expired_campaigns")).await,
        Verdict::Ack
    );

    let mut uow = store.begin().await.unwrap();
    let campaign = uow.get_campaign(addr(CAMPAIGN)).await.unwrap().unwrap();
    assert_eq!(campaign.status, CampaignStatus::Failed);
    drop(uow);

    assert_eq!(
        process_message(&store, &reconciliation("mark_expired_campaigns")).await,
        Verdict::Ack
    );
    let mut uow = store.begin().await.unwrap();
    let campaign_again = uow.get_campaign(addr(CAMPAIGN)).await.unwrap().unwrap();
    assert_eq!(campaign_again.status, CampaignStatus::Failed);
}
