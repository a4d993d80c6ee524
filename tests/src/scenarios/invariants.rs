//! The quantified invariants from the testable-properties table, checked
//! directly rather than as a generator-driven property test: each is
//! exercised against a handful of representative event sequences.

use super::bootstrap_store;
use crate::fixtures::*;
use indexer_consumer::dispatch::{process_message, Verdict};
use indexer_store::StateStore;
use indexer_types::CampaignStatus;

#[tokio::test]
async fn idempotence_of_application() {
    let store = bootstrap_store().await;
    process_message(&store, &campaign_created(100, "0xtx0")).await;
    let donation = donation_received(101, "0xtx1", 0, 2_000_000_000_000_000_000, 2_000_000_000_000_000_000);

    for _ in 0..5 {
        assert_eq!(process_message(&store, &donation).await, Verdict::Ack);
    }

    let mut uow = store.begin().await.unwrap();
    let campaign = uow.get_campaign(addr(CAMPAIGN)).await.unwrap().unwrap();
    assert_eq!(campaign.total_raised_wei, 2_000_000_000_000_000_000);
    let contribution = uow.get_contribution(addr(CAMPAIGN), addr(DONOR)).await.unwrap().unwrap();
    assert_eq!(contribution.contributed_wei, 2_000_000_000_000_000_000);
}

#[tokio::test]
async fn withdrawn_status_survives_further_non_rollback_messages() {
    let store = bootstrap_store().await;
    process_message(&store, &campaign_created(100, "0xtx0")).await;
    process_message(
        &store,
        &donation_received(101, "0xtx1", 0, 10_000_000_000_000_000_000, 10_000_000_000_000_000_000),
    )
    .await;
    process_message(&store, &withdrawn(102, "0xtx2", 10_000_000_000_000_000_000)).await;

    // A stray late donation (the donor re-sent after the creator already
    // withdrew) must not reopen the campaign.
    process_message(
        &store,
        &donation_received(103, "0xtx3", 0, 1_000_000_000_000_000_000, 11_000_000_000_000_000_000),
    )
    .await;
    // Nor does a reconciliation sweep touch a withdrawn campaign.
    process_message(&store, &reconciliation("mark_expired_campaigns")).await;

    let mut uow = store.begin().await.unwrap();
    let campaign = uow.get_campaign(addr(CAMPAIGN)).await.unwrap().unwrap();
    assert_eq!(campaign.status, CampaignStatus::Withdrawn);
}

#[tokio::test]
async fn net_contribution_never_goes_negative() {
    let store = bootstrap_store().await;
    process_message(&store, &campaign_created(100, "0xtx0")).await;
    process_message(
        &store,
        &donation_received(101, "0xtx1", 0, 2_000_000_000_000_000_000, 2_000_000_000_000_000_000),
    )
    .await;
    process_message(&store, &refunded(102, "0xtx2", 2_000_000_000_000_000_000)).await;

    let mut uow = store.begin().await.unwrap();
    let contribution = uow.get_contribution(addr(CAMPAIGN), addr(DONOR)).await.unwrap().unwrap();
    assert!(contribution.contributed_wei >= contribution.refunded_wei);
    assert_eq!(contribution.net_wei(), 0);
}

#[tokio::test]
async fn duplicate_tx_log_index_never_produces_a_second_event_row() {
    let store = bootstrap_store().await;
    process_message(&store, &campaign_created(100, "0xtx0")).await;
    let donation = donation_received(101, "0xtx1", 0, 2_000_000_000_000_000_000, 2_000_000_000_000_000_000);

    assert_eq!(process_message(&store, &donation).await, Verdict::Ack);
    assert_eq!(process_message(&store, &donation).await, Verdict::Ack);
    assert_eq!(process_message(&store, &donation).await, Verdict::Ack);

    // Redelivery under the same (chain_id, tx_hash, log_index) must never
    // double the lifetime contribution; `InsertOutcome::Duplicate` is what
    // keeps the per-event effect from running more than once.
    let mut uow = store.begin().await.unwrap();
    let contribution = uow.get_contribution(addr(CAMPAIGN), addr(DONOR)).await.unwrap().unwrap();
    assert_eq!(contribution.contributed_wei, 2_000_000_000_000_000_000);
}
