//! Scenario 6: two `DonationReceived` events for one campaign delivered out
//! of chronological order. Both insert regardless of delivery order, and the
//! aggregate reflects whichever was *applied* second, not whichever is
//! chronologically later. Only rolling back the range and re-observing the
//! same two transactions in chronological order re-derives the correct
//! aggregate — `mark_events_removed` wipes the whole range unconditionally,
//! so the fresh observations need new transaction hashes, exactly as a real
//! reorg's canonical chain would produce.

use super::bootstrap_store;
use crate::fixtures::*;
use indexer_consumer::dispatch::{process_message, Verdict};
use indexer_store::StateStore;

#[tokio::test]
async fn out_of_order_delivery_then_rollback_and_chronological_reobservation() {
    let store = bootstrap_store().await;
    process_message(&store, &campaign_created(99, "0xtx0")).await;

    // Chronologically: block 100 raises to 2e18, block 101 raises to 5e18.
    let earlier = donation_received(100, "0xtxA", 0, 2_000_000_000_000_000_000, 2_000_000_000_000_000_000);
    let later = donation_received(101, "0xtxB", 0, 3_000_000_000_000_000_000, 5_000_000_000_000_000_000);

    // Delivered in reverse: later arrives first.
    assert_eq!(process_message(&store, &later).await, Verdict::Ack);
    assert_eq!(process_message(&store, &earlier).await, Verdict::Ack);

    {
        let mut uow = store.begin().await.unwrap();
        let campaign = uow.get_campaign(addr(CAMPAIGN)).await.unwrap().unwrap();
        // Both rows exist; the aggregate reflects whichever was applied
        // second (the earlier-in-time one, delivered last), not either
        // event's chronological position.
        assert_eq!(campaign.total_raised_wei, 2_000_000_000_000_000_000);
    }

    assert_eq!(process_message(&store, &rollback(99, 101)).await, Verdict::Ack);

    // A reorg's canonical chain re-observes both donations under new
    // transaction hashes; this time delivered (and thus applied) in
    // ascending block order.
    let earlier_reobserved = donation_received(100, "0xtxA2", 0, 2_000_000_000_000_000_000, 2_000_000_000_000_000_000);
    let later_reobserved = donation_received(101, "0xtxB2", 0, 3_000_000_000_000_000_000, 5_000_000_000_000_000_000);
    assert_eq!(process_message(&store, &earlier_reobserved).await, Verdict::Ack);
    assert_eq!(process_message(&store, &later_reobserved).await, Verdict::Ack);

    let mut uow = store.begin().await.unwrap();
    let campaign = uow.get_campaign(addr(CAMPAIGN)).await.unwrap().unwrap();
    assert_eq!(campaign.total_raised_wei, 5_000_000_000_000_000_000);
}
