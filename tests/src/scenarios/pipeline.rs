//! Exercises the full bus-to-store path — `InMemoryBus::publish` through
//! `indexer_consumer::worker::run_worker`'s ack/nack/reject loop — rather
//! than calling `dispatch::process_message` directly, so the worker's own
//! wiring (not just the pure dispatch function the other scenarios use) is
//! under test at least once.

use super::bootstrap_store;
use crate::fixtures::*;
use indexer_bus::memory::InMemoryBus;
use indexer_bus::topology::WORK_QUEUES;
use indexer_bus::MessageBus;
use indexer_store::StateStore;
use indexer_types::CampaignStatus;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn published_events_flow_through_workers_into_the_store() {
    let store = bootstrap_store().await;
    let bus = InMemoryBus::new(&WORK_QUEUES);

    bus.publish("event.campaign_created", &campaign_created(100, "0xtx0"))
        .await
        .unwrap();
    bus.publish(
        "event.donation_received",
        &donation_received(101, "0xtx1", 0, 10_000_000_000_000_000_000, 10_000_000_000_000_000_000),
    )
    .await
    .unwrap();
    bus.publish("event.withdrawn", &withdrawn(102, "0xtx2", 10_000_000_000_000_000_000))
        .await
        .unwrap();

    let consumers: Vec<(String, Box<dyn indexer_bus::Consumer>)> = vec![
        ("campaign-worker".to_string(), Box::new(bus.take_consumer("queue.campaign_created").await)),
        ("donation-worker".to_string(), Box::new(bus.take_consumer("queue.donation_received").await)),
        ("withdrawal-worker".to_string(), Box::new(bus.take_consumer("queue.withdrawal_refund").await)),
    ];

    let shutdown = CancellationToken::new();
    let handles = indexer_consumer::spawn_workers(consumers, store.clone(), 5, shutdown.clone());

    // The three messages are already queued; give the workers one scheduler
    // pass to drain them before tearing the pool down.
    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.cancel();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let mut uow = store.begin().await.unwrap();
    let campaign = uow.get_campaign(addr(CAMPAIGN)).await.unwrap().unwrap();
    assert_eq!(campaign.status, CampaignStatus::Withdrawn);
    assert_eq!(campaign.total_raised_wei, 10_000_000_000_000_000_000);
}
