use crate::state_updater::apply_event;
use crate::CoreResult;
use chrono::Utc;
use indexer_store::UnitOfWork;
use indexer_types::EventKind;
use tracing::warn;

/// Marks every event in `[from_block, to_block]` as removed, resets the
/// aggregates of every campaign they touched, then deterministically
/// replays the surviving events in `(block_number, log_index)` order.
/// Running this twice over the same range yields the same state.
pub async fn handle_rollback(
    uow: &mut dyn UnitOfWork,
    chain_id: u64,
    from_block: u64,
    to_block: u64,
) -> CoreResult<()> {
    let affected = uow.mark_events_removed(chain_id, from_block, to_block).await?;

    for campaign in &affected {
        uow.reset_campaign_for_rollback(*campaign).await?;
        uow.reset_contributions_for_campaign(*campaign).await?;
    }

    let surviving = uow.surviving_events_in_range(chain_id, from_block, to_block).await?;
    for event in surviving {
        let Some(kind) = kind_from_name(&event.event_name) else {
            warn!(event_name = %event.event_name, "skipping unknown event kind during replay");
            continue;
        };
        // A per-event failure during replay should not abort the whole
        // pass — later surviving events are independent of it.
        if let Err(err) = apply_event(
            uow,
            chain_id,
            kind,
            &event.event_data,
            &event.tx_hash,
            event.log_index,
            event.block_number,
            &event.block_hash,
            Utc::now(),
        )
        .await
        {
            warn!(tx_hash = %event.tx_hash, error = %err, "replay of surviving event failed, continuing");
        }
    }

    Ok(())
}

fn kind_from_name(name: &str) -> Option<EventKind> {
    match name {
        "CampaignCreated" => Some(EventKind::CampaignCreated),
        "DonationReceived" => Some(EventKind::DonationReceived),
        "Withdrawn" => Some(EventKind::Withdrawn),
        "Refunded" => Some(EventKind::Refunded),
        _ => None,
    }
}
