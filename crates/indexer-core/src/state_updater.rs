use crate::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use indexer_store::{InsertOutcome, UnitOfWork};
use indexer_types::{Address, ArgMap, Campaign, EventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The event row was new and its effect was applied.
    Applied,
    /// A row with this `(chain_id, tx_hash, log_index)` already existed;
    /// nothing else ran.
    Duplicate,
}

/// Applies one decoded event, in full: insert the append-only event row
/// (or detect the duplicate), then — for everything except
/// `CampaignCreated`, whose campaign upsert already happened inline here —
/// apply its effect exactly once.
///
/// `CampaignCreated` is deliberately never routed through the generic
/// per-event dispatch: its campaign upsert must happen before the event
/// row insert so the row's own foreign key is satisfiable, and running it
/// twice (once for the FK preflight, once generically) would double-apply
/// a creation that should only ever happen once.
#[allow(clippy::too_many_arguments)]
pub async fn apply_event(
    uow: &mut dyn UnitOfWork,
    chain_id: u64,
    kind: EventKind,
    args: &ArgMap,
    tx_hash: &str,
    log_index: u64,
    block_number: u64,
    block_hash: &str,
    now: DateTime<Utc>,
) -> CoreResult<ApplyOutcome> {
    let campaign_address = campaign_address_of(kind, args)?;

    if kind == EventKind::CampaignCreated {
        let campaign = build_campaign(args, now)?;
        uow.upsert_campaign_created(campaign).await?;
    }

    let outcome = uow
        .insert_event(
            chain_id,
            tx_hash,
            log_index,
            block_number,
            block_hash,
            Some(campaign_address),
            kind.as_str(),
            args,
        )
        .await?;

    let InsertOutcome::Inserted(_) = outcome else {
        return Ok(ApplyOutcome::Duplicate);
    };

    match kind {
        EventKind::CampaignCreated => {} // already applied above
        EventKind::DonationReceived => {
            let donor = address_arg(args, "donor")?;
            let amount = uint_arg(args, "amount")?;
            let new_total_raised = uint_arg(args, "newTotalRaised")?;
            uow.apply_donation_received(campaign_address, donor, amount, new_total_raised)
                .await?;
        }
        EventKind::Withdrawn => {
            let amount = uint_arg(args, "amount")?;
            uow.apply_withdrawn(campaign_address, amount).await?;
        }
        EventKind::Refunded => {
            let donor = address_arg(args, "donor")?;
            let amount = uint_arg(args, "amount")?;
            uow.apply_refunded(campaign_address, donor, amount).await?;
        }
    }

    Ok(ApplyOutcome::Applied)
}

fn campaign_address_of(kind: EventKind, args: &ArgMap) -> CoreResult<Address> {
    let _ = kind;
    address_arg(args, "campaign")
}

fn address_arg(args: &ArgMap, key: &str) -> CoreResult<Address> {
    let raw = args
        .get(key)
        .and_then(|v| v.as_address())
        .ok_or_else(|| CoreError::MalformedArgs(format!("missing address arg {key}")))?;
    Address::parse(raw).map_err(|e| CoreError::MalformedArgs(e.to_string()))
}

fn uint_arg(args: &ArgMap, key: &str) -> CoreResult<u128> {
    args.get(key)
        .and_then(|v| v.as_uint())
        .ok_or_else(|| CoreError::MalformedArgs(format!("missing uint arg {key}")))
}

fn build_campaign(args: &ArgMap, now: DateTime<Utc>) -> CoreResult<Campaign> {
    let campaign = address_arg(args, "campaign")?;
    let factory = address_arg(args, "factory")?;
    let creator = address_arg(args, "creator")?;
    let goal = uint_arg(args, "goal")?;
    let deadline = uint_arg(args, "deadline")? as i64;
    let cid = args.get("cid").and_then(|v| v.as_str_value()).map(str::to_string);
    Ok(Campaign::new(campaign, factory, creator, goal, deadline, cid, now))
}
