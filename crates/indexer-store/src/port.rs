use crate::StoreResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexer_types::{Address, Campaign, Chain, Contribution, Event, EventKind, SyncState};
use std::collections::BTreeMap;

/// Outcome of inserting an event row keyed by `(chain_id, tx_hash, log_index)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The row did not exist and was inserted.
    Inserted(i64),
    /// A row with the same key already existed; nothing was written.
    Duplicate,
}

/// A transactional boundary opened per consumed message. All mutation
/// methods below run within it; `commit` and `rollback` consume the
/// value so a unit of work can only be finalized once.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn ensure_chain_exists(&mut self, chain_id: u64, name: &str) -> StoreResult<Chain>;

    async fn get_sync_state(&mut self, chain_id: u64) -> StoreResult<Option<SyncState>>;
    async fn advance_cursor(
        &mut self,
        chain_id: u64,
        block: u64,
        hash: &str,
    ) -> StoreResult<()>;
    async fn rewind_cursor(&mut self, chain_id: u64, block: u64, hash: &str) -> StoreResult<()>;

    async fn get_campaign(&mut self, address: Address) -> StoreResult<Option<Campaign>>;

    /// The donor's lifetime relationship with the campaign, if any
    /// contribution has ever been recorded.
    async fn get_contribution(
        &mut self,
        campaign: Address,
        donor: Address,
    ) -> StoreResult<Option<Contribution>>;

    /// Upserts a campaign from `CampaignCreated`. Matches the state
    /// updater's rule: if it already exists and isn't `SUCCESS`/`WITHDRAWN`,
    /// constants are refreshed and status resets to `ACTIVE`.
    async fn upsert_campaign_created(&mut self, campaign: Campaign) -> StoreResult<()>;

    /// Inserts the append-only event row. Returns `Duplicate` on a unique
    /// conflict rather than erroring — that is the documented dedup path.
    async fn insert_event(
        &mut self,
        chain_id: u64,
        tx_hash: &str,
        log_index: u64,
        block_number: u64,
        block_hash: &str,
        address: Option<Address>,
        event_name: &str,
        event_data: &BTreeMap<String, indexer_types::ArgValue>,
    ) -> StoreResult<InsertOutcome>;

    async fn apply_donation_received(
        &mut self,
        campaign: Address,
        donor: Address,
        amount: u128,
        new_total_raised: u128,
    ) -> StoreResult<()>;

    async fn apply_withdrawn(
        &mut self,
        campaign: Address,
        amount: u128,
    ) -> StoreResult<()>;

    async fn apply_refunded(&mut self, campaign: Address, donor: Address, amount: u128) -> StoreResult<()>;

    /// Marks every non-removed event for `chain_id` in `[from, to]` as
    /// removed, returning the distinct set of addresses they reference —
    /// the rollback handler's "affected set".
    async fn mark_events_removed(
        &mut self,
        chain_id: u64,
        from: u64,
        to: u64,
    ) -> StoreResult<Vec<Address>>;

    async fn reset_campaign_for_rollback(&mut self, address: Address) -> StoreResult<()>;
    async fn reset_contributions_for_campaign(&mut self, campaign: Address) -> StoreResult<()>;

    /// Non-removed events for `chain_id` in `[from, to]`, ordered by
    /// `(block_number, log_index)` ascending — the replay order.
    async fn surviving_events_in_range(
        &mut self,
        chain_id: u64,
        from: u64,
        to: u64,
    ) -> StoreResult<Vec<Event>>;

    /// `ACTIVE` campaigns past `deadline_ts`, below goal, not withdrawn.
    async fn expired_underfunded_campaigns(
        &mut self,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<Address>>;

    async fn mark_campaign_failed(&mut self, address: Address) -> StoreResult<()>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}

/// Driving port for acquiring a unit of work.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>>;
}

/// Translates a decoded event kind to its canonical storage name, so the
/// store layer never hardcodes the string literals scattered through the
/// spec's event table.
pub fn event_name(kind: EventKind) -> &'static str {
    kind.as_str()
}
