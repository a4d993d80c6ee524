//! In-memory `StateStore` adapter used by `indexer-core`'s unit tests and
//! the workspace's scenario tests. A unit of work works against a private
//! snapshot of the whole store and is only folded back in on `commit`,
//! giving the same "all or nothing" guarantee a real transaction gives
//! without needing a database.

use crate::port::{InsertOutcome, StateStore, UnitOfWork};
use crate::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexer_types::{
    Address, ArgValue, Campaign, CampaignStatus, Chain, Contribution, Event,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default, Clone)]
struct Storage {
    chains: HashMap<u64, Chain>,
    sync_states: HashMap<u64, indexer_types::SyncState>,
    campaigns: HashMap<Address, Campaign>,
    contributions: HashMap<(Address, Address), Contribution>,
    events: Vec<Event>,
    next_chain_id: i64,
    next_contribution_id: i64,
    next_event_id: i64,
}

#[derive(Clone, Default)]
pub struct InMemoryStateStore {
    inner: Arc<Mutex<Storage>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        let snapshot = self.inner.lock().await.clone();
        Ok(Box::new(InMemoryUnitOfWork {
            shared: self.inner.clone(),
            working: snapshot,
        }))
    }
}

struct InMemoryUnitOfWork {
    shared: Arc<Mutex<Storage>>,
    working: Storage,
}

fn find_event_idx(events: &[Event], chain_id: u64, tx_hash: &str, log_index: u64) -> Option<usize> {
    events
        .iter()
        .position(|e| e.chain_id == chain_id && e.tx_hash == tx_hash && e.log_index == log_index)
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn ensure_chain_exists(&mut self, chain_id: u64, name: &str) -> StoreResult<Chain> {
        if let Some(chain) = self.working.chains.get(&chain_id) {
            return Ok(chain.clone());
        }
        self.working.next_chain_id += 1;
        let now = Utc::now();
        let chain = Chain {
            id: self.working.next_chain_id,
            name: name.to_string(),
            chain_id,
            rpc_url: None,
            created_at: now,
            updated_at: now,
        };
        self.working.chains.insert(chain_id, chain.clone());
        self.working
            .sync_states
            .entry(chain_id)
            .or_insert_with(|| indexer_types::SyncState::genesis(chain_id));
        Ok(chain)
    }

    async fn get_sync_state(&mut self, chain_id: u64) -> StoreResult<Option<indexer_types::SyncState>> {
        Ok(self.working.sync_states.get(&chain_id).cloned())
    }

    async fn advance_cursor(&mut self, chain_id: u64, block: u64, hash: &str) -> StoreResult<()> {
        let state = self
            .working
            .sync_states
            .entry(chain_id)
            .or_insert_with(|| indexer_types::SyncState::genesis(chain_id));
        state.last_block = block;
        state.last_block_hash = Some(hash.to_string());
        state.updated_at = Utc::now();
        Ok(())
    }

    async fn rewind_cursor(&mut self, chain_id: u64, block: u64, hash: &str) -> StoreResult<()> {
        self.advance_cursor(chain_id, block, hash).await
    }

    async fn get_campaign(&mut self, address: Address) -> StoreResult<Option<Campaign>> {
        Ok(self.working.campaigns.get(&address).cloned())
    }

    async fn get_contribution(
        &mut self,
        campaign: Address,
        donor: Address,
    ) -> StoreResult<Option<Contribution>> {
        Ok(self.working.contributions.get(&(campaign, donor)).cloned())
    }

    async fn upsert_campaign_created(&mut self, campaign: Campaign) -> StoreResult<()> {
        match self.working.campaigns.get(&campaign.address) {
            Some(existing)
                if matches!(existing.status, CampaignStatus::Success | CampaignStatus::Withdrawn) =>
            {
                // Terminal states are not reopened by a replayed creation.
            }
            _ => {
                self.working.campaigns.insert(campaign.address, campaign);
            }
        }
        Ok(())
    }

    async fn insert_event(
        &mut self,
        chain_id: u64,
        tx_hash: &str,
        log_index: u64,
        block_number: u64,
        block_hash: &str,
        address: Option<Address>,
        event_name: &str,
        event_data: &BTreeMap<String, ArgValue>,
    ) -> StoreResult<InsertOutcome> {
        if find_event_idx(&self.working.events, chain_id, tx_hash, log_index).is_some() {
            return Ok(InsertOutcome::Duplicate);
        }
        if !self.working.chains.contains_key(&chain_id) {
            return Err(StoreError::UnknownChain(chain_id));
        }
        if let Some(addr) = address {
            if event_name != "CampaignCreated" && !self.working.campaigns.contains_key(&addr) {
                return Err(StoreError::UnknownCampaign(addr.to_string()));
            }
        }
        self.working.next_event_id += 1;
        let id = self.working.next_event_id;
        self.working.events.push(Event {
            id,
            chain_id,
            tx_hash: tx_hash.to_string(),
            log_index,
            block_number,
            block_hash: block_hash.to_string(),
            address,
            event_name: event_name.to_string(),
            event_data: event_data.clone(),
            removed: false,
            created_at: Utc::now(),
        });
        Ok(InsertOutcome::Inserted(id))
    }

    async fn apply_donation_received(
        &mut self,
        campaign: Address,
        donor: Address,
        amount: u128,
        new_total_raised: u128,
    ) -> StoreResult<()> {
        let Some(existing_campaign) = self.working.campaigns.get(&campaign).cloned() else {
            return Ok(()); // unknown campaign: warn-and-drop is the caller's job
        };

        let key = (campaign, donor);
        let now = Utc::now();
        if !self.working.contributions.contains_key(&key) {
            self.working.next_contribution_id += 1;
            let id = self.working.next_contribution_id;
            self.working.contributions.insert(
                key,
                Contribution {
                    id,
                    campaign_address: campaign,
                    donor_address: donor,
                    contributed_wei: 0,
                    refunded_wei: 0,
                    created_at: now,
                    updated_at: now,
                },
            );
        }
        let entry = self.working.contributions.get_mut(&key).expect("just inserted");
        entry.contributed_wei += amount;
        entry.updated_at = now;

        let mut campaign_row = existing_campaign;
        campaign_row.total_raised_wei = new_total_raised;
        campaign_row.updated_at = now;
        if campaign_row.status == CampaignStatus::Active && new_total_raised >= campaign_row.goal_wei {
            campaign_row.status = CampaignStatus::Success;
        }
        self.working.campaigns.insert(campaign, campaign_row);
        Ok(())
    }

    async fn apply_withdrawn(&mut self, campaign: Address, amount: u128) -> StoreResult<()> {
        let Some(mut row) = self.working.campaigns.get(&campaign).cloned() else {
            return Ok(());
        };
        row.withdrawn = true;
        row.withdrawn_amount_wei = Some(amount);
        row.status = CampaignStatus::Withdrawn;
        row.updated_at = Utc::now();
        self.working.campaigns.insert(campaign, row);
        Ok(())
    }

    async fn apply_refunded(&mut self, campaign: Address, donor: Address, amount: u128) -> StoreResult<()> {
        let Some(entry) = self.working.contributions.get_mut(&(campaign, donor)) else {
            return Ok(());
        };
        entry.refunded_wei += amount;
        entry.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_events_removed(
        &mut self,
        chain_id: u64,
        from: u64,
        to: u64,
    ) -> StoreResult<Vec<Address>> {
        let mut affected = std::collections::BTreeSet::new();
        for event in self.working.events.iter_mut() {
            if event.chain_id == chain_id
                && event.block_number >= from
                && event.block_number <= to
                && !event.removed
            {
                event.removed = true;
                if let Some(addr) = event.address {
                    affected.insert(addr);
                }
            }
        }
        Ok(affected.into_iter().collect())
    }

    async fn reset_campaign_for_rollback(&mut self, address: Address) -> StoreResult<()> {
        if let Some(campaign) = self.working.campaigns.get_mut(&address) {
            campaign.reset_for_rollback(Utc::now());
        }
        Ok(())
    }

    async fn reset_contributions_for_campaign(&mut self, campaign: Address) -> StoreResult<()> {
        let now = Utc::now();
        for entry in self
            .working
            .contributions
            .values_mut()
            .filter(|c| c.campaign_address == campaign)
        {
            entry.reset_for_rollback(now);
        }
        Ok(())
    }

    async fn surviving_events_in_range(
        &mut self,
        chain_id: u64,
        from: u64,
        to: u64,
    ) -> StoreResult<Vec<Event>> {
        let mut events: Vec<Event> = self
            .working
            .events
            .iter()
            .filter(|e| {
                e.chain_id == chain_id && e.block_number >= from && e.block_number <= to && !e.removed
            })
            .cloned()
            .collect();
        events.sort_by_key(|e| (e.block_number, e.log_index));
        Ok(events)
    }

    async fn expired_underfunded_campaigns(&mut self, now: DateTime<Utc>) -> StoreResult<Vec<Address>> {
        Ok(self
            .working
            .campaigns
            .values()
            .filter(|c| {
                c.status == CampaignStatus::Active
                    && !c.withdrawn
                    && c.is_expired(now.timestamp())
                    && c.total_raised_wei < c.goal_wei
            })
            .map(|c| c.address)
            .collect())
    }

    async fn mark_campaign_failed(&mut self, address: Address) -> StoreResult<()> {
        if let Some(campaign) = self.working.campaigns.get_mut(&address) {
            campaign.status = CampaignStatus::Failed;
            campaign.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        *self.shared.lock().await = self.working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}
