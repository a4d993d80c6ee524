use crate::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A campaign's lifecycle status. Valid transitions form a DAG:
/// `ACTIVE -> SUCCESS -> WITHDRAWN`, `ACTIVE -> FAILED`. Once `WITHDRAWN`,
/// only a rollback that removes the withdrawal event can move it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CampaignStatus {
    Active,
    Success,
    Failed,
    Withdrawn,
}

impl CampaignStatus {
    /// Whether `self -> next` is a transition the state updater is allowed
    /// to perform outside of a rollback reset.
    pub fn can_transition_to(self, next: CampaignStatus) -> bool {
        use CampaignStatus::*;
        matches!(
            (self, next),
            (Active, Success) | (Active, Failed) | (Success, Withdrawn) | (Active, Withdrawn)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub address: Address,
    pub factory_address: Address,
    pub creator_address: Address,
    pub goal_wei: u128,
    pub deadline_ts: i64,
    pub cid: Option<String>,
    pub status: CampaignStatus,
    pub total_raised_wei: u128,
    pub withdrawn: bool,
    pub withdrawn_amount_wei: Option<u128>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// A freshly observed `CampaignCreated` campaign, before any donation.
    pub fn new(
        address: Address,
        factory_address: Address,
        creator_address: Address,
        goal_wei: u128,
        deadline_ts: i64,
        cid: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            address,
            factory_address,
            creator_address,
            goal_wei,
            deadline_ts,
            cid,
            status: CampaignStatus::Active,
            total_raised_wei: 0,
            withdrawn: false,
            withdrawn_amount_wei: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Resets donation/withdrawal state as part of a rollback, preserving
    /// identity fields. `WITHDRAWN` survives unless replay overwrites it,
    /// matching the rollback handler's contract.
    pub fn reset_for_rollback(&mut self, now: DateTime<Utc>) {
        self.total_raised_wei = 0;
        self.withdrawn = false;
        self.withdrawn_amount_wei = None;
        if self.status != CampaignStatus::Withdrawn {
            self.status = CampaignStatus::Active;
        }
        self.updated_at = now;
    }

    pub fn is_expired(&self, now_ts: i64) -> bool {
        self.deadline_ts < now_ts
    }
}
