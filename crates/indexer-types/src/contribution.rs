use crate::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One donor's lifetime relationship with one campaign. `contributed_wei`
/// is gross lifetime contribution, never decremented outside a rollback
/// reset; `refunded_wei` is lifetime refunds. The invariant
/// `contributed_wei >= refunded_wei` must hold after every mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub id: i64,
    pub campaign_address: Address,
    pub donor_address: Address,
    pub contributed_wei: u128,
    pub refunded_wei: u128,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contribution {
    pub fn net_wei(&self) -> u128 {
        self.contributed_wei.saturating_sub(self.refunded_wei)
    }

    pub fn reset_for_rollback(&mut self, now: DateTime<Utc>) {
        self.contributed_wei = 0;
        self.refunded_wei = 0;
        self.updated_at = now;
    }
}
