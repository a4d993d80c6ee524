use crate::args::ArgMap;
use crate::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The four event kinds the codec knows how to decode. Anything else is an
/// `Unknown` topic, dropped at the codec boundary rather than represented
/// here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    CampaignCreated,
    DonationReceived,
    Withdrawn,
    Refunded,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::CampaignCreated => "CampaignCreated",
            EventKind::DonationReceived => "DonationReceived",
            EventKind::Withdrawn => "Withdrawn",
            EventKind::Refunded => "Refunded",
        }
    }

    /// The canonical ABI signature whose keccak256 is this event's topic0.
    pub fn signature(self) -> &'static str {
        match self {
            EventKind::CampaignCreated => {
                "CampaignCreated(address,address,address,uint256,uint256,string)"
            }
            EventKind::DonationReceived => {
                "DonationReceived(address,address,uint256,uint256,uint256)"
            }
            EventKind::Withdrawn => "Withdrawn(address,address,uint256,uint256)",
            EventKind::Refunded => "Refunded(address,address,uint256,uint256)",
        }
    }

    pub fn routing_key(self) -> &'static str {
        match self {
            EventKind::CampaignCreated => "event.campaign_created",
            EventKind::DonationReceived => "event.donation_received",
            EventKind::Withdrawn => "event.withdrawn",
            EventKind::Refunded => "event.refunded",
        }
    }

    /// Inverse of [`EventKind::as_str`]; `None` for anything not one of the
    /// four known names (e.g. a stale message from a future schema version).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "CampaignCreated" => Some(EventKind::CampaignCreated),
            "DonationReceived" => Some(EventKind::DonationReceived),
            "Withdrawn" => Some(EventKind::Withdrawn),
            "Refunded" => Some(EventKind::Refunded),
            _ => None,
        }
    }
}

/// A raw, topic-filtered log fetched from the chain client, prior to ABI
/// decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<[u8; 32]>,
    pub data: Vec<u8>,
    pub block_number: u64,
    pub block_hash: [u8; 32],
    pub tx_hash: [u8; 32],
    pub log_index: u64,
}

/// The in-process representation of a decoded log: a tag plus its argument
/// map. The tag drives dispatch in the state updater and rollback replay;
/// only at the store/bus boundary is this flattened to JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedEvent {
    pub kind: EventKind,
    pub args: ArgMap,
}

/// The append-only row recorded for every decoded log, regardless of
/// whether its effect has been applied yet. The canonical source for
/// rollback replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub chain_id: u64,
    pub tx_hash: String,
    pub log_index: u64,
    pub block_number: u64,
    pub block_hash: String,
    pub address: Option<Address>,
    pub event_name: String,
    pub event_data: ArgMap,
    pub removed: bool,
    pub created_at: DateTime<Utc>,
}
