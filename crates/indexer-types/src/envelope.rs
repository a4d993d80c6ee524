use crate::args::ArgMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An event message published to one of the four `event.*` routing keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_type: String,
    pub chain_id: u64,
    pub block_number: u64,
    pub block_hash: String,
    pub tx_hash: String,
    pub log_index: u64,
    pub address: String,
    pub timestamp: i64,
    pub event_data: ArgMap,
}

/// A rollback instruction published to `control.rollback`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollbackEnvelope {
    pub chain_id: u64,
    pub from_block: u64,
    pub to_block: u64,
    pub reason: String,
}

/// A reconciliation trigger published to `control.reconciliation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationEnvelope {
    pub chain_id: u64,
    pub reconciliation_type: String,
}

/// The outer envelope every message carries: a `message_type` tag plus the
/// type-specific payload, flattened so the JSON on the wire matches the
/// external-interfaces shape exactly (`{"message_type": "event", ...}`
/// rather than a nested `{"message_type": "event", "payload": {...}}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "message_type", rename_all = "snake_case")]
pub enum Message {
    Event(EventEnvelopeWithMeta),
    Rollback(RollbackEnvelopeWithMeta),
    Reconciliation(ReconciliationEnvelopeWithMeta),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelopeWithMeta {
    pub published_at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: EventEnvelope,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollbackEnvelopeWithMeta {
    pub published_at: DateTime<Utc>,
    #[serde(flatten)]
    pub rollback: RollbackEnvelope,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationEnvelopeWithMeta {
    pub published_at: DateTime<Utc>,
    #[serde(flatten)]
    pub reconciliation: ReconciliationEnvelope,
}
