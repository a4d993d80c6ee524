use indexer_types::EventKind;
use sha3::{Digest, Keccak256};
use std::sync::OnceLock;

const ALL_KINDS: [EventKind; 4] = [
    EventKind::CampaignCreated,
    EventKind::DonationReceived,
    EventKind::Withdrawn,
    EventKind::Refunded,
];

/// The keccak256 of an event's canonical signature — its `topics[0]`.
pub fn topic0(kind: EventKind) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(kind.signature().as_bytes());
    hasher.finalize().into()
}

/// `topics[0] -> EventKind` lookup table, computed once and reused for
/// every decode. Pure derived data, not mutable state.
pub static TOPIC0_TABLE: OnceLock<[([u8; 32], EventKind); 4]> = OnceLock::new();

fn table() -> &'static [([u8; 32], EventKind); 4] {
    TOPIC0_TABLE.get_or_init(|| {
        let mut table = [([0u8; 32], EventKind::CampaignCreated); 4];
        for (slot, kind) in table.iter_mut().zip(ALL_KINDS) {
            *slot = (topic0(kind), kind);
        }
        table
    })
}

pub fn kind_for_topic0(topic: &[u8; 32]) -> Option<EventKind> {
    table()
        .iter()
        .find(|(t, _)| t == topic)
        .map(|(_, kind)| *kind)
}
