//! # Indexer Domain Types
//!
//! Core entities shared across the producer, consumer, store and bus
//! crates: chains, sync cursors, campaigns, contributions, events, and
//! the decoded-argument representation used for canonical JSON encoding.
//!
//! This is the single source of truth for these shapes; every other
//! crate depends on it rather than redefining them.

pub mod address;
pub mod args;
pub mod campaign;
pub mod chain;
pub mod contribution;
pub mod envelope;
pub mod event;

pub use address::Address;
pub use args::{ArgMap, ArgValue};
pub use campaign::{Campaign, CampaignStatus};
pub use chain::{Chain, SyncState};
pub use contribution::Contribution;
pub use envelope::{
    EventEnvelope, EventEnvelopeWithMeta, Message, ReconciliationEnvelope,
    ReconciliationEnvelopeWithMeta, RollbackEnvelope, RollbackEnvelopeWithMeta,
};
pub use event::{DecodedEvent, Event, EventKind, Log};

/// A 32-byte hash, rendered as a lowercase `0x`-prefixed hex string at the
/// JSON boundary.
pub type Hash = [u8; 32];

/// A 256-bit unsigned integer too large for a native type, stored as the
/// decimal string Solidity's `uint256` requires for byte-identical replay.
///
/// The store and bus boundaries only ever see this as a string; arithmetic
/// (addition for lifetime totals, comparison against goals) is performed on
/// `u128`, which comfortably covers any realistic wei amount.
pub type Wei = u128;
