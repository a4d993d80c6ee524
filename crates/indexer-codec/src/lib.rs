//! # Event Codec
//!
//! Maps a raw chain log onto one of the four known crowdfunding events by
//! matching `topics[0]` against the keccak256 of each event's canonical
//! signature, then ABI-decodes every argument from `data`.
//!
//! None of the four events declare indexed parameters in the reference
//! ABI, so `topics[0]` is used purely as the event selector; every
//! argument is decoded from the log's `data` word stream.

mod abi;
mod topics;

pub use topics::{topic0, TOPIC0_TABLE};

use indexer_types::{ArgValue, DecodedEvent, EventKind, Log};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("log data too short: need at least {need} bytes, have {have}")]
    DataTooShort { need: usize, have: usize },
    #[error("dynamic data offset {offset} out of bounds (data length {len})")]
    OffsetOutOfBounds { offset: usize, len: usize },
    #[error("string argument is not valid UTF-8")]
    InvalidUtf8,
}

/// Attempts to decode a log as one of the four known events. Returns
/// `Ok(None)` for an unrecognized topic0 — the caller logs and drops it,
/// this layer has no opinion on how unknown events are handled.
pub fn decode_log(log: &Log) -> Result<Option<DecodedEvent>, CodecError> {
    let Some(topic0) = log.topics.first() else {
        return Ok(None);
    };
    let Some(kind) = topics::kind_for_topic0(topic0) else {
        return Ok(None);
    };

    let args = match kind {
        EventKind::CampaignCreated => decode_campaign_created(&log.data)?,
        EventKind::DonationReceived => decode_donation_received(&log.data)?,
        EventKind::Withdrawn => decode_withdrawn(&log.data)?,
        EventKind::Refunded => decode_refunded(&log.data)?,
    };

    Ok(Some(DecodedEvent { kind, args }))
}

fn decode_campaign_created(data: &[u8]) -> Result<BTreeMap<String, ArgValue>, CodecError> {
    let mut words = abi::WordReader::new(data);
    let factory = words.read_address(0)?;
    let campaign = words.read_address(1)?;
    let creator = words.read_address(2)?;
    let goal = words.read_uint256(3)?;
    let deadline = words.read_uint256(4)?;
    let cid = words.read_string(5)?;

    let mut args = BTreeMap::new();
    args.insert("factory".to_string(), ArgValue::Address(factory));
    args.insert("campaign".to_string(), ArgValue::Address(campaign));
    args.insert("creator".to_string(), ArgValue::Address(creator));
    args.insert("goal".to_string(), ArgValue::Uint(goal));
    args.insert("deadline".to_string(), ArgValue::Uint(deadline));
    args.insert("cid".to_string(), ArgValue::Str(cid));
    Ok(args)
}

fn decode_donation_received(data: &[u8]) -> Result<BTreeMap<String, ArgValue>, CodecError> {
    let words = abi::WordReader::new(data);
    let campaign = words.read_address(0)?;
    let donor = words.read_address(1)?;
    let amount = words.read_uint256(2)?;
    let new_total_raised = words.read_uint256(3)?;
    let timestamp = words.read_uint256(4)?;

    let mut args = BTreeMap::new();
    args.insert("campaign".to_string(), ArgValue::Address(campaign));
    args.insert("donor".to_string(), ArgValue::Address(donor));
    args.insert("amount".to_string(), ArgValue::Uint(amount));
    args.insert("newTotalRaised".to_string(), ArgValue::Uint(new_total_raised));
    args.insert("timestamp".to_string(), ArgValue::Uint(timestamp));
    Ok(args)
}

fn decode_withdrawn(data: &[u8]) -> Result<BTreeMap<String, ArgValue>, CodecError> {
    let words = abi::WordReader::new(data);
    let campaign = words.read_address(0)?;
    let creator = words.read_address(1)?;
    let amount = words.read_uint256(2)?;
    let timestamp = words.read_uint256(3)?;

    let mut args = BTreeMap::new();
    args.insert("campaign".to_string(), ArgValue::Address(campaign));
    args.insert("creator".to_string(), ArgValue::Address(creator));
    args.insert("amount".to_string(), ArgValue::Uint(amount));
    args.insert("timestamp".to_string(), ArgValue::Uint(timestamp));
    Ok(args)
}

fn decode_refunded(data: &[u8]) -> Result<BTreeMap<String, ArgValue>, CodecError> {
    let words = abi::WordReader::new(data);
    let campaign = words.read_address(0)?;
    let donor = words.read_address(1)?;
    let amount = words.read_uint256(2)?;
    let timestamp = words.read_uint256(3)?;

    let mut args = BTreeMap::new();
    args.insert("campaign".to_string(), ArgValue::Address(campaign));
    args.insert("donor".to_string(), ArgValue::Address(donor));
    args.insert("amount".to_string(), ArgValue::Uint(amount));
    args.insert("timestamp".to_string(), ArgValue::Uint(timestamp));
    Ok(args)
}
