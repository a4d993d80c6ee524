//! Literal addresses and envelope builders shared by every scenario, all
//! drawn from the same campaign used throughout the testable-properties
//! examples: a factory-deployed campaign with a 10 ETH goal.

use chrono::Utc;
use indexer_types::{
    Address, ArgValue, EventEnvelope, EventEnvelopeWithMeta, Message, ReconciliationEnvelope,
    ReconciliationEnvelopeWithMeta, RollbackEnvelope, RollbackEnvelopeWithMeta,
};
use std::collections::BTreeMap;

pub const CHAIN_ID: u64 = 31337;
pub const FACTORY: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";
pub const CAMPAIGN: &str = "0xe7f1725e7734ce288f8367e1bb143e90bb3f0512";
pub const CREATOR: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";
pub const DONOR: &str = "0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc";
pub const GOAL_WEI: u128 = 10_000_000_000_000_000_000;
pub const DEADLINE_TS: i64 = 1_735_689_600;

pub fn addr(s: &str) -> Address {
    Address::parse(s).expect("literal test address is well-formed")
}

fn wrapped(event_type: &str, block_number: u64, tx_hash: &str, log_index: u64, address: &str, args: BTreeMap<String, ArgValue>) -> Message {
    Message::Event(EventEnvelopeWithMeta {
        published_at: Utc::now(),
        event: EventEnvelope {
            event_type: event_type.to_string(),
            chain_id: CHAIN_ID,
            block_number,
            block_hash: format!("0xblock{block_number}"),
            tx_hash: tx_hash.to_string(),
            log_index,
            address: address.to_string(),
            timestamp: 1_700_000_000 + block_number as i64,
            event_data: args,
        },
    })
}

pub fn campaign_created(block_number: u64, tx_hash: &str) -> Message {
    let mut args = BTreeMap::new();
    args.insert("factory".to_string(), ArgValue::Address(FACTORY.to_string()));
    args.insert("campaign".to_string(), ArgValue::Address(CAMPAIGN.to_string()));
    args.insert("creator".to_string(), ArgValue::Address(CREATOR.to_string()));
    args.insert("goal".to_string(), ArgValue::Uint(GOAL_WEI.to_string()));
    args.insert("deadline".to_string(), ArgValue::Uint(DEADLINE_TS.to_string()));
    args.insert("cid".to_string(), ArgValue::Str("QmT".to_string()));
    wrapped("CampaignCreated", block_number, tx_hash, 0, FACTORY, args)
}

pub fn donation_received(block_number: u64, tx_hash: &str, log_index: u64, amount_wei: u128, new_total_raised_wei: u128) -> Message {
    let mut args = BTreeMap::new();
    args.insert("campaign".to_string(), ArgValue::Address(CAMPAIGN.to_string()));
    args.insert("donor".to_string(), ArgValue::Address(DONOR.to_string()));
    args.insert("amount".to_string(), ArgValue::Uint(amount_wei.to_string()));
    args.insert("newTotalRaised".to_string(), ArgValue::Uint(new_total_raised_wei.to_string()));
    wrapped("DonationReceived", block_number, tx_hash, log_index, CAMPAIGN, args)
}

pub fn withdrawn(block_number: u64, tx_hash: &str, amount_wei: u128) -> Message {
    let mut args = BTreeMap::new();
    args.insert("campaign".to_string(), ArgValue::Address(CAMPAIGN.to_string()));
    args.insert("amount".to_string(), ArgValue::Uint(amount_wei.to_string()));
    wrapped("Withdrawn", block_number, tx_hash, 0, CAMPAIGN, args)
}

pub fn refunded(block_number: u64, tx_hash: &str, amount_wei: u128) -> Message {
    let mut args = BTreeMap::new();
    args.insert("campaign".to_string(), ArgValue::Address(CAMPAIGN.to_string()));
    args.insert("donor".to_string(), ArgValue::Address(DONOR.to_string()));
    args.insert("amount".to_string(), ArgValue::Uint(amount_wei.to_string()));
    wrapped("Refunded", block_number, tx_hash, 0, CAMPAIGN, args)
}

pub fn rollback(from_block: u64, to_block: u64) -> Message {
    Message::Rollback(RollbackEnvelopeWithMeta {
        published_at: Utc::now(),
        rollback: RollbackEnvelope {
            chain_id: CHAIN_ID,
            from_block,
            to_block,
            reason: "reorg detected".to_string(),
        },
    })
}

pub fn reconciliation(reconciliation_type: &str) -> Message {
    Message::Reconciliation(ReconciliationEnvelopeWithMeta {
        published_at: Utc::now(),
        reconciliation: ReconciliationEnvelope {
            chain_id: CHAIN_ID,
            reconciliation_type: reconciliation_type.to_string(),
        },
    })
}
