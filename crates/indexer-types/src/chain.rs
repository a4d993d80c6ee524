use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A configured chain the indexer tracks. Created once, never deleted;
/// `chain_id` partitions every other table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    pub id: i64,
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The producer's durable bookmark for a chain: the last block whose logs
/// have been published, and the hash observed for it at that time.
///
/// `last_block_hash` is `None` only before the first block has ever been
/// observed. `last_block` only decreases when a reorg rewind occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    pub chain_id: u64,
    pub last_block: u64,
    pub last_block_hash: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl SyncState {
    pub fn genesis(chain_id: u64) -> Self {
        Self {
            chain_id,
            last_block: 0,
            last_block_hash: None,
            updated_at: Utc::now(),
        }
    }
}
