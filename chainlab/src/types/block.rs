use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::hash::double_sha256_hex;

/// One ledger entry in an interactive chain.
///
/// A block is created with `nonce = 0` and an empty hash; the nonce and hash
/// mutate only while a mining search runs. The hash input is the
/// order-sensitive concatenation `index ++ previous_hash ++ timestamp ++
/// data ++ nonce` with no delimiters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    /// Creation instant, unix seconds.
    pub timestamp: i64,
    pub data: String,
    /// Hex hash of the predecessor; empty for the genesis block.
    pub previous_hash: String,
    pub nonce: u64,
    /// Cached hash; empty until computed.
    pub hash: String,
}

impl Block {
    pub fn new(
        index: u64,
        timestamp: i64,
        data: impl Into<String>,
        previous_hash: impl Into<String>,
    ) -> Self {
        Self {
            index,
            timestamp,
            data: data.into(),
            previous_hash: previous_hash.into(),
            nonce: 0,
            hash: String::new(),
        }
    }

    /// Like [`Block::new`] with the timestamp taken from the wall clock.
    pub fn now(index: u64, data: impl Into<String>, previous_hash: impl Into<String>) -> Self {
        Self::new(index, Utc::now().timestamp(), data, previous_hash)
    }

    /// Full hash input composition for a candidate nonce.
    pub fn hash_input(&self, nonce: u64) -> String {
        format!(
            "{}{}{}{}{}",
            self.index, self.previous_hash, self.timestamp, self.data, nonce
        )
    }

    /// Recompute the hash from the block's current fields.
    pub fn calculate_hash(&self) -> String {
        double_sha256_hex(&self.hash_input(self.nonce))
    }
}

/// Reduced block projection carried by simulated nodes.
///
/// There is no stored index, timestamp, or predecessor link; linkage is
/// derived positionally from the owning node's block sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockData {
    pub data: String,
    pub nonce: u64,
    pub hash: String,
}

impl BlockData {
    pub fn new(data: impl Into<String>, nonce: u64, hash: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            nonce,
            hash: hash.into(),
        }
    }

    /// Lightweight composition: `previous_hash ++ data ++ nonce`, with the
    /// predecessor omitted entirely when absent or empty.
    pub fn compose(previous_hash: Option<&str>, data: &str, nonce: u64) -> String {
        match previous_hash {
            Some(prev) if !prev.is_empty() => format!("{prev}{data}{nonce}"),
            _ => format!("{data}{nonce}"),
        }
    }

    pub fn hash_input(&self, previous_hash: Option<&str>) -> String {
        Self::compose(previous_hash, &self.data, self.nonce)
    }

    /// Recompute the hash this record should carry given its positional
    /// predecessor.
    pub fn calculate_hash(&self, previous_hash: Option<&str>) -> String {
        double_sha256_hex(&self.hash_input(previous_hash))
    }
}

impl From<&Block> for BlockData {
    fn from(block: &Block) -> Self {
        Self {
            data: block.data.clone(),
            nonce: block.nonce,
            hash: block.hash.clone(),
        }
    }
}
