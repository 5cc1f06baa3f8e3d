//! Hash-linked chain anchored by a fixed genesis block.
//!
//! The chain owns its blocks exclusively. Blocks are appended unmined and
//! acquire their proof of work in place (see [`crate::mining`]); editing a
//! block's payload afterwards re-derives its hash without re-mining, which
//! leaves the block invalid until the next successful search.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Block;
use crate::validation::is_difficulty_sufficient;

/// Canonical placeholder hash carried by the unmined genesis block.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Payload of the genesis block.
pub const GENESIS_DATA: &str = "Genesis Block";

/// Comfortable interactive difficulty; the engine accepts any value.
pub const DEFAULT_DIFFICULTY: usize = 2;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("block index out of range: {0}")]
    BlockNotFound(u64),

    #[error("the genesis block cannot be edited")]
    GenesisImmutable,
}

/// Per-block projection returned by [`Chain::ledger`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub data: String,
    pub timestamp: i64,
    pub hash: String,
    pub nonce: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chain {
    blocks: Vec<Block>,
    difficulty: usize,
}

impl Chain {
    /// Creates a chain holding only the genesis block. Genesis carries the
    /// canonical placeholder hash and no proof-of-work requirement.
    pub fn new(difficulty: usize) -> Self {
        let mut genesis = Block::now(0, GENESIS_DATA, "");
        genesis.hash = GENESIS_HASH.to_string();
        Self {
            blocks: vec![genesis],
            difficulty,
        }
    }

    pub fn with_default_difficulty() -> Self {
        Self::new(DEFAULT_DIFFICULTY)
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    pub fn set_difficulty(&mut self, difficulty: usize) {
        self.difficulty = difficulty;
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn latest_block(&self) -> &Block {
        // The constructor guarantees at least the genesis block.
        self.blocks.last().expect("chain holds a genesis block")
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub(crate) fn block_mut(&mut self, index: usize) -> Option<&mut Block> {
        self.blocks.get_mut(index)
    }

    /// Appends a new unmined block carrying `data`, linked to the latest
    /// block's current hash. Returns the new block's index.
    pub fn push_data(&mut self, data: impl Into<String>) -> usize {
        let index = self.blocks.len();
        let previous_hash = self.latest_block().hash.clone();
        self.blocks
            .push(Block::now(index as u64, data, previous_hash));
        index
    }

    /// Replaces a block's payload and re-derives its hash from the current
    /// nonce, without re-mining. The block (and every successor) fails
    /// validation until it is mined again.
    pub fn update_block_data(
        &mut self,
        index: usize,
        data: impl Into<String>,
    ) -> Result<(), ChainError> {
        if index == 0 {
            return Err(ChainError::GenesisImmutable);
        }
        let block = self
            .blocks
            .get_mut(index)
            .ok_or(ChainError::BlockNotFound(index as u64))?;
        block.data = data.into();
        block.hash = block.calculate_hash();
        Ok(())
    }

    /// Points a block at its predecessor's current hash. Used before mining
    /// a block whose predecessor was (re)mined after this block was created.
    pub(crate) fn relink_block(&mut self, index: usize) {
        if index == 0 || index >= self.blocks.len() {
            return;
        }
        let previous_hash = self.blocks[index - 1].hash.clone();
        self.blocks[index].previous_hash = previous_hash;
    }

    /// Whether one block holds up on its own: its stored hash matches the
    /// recomputed digest, it links to its predecessor's hash, and it meets
    /// the chain difficulty. Genesis is valid by definition.
    pub fn is_block_valid(&self, index: usize) -> bool {
        if index == 0 {
            return !self.blocks.is_empty();
        }
        let Some(block) = self.blocks.get(index) else {
            return false;
        };
        block.hash == block.calculate_hash()
            && block.previous_hash == self.blocks[index - 1].hash
            && is_difficulty_sufficient(&block.hash, self.difficulty)
    }

    /// Full structural validation: every non-genesis block must pass
    /// [`Chain::is_block_valid`].
    pub fn is_chain_valid(&self) -> bool {
        (1..self.blocks.len()).all(|index| self.is_block_valid(index))
    }

    /// Ordered ledger projection of every mined payload block (genesis is
    /// excluded).
    pub fn ledger(&self) -> Vec<LedgerEntry> {
        self.blocks
            .iter()
            .skip(1)
            .map(|block| LedgerEntry {
                data: block.data.clone(),
                timestamp: block.timestamp,
                hash: block.hash.clone(),
                nonce: block.nonce,
            })
            .collect()
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::with_default_difficulty()
    }
}
