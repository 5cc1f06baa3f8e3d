use serde::{Deserialize, Serialize};

use super::block::BlockData;

/// An independent in-memory copy of a chain, used to model one ledger-holder
/// in a consensus demonstration. Nodes share no mutable state; a node owns
/// its block records exclusively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: u64,
    pub name: String,
    pub blocks: Vec<BlockData>,
}

impl Node {
    pub fn new(id: u64, name: impl Into<String>, blocks: Vec<BlockData>) -> Self {
        Self {
            id,
            name: name.into(),
            blocks,
        }
    }
}
