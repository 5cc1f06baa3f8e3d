//! Pure structural validation: hash correctness and difficulty compliance.
//!
//! Nothing here mutates state or suspends; a `false` return is ordinary
//! data, not an error. The whole-chain check short-circuits on the first
//! failing block and reports no partial validity; the lenient prefix-count
//! variant lives in [`crate::consensus::resolve_conflict`].

use crate::types::{BlockData, Node};

/// True when `hash` starts with `difficulty` ASCII zero characters.
/// `difficulty = 0` is trivially satisfied by any hash.
pub fn is_difficulty_sufficient(hash: &str, difficulty: usize) -> bool {
    hash.bytes().take_while(|&b| b == b'0').count() >= difficulty
}

/// Recomputes the digest over the lightweight composition and compares it to
/// the stored hash. Pure: identical inputs always yield the same verdict.
pub fn is_block_hash_valid(block: &BlockData, previous_hash: Option<&str>) -> bool {
    block.calculate_hash(previous_hash) == block.hash
}

/// Validates one node's whole chain: every block must hash correctly against
/// its positional predecessor and meet the difficulty target. A single
/// failure fails the chain.
pub fn validate_node_chain(node: &Node, difficulty: usize) -> bool {
    for (i, block) in node.blocks.iter().enumerate() {
        let previous_hash = if i > 0 {
            Some(node.blocks[i - 1].hash.as_str())
        } else {
            None
        };
        if !is_block_hash_valid(block, previous_hash) {
            return false;
        }
        if !is_difficulty_sufficient(&block.hash, difficulty) {
            return false;
        }
    }
    true
}

/// One independent verdict per node, order-preserving.
pub fn validate_all_nodes(nodes: &[Node], difficulty: usize) -> Vec<bool> {
    nodes
        .iter()
        .map(|node| validate_node_chain(node, difficulty))
        .collect()
}
