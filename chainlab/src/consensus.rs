//! Conflict resolution across simulated ledger nodes.
//!
//! Three independently selectable rules, each a pure function of a node-set
//! snapshot and a difficulty; they share no mutable intermediate state.
//! The sync rules replace every node's block sequence atomically with a deep
//! copy of the winning state, or return the input untouched when no node
//! holds a fully valid chain.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::types::Node;
use crate::validation::{is_difficulty_sufficient, validate_node_chain};

/// Read-only conflict resolution result: the index of the node holding the
/// longest leading run of difficulty-compliant blocks, and that run's length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    pub winner_index: usize,
    pub valid_length: usize,
}

/// Syncs all nodes to the most-replicated fully valid chain state.
///
/// Valid chains are grouped by exact serialized equality of their block
/// sequence; the largest group wins, ties going to the group encountered
/// first. With no valid chain at all, the node set is returned unchanged.
pub fn sync_to_majority(mut nodes: Vec<Node>, difficulty: usize) -> Vec<Node> {
    // (serialized state, index of the first node holding it, member count)
    let mut groups: Vec<(String, usize, usize)> = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        if !validate_node_chain(node, difficulty) {
            continue;
        }
        let Ok(state_key) = serde_json::to_string(&node.blocks) else {
            continue;
        };
        if let Some(group) = groups.iter_mut().find(|(key, _, _)| *key == state_key) {
            group.2 += 1;
        } else {
            groups.push((state_key, i, 1));
        }
    }

    let mut winner: Option<usize> = None;
    let mut best_count = 0usize;
    for &(_, first_index, count) in &groups {
        if count > best_count {
            best_count = count;
            winner = Some(first_index);
        }
    }

    let Some(winner_index) = winner else {
        debug!("no valid chain among nodes, leaving node set unchanged");
        return nodes;
    };

    info!(
        winner = %nodes[winner_index].name,
        replicas = best_count,
        "syncing all nodes to majority state"
    );
    let canonical = nodes[winner_index].blocks.clone();
    for node in &mut nodes {
        node.blocks = canonical.clone();
    }
    nodes
}

/// Syncs all nodes to the single longest fully valid chain, ties going to
/// the node encountered first. With no valid chain, the node set is
/// returned unchanged.
pub fn sync_to_longest_chain(mut nodes: Vec<Node>, difficulty: usize) -> Vec<Node> {
    let mut winner: Option<usize> = None;
    let mut best_len = 0usize;
    for (i, node) in nodes.iter().enumerate() {
        if !validate_node_chain(node, difficulty) {
            continue;
        }
        if node.blocks.len() > best_len {
            best_len = node.blocks.len();
            winner = Some(i);
        }
    }

    let Some(winner_index) = winner else {
        debug!("no valid chain among nodes, leaving node set unchanged");
        return nodes;
    };

    info!(
        winner = %nodes[winner_index].name,
        length = best_len,
        "syncing all nodes to longest valid chain"
    );
    let canonical = nodes[winner_index].blocks.clone();
    for node in &mut nodes {
        node.blocks = canonical.clone();
    }
    nodes
}

/// Reports which node holds the longest leading run of blocks meeting the
/// difficulty prefix. Deliberately weaker than full validation: hashes are
/// not recomputed, only their prefix is inspected. Ties go to the node
/// encountered first.
pub fn resolve_conflict(nodes: &[Node], difficulty: usize) -> ConflictReport {
    let mut winner_index = 0;
    let mut valid_length = 0;
    for (i, node) in nodes.iter().enumerate() {
        let run = node
            .blocks
            .iter()
            .take_while(|block| is_difficulty_sufficient(&block.hash, difficulty))
            .count();
        if run > valid_length {
            valid_length = run;
            winner_index = i;
        }
    }
    ConflictReport {
        winner_index,
        valid_length,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::double_sha256_hex;
    use crate::types::BlockData;

    fn mined_blocks(payloads: &[&str], difficulty: usize) -> Vec<BlockData> {
        let mut blocks: Vec<BlockData> = Vec::new();
        for data in payloads {
            let previous_hash = blocks.last().map(|b| b.hash.clone());
            let mut nonce = 0u64;
            loop {
                let hash =
                    double_sha256_hex(&BlockData::compose(previous_hash.as_deref(), data, nonce));
                if is_difficulty_sufficient(&hash, difficulty) {
                    blocks.push(BlockData::new(*data, nonce, hash));
                    break;
                }
                nonce += 1;
            }
        }
        blocks
    }

    fn corrupted(mut blocks: Vec<BlockData>) -> Vec<BlockData> {
        if let Some(block) = blocks.first_mut() {
            block.data.push_str(" (tampered)");
        }
        blocks
    }

    #[test]
    fn test_majority_wins_over_smaller_valid_group() {
        let shared = mined_blocks(&["a", "b", "c"], 1);
        let lone = mined_blocks(&["x", "y"], 1);
        let nodes = vec![
            Node::new(1, "Node 1", shared.clone()),
            Node::new(2, "Node 2", shared.clone()),
            Node::new(3, "Node 3", lone),
        ];

        let synced = sync_to_majority(nodes, 1);
        for node in &synced {
            assert_eq!(node.blocks, shared);
        }
        // Identity survives; only block sequences are replaced.
        assert_eq!(synced[2].id, 3);
        assert_eq!(synced[2].name, "Node 3");
    }

    #[test]
    fn test_majority_overwrites_invalid_nodes_too() {
        let shared = mined_blocks(&["a"], 1);
        let nodes = vec![
            Node::new(1, "Node 1", shared.clone()),
            Node::new(2, "Node 2", shared.clone()),
            Node::new(3, "Node 3", corrupted(shared.clone())),
        ];

        let synced = sync_to_majority(nodes, 1);
        assert_eq!(synced[2].blocks, shared);
    }

    #[test]
    fn test_majority_tie_goes_to_first_group() {
        let first = mined_blocks(&["a"], 1);
        let second = mined_blocks(&["z"], 1);
        let nodes = vec![
            Node::new(1, "Node 1", first.clone()),
            Node::new(2, "Node 2", second),
        ];

        let synced = sync_to_majority(nodes, 1);
        assert_eq!(synced[1].blocks, first);
    }

    #[test]
    fn test_majority_with_no_valid_chain_leaves_input_unchanged() {
        let nodes = vec![
            Node::new(1, "Node 1", corrupted(mined_blocks(&["a"], 1))),
            Node::new(2, "Node 2", corrupted(mined_blocks(&["b"], 1))),
        ];
        let before = nodes.clone();
        let pointer = nodes[0].blocks.as_ptr();

        let after = sync_to_majority(nodes, 1);
        assert_eq!(after, before);
        // No replacement happened, not even a value-equal clone.
        assert_eq!(after[0].blocks.as_ptr(), pointer);
    }

    #[test]
    fn test_longest_valid_chain_wins() {
        let long = mined_blocks(&["a", "b", "c", "d", "e"], 1);
        let nodes = vec![
            Node::new(1, "Node 1", mined_blocks(&["a", "b"], 1)),
            Node::new(2, "Node 2", long.clone()),
            Node::new(3, "Node 3", corrupted(mined_blocks(&["a", "b", "c", "d", "e", "f"], 1))),
        ];

        let synced = sync_to_longest_chain(nodes, 1);
        for node in &synced {
            assert_eq!(node.blocks, long);
        }
    }

    #[test]
    fn test_longest_tie_goes_to_first_node() {
        let first = mined_blocks(&["a", "b"], 1);
        let second = mined_blocks(&["x", "y"], 1);
        let nodes = vec![
            Node::new(1, "Node 1", first.clone()),
            Node::new(2, "Node 2", second),
        ];

        let synced = sync_to_longest_chain(nodes, 1);
        assert_eq!(synced[1].blocks, first);
    }

    #[test]
    fn test_longest_with_no_valid_chain_leaves_input_unchanged() {
        let nodes = vec![Node::new(1, "Node 1", corrupted(mined_blocks(&["a"], 1)))];
        let before = nodes.clone();
        let after = sync_to_longest_chain(nodes, 1);
        assert_eq!(after, before);
    }

    #[test]
    fn test_conflict_report_counts_prefix_only() {
        // Fabricated hashes: the report never recomputes them, it only
        // checks the difficulty prefix.
        let nodes = vec![
            Node::new(
                1,
                "Node 1",
                vec![
                    BlockData::new("a", 0, "00aa"),
                    BlockData::new("b", 0, "ff00"),
                    BlockData::new("c", 0, "00bb"),
                ],
            ),
            Node::new(
                2,
                "Node 2",
                vec![
                    BlockData::new("a", 0, "00cc"),
                    BlockData::new("b", 0, "00dd"),
                ],
            ),
        ];

        let report = resolve_conflict(&nodes, 2);
        assert_eq!(report.winner_index, 1);
        assert_eq!(report.valid_length, 2);
    }

    #[test]
    fn test_conflict_report_tie_goes_to_first_node() {
        let blocks = vec![BlockData::new("a", 0, "0aa")];
        let nodes = vec![
            Node::new(1, "Node 1", blocks.clone()),
            Node::new(2, "Node 2", blocks),
        ];

        let report = resolve_conflict(&nodes, 1);
        assert_eq!(report.winner_index, 0);
        assert_eq!(report.valid_length, 1);
    }

    #[test]
    fn test_conflict_report_difficulty_zero() {
        let nodes = vec![Node::new(
            1,
            "Node 1",
            vec![BlockData::new("a", 0, "ffff"), BlockData::new("b", 0, "")],
        )];
        let report = resolve_conflict(&nodes, 0);
        assert_eq!(report.valid_length, 2);
    }
}
