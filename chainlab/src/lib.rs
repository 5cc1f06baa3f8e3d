// chainlab - proof-of-work blockchain simulation core
// Cancellable nonce search, hash-linked chain model, structural validation,
// and multi-node consensus resolution over in-memory simulated ledgers.

pub mod chain;
pub mod consensus;
pub mod hash;
pub mod mining;
pub mod types;
pub mod validation;

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export commonly used types
pub use crate::chain::{Chain, ChainError, LedgerEntry, DEFAULT_DIFFICULTY, GENESIS_HASH};
pub use crate::consensus::{
    resolve_conflict, sync_to_longest_chain, sync_to_majority, ConflictReport,
};
pub use crate::hash::{double_sha256_hex, sha256_hex};
pub use crate::mining::{
    auto_mine, AutoMineReport, AutoMineStatus, CancelSignal, MiningConfig, MiningEngine,
    MiningError, MiningOutcome, MiningProgress, MiningRegistry, SearchResult, SessionKey,
};
pub use crate::types::{Block, BlockData, Node};
pub use crate::validation::{
    is_block_hash_valid, is_difficulty_sufficient, validate_all_nodes, validate_node_chain,
};
