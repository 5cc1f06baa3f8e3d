/// Mining: the cancellable nonce search engine, the per-key operation
/// registry, and the cross-block auto-mine orchestrator.
pub mod auto;
pub mod engine;
pub mod registry;

pub use auto::{auto_mine, AutoMineReport, AutoMineStatus};
pub use engine::{MiningEngine, MiningOutcome, MiningProgress, SearchResult};
pub use registry::{CancelSignal, MiningRegistry, SessionKey};

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mining error types. Cancellation is not among them: an aborted search is
/// a normal terminal outcome, reported through [`MiningOutcome`].
#[derive(Debug, Error)]
pub enum MiningError {
    #[error("nonce space exhausted before a matching hash was found")]
    NonceOverflow,
}

/// Mining configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningConfig {
    /// Attempts between progress notifications; also the stride at which a
    /// search yields to the scheduler and re-checks its cancel signal.
    pub progress_stride: u64,

    /// Pause after each mined block in an auto-mine sequence.
    pub settle_delay: Duration,

    /// Interval between predecessor-validity polls in an auto-mine sequence.
    pub poll_interval: Duration,

    /// Bounded number of predecessor polls before the sequence aborts.
    pub max_poll_attempts: u32,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            progress_stride: 1000,
            settle_delay: Duration::from_millis(500),
            poll_interval: Duration::from_millis(100),
            max_poll_attempts: 100,
        }
    }
}
