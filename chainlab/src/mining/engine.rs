//! Cancellable proof-of-work nonce search.
//!
//! A search walks the nonce space from the record's current nonce, computing
//! the double digest of the composition at each step and testing its leading
//! characters against the difficulty target. Once per stride it reports
//! progress, re-checks its cancel signal, and yields to the scheduler so
//! concurrent sessions are not starved. No lock is held across a search.

use std::time::{Duration, Instant};

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::hash::double_sha256_hex;
use crate::types::{Block, BlockData};
use crate::validation::is_difficulty_sufficient;

use super::registry::CancelSignal;
use super::{MiningConfig, MiningError};

/// Periodic snapshot of an in-flight search.
#[derive(Debug, Clone)]
pub struct MiningProgress {
    pub attempts: u64,
    pub nonce: u64,
    pub hash: String,
    pub elapsed: Duration,
}

/// Terminal state of a search. Cancellation is a normal outcome, not an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiningOutcome {
    Mined,
    Cancelled,
}

/// Final values of a search: the matching nonce and hash on success, the
/// last attempted pair when cancelled.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub outcome: MiningOutcome,
    pub nonce: u64,
    pub hash: String,
    pub attempts: u64,
    pub elapsed: Duration,
}

impl SearchResult {
    /// Packages a standalone search into the lightweight record form.
    pub fn into_record(self, data: impl Into<String>) -> BlockData {
        BlockData::new(data, self.nonce, self.hash)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MiningEngine {
    config: MiningConfig,
}

impl MiningEngine {
    pub fn new(config: MiningConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MiningConfig {
        &self.config
    }

    /// Mines a full chain block in place, starting from its current nonce.
    /// The nonce and hash are written back together on termination: the
    /// matching pair on success, the last attempted pair when cancelled.
    pub async fn mine_block(
        &self,
        block: &mut Block,
        difficulty: usize,
        cancel: &CancelSignal,
        progress: Option<&UnboundedSender<MiningProgress>>,
    ) -> Result<MiningOutcome, MiningError> {
        let result = self
            .search(block.nonce, difficulty, cancel, progress, |nonce| {
                double_sha256_hex(&block.hash_input(nonce))
            })
            .await?;
        block.nonce = result.nonce;
        block.hash = result.hash;
        Ok(result.outcome)
    }

    /// Standalone search over the lightweight composition
    /// (`previous_hash ++ data ++ nonce`), starting at nonce 0.
    pub async fn mine_record(
        &self,
        data: &str,
        previous_hash: Option<&str>,
        difficulty: usize,
        cancel: &CancelSignal,
        progress: Option<&UnboundedSender<MiningProgress>>,
    ) -> Result<SearchResult, MiningError> {
        self.search(0, difficulty, cancel, progress, |nonce| {
            double_sha256_hex(&BlockData::compose(previous_hash, data, nonce))
        })
        .await
    }

    async fn search<F>(
        &self,
        start_nonce: u64,
        difficulty: usize,
        cancel: &CancelSignal,
        progress: Option<&UnboundedSender<MiningProgress>>,
        hash_for: F,
    ) -> Result<SearchResult, MiningError>
    where
        F: Fn(u64) -> String,
    {
        let stride = self.config.progress_stride.max(1);
        let started = Instant::now();
        let mut nonce = start_nonce;
        let mut hash = hash_for(nonce);
        let mut attempts: u64 = 1;

        let outcome = loop {
            if is_difficulty_sufficient(&hash, difficulty) {
                break MiningOutcome::Mined;
            }
            if cancel.is_cancelled() {
                break MiningOutcome::Cancelled;
            }
            if attempts % stride == 0 {
                notify(progress, attempts, nonce, &hash, started.elapsed());
                tokio::task::yield_now().await;
                // A cancel may have landed while suspended.
                if cancel.is_cancelled() {
                    break MiningOutcome::Cancelled;
                }
            }
            nonce = nonce.checked_add(1).ok_or(MiningError::NonceOverflow)?;
            hash = hash_for(nonce);
            attempts += 1;
        };

        let elapsed = started.elapsed();
        // Final notification always carries the terminal values.
        notify(progress, attempts, nonce, &hash, elapsed);

        match outcome {
            MiningOutcome::Mined => {
                info!(attempts, nonce, difficulty, "block mined");
            }
            MiningOutcome::Cancelled => {
                debug!(attempts, nonce, "mining cancelled");
            }
        }

        Ok(SearchResult {
            outcome,
            nonce,
            hash,
            attempts,
            elapsed,
        })
    }
}

fn notify(
    progress: Option<&UnboundedSender<MiningProgress>>,
    attempts: u64,
    nonce: u64,
    hash: &str,
    elapsed: Duration,
) {
    if let Some(tx) = progress {
        // A dropped receiver just means nobody is watching anymore.
        let _ = tx.send(MiningProgress {
            attempts,
            nonce,
            hash: hash.to_string(),
            elapsed,
        });
    }
}
