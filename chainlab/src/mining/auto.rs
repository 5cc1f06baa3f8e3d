//! Cross-block mining sequencer.
//!
//! Mines every not-yet-valid block of a chain in index order. Before mining
//! block `i > 0` it waits for block `i - 1` to become valid, polling at a
//! fixed interval up to a bounded number of attempts; if the predecessor
//! never turns valid the remaining sequence is abandoned with a warning,
//! leaving already-mined blocks untouched.
//!
//! Each block's search runs through the [`MiningRegistry`] under the key
//! `(node_id, index)`, so a session already held elsewhere makes that step a
//! no-op and the predecessor wait does the coordinating. The global `cancel`
//! signal is consulted before each poll and before/after each mine call; to
//! also stop the block search currently in flight, cancel the node's
//! sessions through the registry.

use tokio::sync::mpsc::UnboundedSender;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::chain::Chain;

use super::engine::{MiningEngine, MiningOutcome, MiningProgress};
use super::registry::{CancelSignal, MiningRegistry, SessionKey};
use super::MiningError;

/// Terminal status of an auto-mine pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoMineStatus {
    Completed,
    Cancelled,
    /// The predecessor of block `index` never became valid within the poll
    /// budget.
    PredecessorTimeout { index: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoMineReport {
    pub status: AutoMineStatus,
    pub blocks_mined: usize,
}

pub async fn auto_mine(
    chain: &mut Chain,
    node_id: u64,
    engine: &MiningEngine,
    registry: &MiningRegistry,
    cancel: &CancelSignal,
    progress: Option<&UnboundedSender<MiningProgress>>,
) -> Result<AutoMineReport, MiningError> {
    let difficulty = chain.difficulty();
    let config = engine.config().clone();
    let mut blocks_mined = 0;

    for index in 0..chain.len() {
        if cancel.is_cancelled() {
            return Ok(AutoMineReport {
                status: AutoMineStatus::Cancelled,
                blocks_mined,
            });
        }
        if chain.is_block_valid(index) {
            continue;
        }

        // Genesis never reaches this point, so a predecessor always exists.
        let mut polls = 0;
        while !chain.is_block_valid(index - 1) {
            if cancel.is_cancelled() {
                return Ok(AutoMineReport {
                    status: AutoMineStatus::Cancelled,
                    blocks_mined,
                });
            }
            if polls >= config.max_poll_attempts {
                warn!(
                    index,
                    polls, "timed out waiting for predecessor to become valid"
                );
                return Ok(AutoMineReport {
                    status: AutoMineStatus::PredecessorTimeout {
                        index: index as u64,
                    },
                    blocks_mined,
                });
            }
            sleep(config.poll_interval).await;
            polls += 1;
        }

        if cancel.is_cancelled() {
            return Ok(AutoMineReport {
                status: AutoMineStatus::Cancelled,
                blocks_mined,
            });
        }

        chain.relink_block(index);
        let key = SessionKey::new(node_id, index as u64);
        let Some(block) = chain.block_mut(index) else {
            continue;
        };

        let outcome = registry
            .start(key, |session| async move {
                engine
                    .mine_block(block, difficulty, &session, progress)
                    .await
            })
            .await;

        match outcome {
            Some(Ok(MiningOutcome::Mined)) => {
                blocks_mined += 1;
                info!(index, "auto-mine finished block");
                if index + 1 < chain.len() {
                    sleep(config.settle_delay).await;
                }
            }
            Some(Ok(MiningOutcome::Cancelled)) => {
                // The session was cancelled individually; the next block's
                // predecessor wait (or the global flag) decides what happens.
                debug!(index, "auto-mine step cancelled");
            }
            Some(Err(e)) => return Err(e),
            None => {
                debug!(index, "block already being mined elsewhere, skipping");
            }
        }

        if cancel.is_cancelled() {
            return Ok(AutoMineReport {
                status: AutoMineStatus::Cancelled,
                blocks_mined,
            });
        }
    }

    Ok(AutoMineReport {
        status: AutoMineStatus::Completed,
        blocks_mined,
    })
}
