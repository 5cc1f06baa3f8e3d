//! Tracks in-flight mining sessions per `(node, block)` key.
//!
//! At most one session may be active per key at any time; starting a search
//! on an already-active key is a logged no-op, not an error. The registry
//! owns each session's cancellation flag for its whole lifecycle; mining
//! loops only observe it through the [`CancelSignal`] handed to them.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

/// Identifies one (node, block) mining slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub node_id: u64,
    pub block_index: u64,
}

impl SessionKey {
    pub fn new(node_id: u64, block_index: u64) -> Self {
        Self {
            node_id,
            block_index,
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.node_id, self.block_index)
    }
}

/// Advisory cancellation token observed by a mining loop. Requesting
/// cancellation only guarantees the search notices it at its next check,
/// never mid-hash.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal(Arc<AtomicBool>);

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
struct MiningSession {
    cancel: CancelSignal,
    active: AtomicBool,
}

impl MiningSession {
    fn fresh() -> Arc<Self> {
        Arc::new(Self {
            cancel: CancelSignal::new(),
            active: AtomicBool::new(true),
        })
    }
}

/// Shared registry of outstanding mining sessions.
#[derive(Debug, Default)]
pub struct MiningRegistry {
    sessions: DashMap<SessionKey, Arc<MiningSession>>,
}

impl MiningRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `search` under `key` unless that key already has an active
    /// session, in which case nothing runs and `None` is returned. The
    /// search receives a [`CancelSignal`] bound to this session.
    pub async fn start<F, Fut, T>(&self, key: SessionKey, search: F) -> Option<T>
    where
        F: FnOnce(CancelSignal) -> Fut,
        Fut: Future<Output = T>,
    {
        let session = match self.sessions.entry(key) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().active.load(Ordering::Relaxed) {
                    debug!(%key, "mining already in progress, ignoring start request");
                    return None;
                }
                // A cancelled session left its record behind; replace it.
                let fresh = MiningSession::fresh();
                occupied.insert(Arc::clone(&fresh));
                fresh
            }
            Entry::Vacant(vacant) => {
                let fresh = MiningSession::fresh();
                vacant.insert(Arc::clone(&fresh));
                fresh
            }
        };

        let output = search(session.cancel.clone()).await;

        session.active.store(false, Ordering::Relaxed);
        if !session.cancel.is_cancelled() {
            // Only drop our own record: a concurrent start may already have
            // installed a successor session under the same key.
            self.sessions
                .remove_if(&key, |_, existing| Arc::ptr_eq(existing, &session));
        }
        Some(output)
    }

    /// Requests cancellation of the key's session and marks it inactive.
    /// Unknown keys are ignored.
    pub fn cancel(&self, key: SessionKey) {
        if let Some(session) = self.sessions.get(&key) {
            session.cancel.cancel();
            session.active.store(false, Ordering::Relaxed);
        }
    }

    pub fn is_mining(&self, key: SessionKey) -> bool {
        self.sessions
            .get(&key)
            .map(|session| session.active.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    pub fn should_cancel(&self, key: SessionKey) -> bool {
        self.sessions
            .get(&key)
            .map(|session| session.cancel.is_cancelled())
            .unwrap_or(false)
    }

    /// Drops tracking state for one block unconditionally.
    pub fn reset_block(&self, key: SessionKey) {
        self.sessions.remove(&key);
    }

    /// Drops tracking state for every block of a node. Used when a consensus
    /// sync replaces the node's blocks wholesale: stale sessions referencing
    /// replaced blocks must not linger.
    pub fn reset_node(&self, node_id: u64) {
        self.sessions.retain(|key, _| key.node_id != node_id);
    }

    /// Cancels every active session belonging to a node.
    pub fn cancel_all_for_node(&self, node_id: u64) {
        for entry in self.sessions.iter() {
            if entry.key().node_id == node_id {
                entry.value().cancel.cancel();
                entry.value().active.store(false, Ordering::Relaxed);
            }
        }
    }
}
