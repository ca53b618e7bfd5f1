//! Key Selection
//!
//! Picks one credential from a channel's pool per outbound call.

use crate::credential::{CredentialEntry, CredentialPool};
use crate::error::{ResolverError, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Strategy for choosing a key from a multi-key pool
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Uniformly random key on every call
    #[default]
    Random,

    /// Cycle through keys in pool order
    RoundRobin,
}

/// Select one entry from `pool`.
///
/// Returns the entry and the cursor for the next call. Round-robin indexes
/// modulo the pool's current length, so a pool that grew or shrank between
/// calls never breaks the sequence.
pub fn select(
    pool: &CredentialPool,
    policy: SelectionPolicy,
    cursor: usize,
) -> Result<(&CredentialEntry, usize)> {
    let len = pool.len();
    if len == 0 {
        return Err(ResolverError::EmptyPool(String::new()));
    }

    let (idx, next) = match policy {
        SelectionPolicy::Random => (random_index(len), cursor),
        SelectionPolicy::RoundRobin => (cursor % len, cursor.wrapping_add(1)),
    };

    pool.get(idx)
        .map(|entry| (entry, next))
        .ok_or_else(|| ResolverError::EmptyPool(String::new()))
}

/// Pseudo-random index in `0..len`
fn random_index(len: usize) -> usize {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let hasher = RandomState::new().build_hasher();
    hasher.finish() as usize % len
}

/// Round-robin cursors, one per channel
#[derive(Debug, Default)]
pub struct CursorStore {
    cursors: RwLock<HashMap<String, Arc<AtomicUsize>>>,
}

impl CursorStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn cursor(&self, channel: &str) -> Arc<AtomicUsize> {
        if let Some(cursor) = self.cursors.read().get(channel) {
            return cursor.clone();
        }

        self.cursors
            .write()
            .entry(channel.to_string())
            .or_insert_with(|| Arc::new(AtomicUsize::new(0)))
            .clone()
    }

    /// Take the channel's current cursor and advance it.
    ///
    /// Concurrent callers always receive distinct values.
    pub fn advance(&self, channel: &str) -> usize {
        self.cursor(channel).fetch_add(1, Ordering::Relaxed)
    }

    /// Current cursor without advancing
    pub fn current(&self, channel: &str) -> usize {
        self.cursors
            .read()
            .get(channel)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Restart the channel's sequence from the first key
    pub fn reset(&self, channel: &str) {
        if let Some(cursor) = self.cursors.read().get(channel) {
            cursor.store(0, Ordering::Relaxed);
        }
    }

    /// Drop the cursor of a removed channel
    pub fn forget(&self, channel: &str) {
        self.cursors.write().remove(channel);
    }
}

/// Selects keys for channels using a shared cursor store
#[derive(Debug, Clone, Default)]
pub struct KeySelector {
    cursors: Arc<CursorStore>,
}

impl KeySelector {
    /// Create a selector over an existing cursor store
    pub fn new(cursors: Arc<CursorStore>) -> Self {
        Self { cursors }
    }

    pub fn cursors(&self) -> &Arc<CursorStore> {
        &self.cursors
    }

    /// Select a key for one outbound call on `channel`
    pub fn select_for(
        &self,
        channel: &str,
        pool: &CredentialPool,
        policy: SelectionPolicy,
    ) -> Result<CredentialEntry> {
        if pool.is_empty() {
            return Err(ResolverError::EmptyPool(channel.to_string()));
        }

        let cursor = match policy {
            SelectionPolicy::RoundRobin => self.cursors.advance(channel),
            SelectionPolicy::Random => 0,
        };

        let (entry, _) = select(pool, policy, cursor)
            .map_err(|_| ResolverError::EmptyPool(channel.to_string()))?;

        debug!(channel, policy = ?policy, key = %entry.masked(), "selected key");
        Ok(entry.clone())
    }
}
