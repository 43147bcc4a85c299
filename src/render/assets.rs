//! Lazily loaded image assets with stale-completion protection.
//!
//! The cache never performs I/O. `request` queues a [`LoadTicket`] that the
//! host drains with `take_pending`, decodes however it likes and reports back
//! through `complete`. A completion is applied only if its ticket is still the
//! current one for the source, so a load that was invalidated while in flight
//! can never overwrite fresher state.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AssetError {
    #[error("Asset fetch failed: {0}")]
    Fetch(String),

    #[error("Asset decode failed: {0}")]
    Decode(String),
}

/// Identifies one load attempt for one source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    pub source: String,
    pub generation: u64,
}

/// Load state of one asset source.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetState<H> {
    Unloaded,
    Loading(u64),
    Ready(H),
    Failed,
}

/// Per-source image cache keyed by the source string (URL or data URI).
#[derive(Debug)]
pub struct AssetCache<H> {
    entries: HashMap<String, AssetState<H>>,
    pending: Vec<LoadTicket>,
    next_generation: u64,
}

impl<H> Default for AssetCache<H> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            pending: Vec::new(),
            next_generation: 1,
        }
    }
}

impl<H> AssetCache<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ready handle for `source`, starting a load the first time it is asked for.
    ///
    /// Returns `None` while loading, after a failure, or for an empty source.
    pub fn request(&mut self, source: &str) -> Option<&H> {
        let source = source.trim();
        if source.is_empty() {
            return None;
        }

        if !self.entries.contains_key(source) {
            let generation = self.next_generation;
            self.next_generation += 1;
            debug!(source, generation, "Queueing asset load");
            self.pending.push(LoadTicket {
                source: source.to_string(),
                generation,
            });
            self.entries
                .insert(source.to_string(), AssetState::Loading(generation));
        }

        match self.entries.get(source) {
            Some(AssetState::Ready(handle)) => Some(handle),
            _ => None,
        }
    }

    /// Drain the loads the host still has to perform.
    pub fn take_pending(&mut self) -> Vec<LoadTicket> {
        std::mem::take(&mut self.pending)
    }

    /// Apply a finished load. Returns `false` when the ticket was stale.
    pub fn complete(&mut self, ticket: &LoadTicket, result: Result<H, AssetError>) -> bool {
        let current = matches!(
            self.entries.get(&ticket.source),
            Some(AssetState::Loading(generation)) if *generation == ticket.generation
        );
        if !current {
            debug!(
                source = %ticket.source,
                generation = ticket.generation,
                "Discarding stale asset completion"
            );
            return false;
        }

        let state = match result {
            Ok(handle) => {
                debug!(source = %ticket.source, "Asset ready");
                AssetState::Ready(handle)
            }
            Err(err) => {
                warn!(source = %ticket.source, error = %err, "Asset failed to load, using procedural fallback");
                AssetState::Failed
            }
        };
        self.entries.insert(ticket.source.clone(), state);
        true
    }

    /// Forget `source` so the next request starts a fresh load.
    pub fn invalidate(&mut self, source: &str) {
        let source = source.trim();
        if self.entries.remove(source).is_some() {
            debug!(source, "Asset invalidated");
        }
        self.pending.retain(|t| t.source != source);
    }

    /// Forget every source.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.pending.clear();
    }

    pub fn state(&self, source: &str) -> AssetState<&H> {
        match self.entries.get(source.trim()) {
            None => AssetState::Unloaded,
            Some(AssetState::Unloaded) => AssetState::Unloaded,
            Some(AssetState::Loading(generation)) => AssetState::Loading(*generation),
            Some(AssetState::Ready(handle)) => AssetState::Ready(handle),
            Some(AssetState::Failed) => AssetState::Failed,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_queues_once() {
        let mut cache: AssetCache<u32> = AssetCache::new();
        assert!(cache.request("a.png").is_none());
        assert!(cache.request("a.png").is_none());
        let pending = cache.take_pending();
        assert_eq!(pending.len(), 1);
        assert!(cache.take_pending().is_empty());
        assert!(matches!(cache.state("a.png"), AssetState::Loading(_)));
    }

    #[test]
    fn test_complete_makes_ready() {
        let mut cache = AssetCache::new();
        cache.request("a.png");
        let ticket = cache.take_pending().remove(0);
        assert!(cache.complete(&ticket, Ok(7u32)));
        assert_eq!(cache.request("a.png"), Some(&7));
    }

    #[test]
    fn test_stale_completion_discarded() {
        let mut cache = AssetCache::new();
        cache.request("a.png");
        let old = cache.take_pending().remove(0);

        cache.invalidate("a.png");
        cache.request("a.png");
        let fresh = cache.take_pending().remove(0);
        assert_ne!(old.generation, fresh.generation);

        assert!(!cache.complete(&old, Ok(1u32)));
        assert!(matches!(cache.state("a.png"), AssetState::Loading(_)));
        assert!(cache.complete(&fresh, Ok(2u32)));
        assert_eq!(cache.request("a.png"), Some(&2));
    }

    #[test]
    fn test_failure_is_not_retried() {
        let mut cache: AssetCache<u32> = AssetCache::new();
        cache.request("bad.png");
        let ticket = cache.take_pending().remove(0);
        cache.complete(&ticket, Err(AssetError::Decode("truncated".into())));

        assert!(cache.request("bad.png").is_none());
        assert!(cache.take_pending().is_empty());
        assert_eq!(cache.state("bad.png"), AssetState::Failed);
    }

    #[test]
    fn test_empty_source_ignored() {
        let mut cache: AssetCache<u32> = AssetCache::new();
        assert!(cache.request("  ").is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.state("missing"), AssetState::Unloaded);
    }
}
