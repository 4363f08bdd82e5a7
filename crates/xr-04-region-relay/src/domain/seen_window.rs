//! # Recent-Seen Window
//!
//! Remembers which `(origin_region, dedup_token)` pairs this region has
//! already processed.
//!
//! - One LRU per origin region, bounded by `capacity_per_origin`.
//! - Entries older than `ttl` are treated as unseen and evicted lazily.
//! - `check_and_insert` runs under the origin's lock, so two concurrent
//!   arrivals of the same key cannot both be accepted.
//!
//! Tokens are never promoted on lookup, so LRU order is insertion order and
//! expired entries always sit at the cold end.

use std::num::NonZeroUsize;
use std::time::Instant;

use dashmap::DashMap;
use lru::LruCache;
use parking_lot::Mutex;
use shared_types::{DedupToken, RegionId};

use super::value_objects::SeenWindowConfig;

type OriginCache = Mutex<LruCache<DedupToken, Instant>>;

/// Per-origin dedup window.
pub struct SeenWindow {
    config: SeenWindowConfig,
    origins: DashMap<RegionId, OriginCache>,
}

impl SeenWindow {
    /// Create an empty window.
    #[must_use]
    pub fn new(config: SeenWindowConfig) -> Self {
        Self {
            config,
            origins: DashMap::new(),
        }
    }

    /// Record `(origin, token)` if it has not been seen within the window.
    ///
    /// Returns `true` for a first sighting, `false` for a duplicate.
    pub fn check_and_insert(&self, origin: &RegionId, token: DedupToken) -> bool {
        self.check_and_insert_at(origin, token, Instant::now())
    }

    fn check_and_insert_at(&self, origin: &RegionId, token: DedupToken, now: Instant) -> bool {
        if let Some(cache) = self.origins.get(origin) {
            return self.record(&mut cache.lock(), token, now);
        }
        let cache = self
            .origins
            .entry(origin.clone())
            .or_insert_with(|| Mutex::new(LruCache::new(self.capacity())));
        let mut guard = cache.lock();
        self.record(&mut guard, token, now)
    }

    /// Whether `(origin, token)` is currently remembered.
    #[must_use]
    pub fn contains(&self, origin: &RegionId, token: &DedupToken) -> bool {
        let now = Instant::now();
        self.origins.get(origin).is_some_and(|cache| {
            cache
                .lock()
                .peek(token)
                .is_some_and(|seen_at| now.duration_since(*seen_at) < self.config.ttl)
        })
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        self.origins
            .iter()
            .map(|cache| self.evict_expired(&mut cache.lock(), now))
            .sum()
    }

    /// Remembered tokens across all origins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.origins.iter().map(|cache| cache.lock().len()).sum()
    }

    /// Whether nothing is remembered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of origin regions tracked.
    #[must_use]
    pub fn origin_count(&self) -> usize {
        self.origins.len()
    }

    fn record(&self, cache: &mut LruCache<DedupToken, Instant>, token: DedupToken, now: Instant) -> bool {
        self.evict_expired(cache, now);
        if cache.peek(&token).is_some() {
            return false;
        }
        cache.put(token, now);
        true
    }

    fn evict_expired(&self, cache: &mut LruCache<DedupToken, Instant>, now: Instant) -> usize {
        let mut evicted = 0;
        while let Some((_, seen_at)) = cache.peek_lru() {
            if now.saturating_duration_since(*seen_at) < self.config.ttl {
                break;
            }
            cache.pop_lru();
            evicted += 1;
        }
        evicted
    }

    fn capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.config.capacity_per_origin).unwrap_or(NonZeroUsize::MIN)
    }
}

impl std::fmt::Debug for SeenWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeenWindow")
            .field("config", &self.config)
            .field("origins", &self.origins.len())
            .finish()
    }
}
