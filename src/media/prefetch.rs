// SPDX-License-Identifier: MPL-2.0
//! Neighbor preloading for faster gallery navigation.
//!
//! This module provides best-effort fetching of the resources around the focal
//! item of a sequence, reducing perceived latency when the user moves on.
//!
//! # Design
//!
//! - **Session-scoped**: [`PreloadCache`] is owned by one navigator and lent by
//!   reference; there is no global state
//! - **Outcome sets**: every URI resolves at most once, into `loaded` or `failed`
//! - **LRU payloads**: bytes of loaded URIs are kept in a memory-bounded LRU;
//!   eviction drops bytes only, never the `loaded` mark
//! - **No retries**: a failed preload is recorded and left alone
//! - **Shared fetches**: an in-flight fetch is published in the cache so a lazy
//!   loader wanting the same URI joins it instead of issuing a second request
//!
//! # Usage
//!
//! ```ignore
//! let mut cache = PreloadCache::with_defaults();
//! let mut scheduler = PreloadScheduler::new(fetcher, None);
//!
//! scheduler.schedule(&mut cache, &sequence, focal, Lookahead::new(2));
//! scheduler.settle(&mut cache).await;
//!
//! if let Some(bytes) = cache.lookup(&sequence[focal + 1]) {
//!     // Render without touching the network
//! }
//! ```

use crate::application::port::{FetchFuture, ResourceFetcher};
use crate::config::{
    DEFAULT_MAX_CACHED_PAYLOADS, DEFAULT_PRELOAD_CACHE_BYTES, MAX_MAX_CACHED_PAYLOADS,
    MAX_PRELOAD_CACHE_BYTES, MIN_MAX_CACHED_PAYLOADS, MIN_PRELOAD_CACHE_BYTES,
};
use crate::domain::gallery::Lookahead;
use crate::domain::loading::{Payload, ResourceUri};
use crate::error::FetchError;
use futures_util::future::{BoxFuture, Shared};
use futures_util::stream::FuturesUnordered;
use futures_util::{FutureExt, StreamExt};
use lru::LruCache;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// PreloadCache
// =============================================================================

/// Payload budget of a [`PreloadCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreloadCacheConfig {
    /// Maximum retained payload bytes.
    pub max_bytes: usize,

    /// Maximum number of retained payloads.
    pub max_entries: usize,
}

impl Default for PreloadCacheConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_PRELOAD_CACHE_BYTES,
            max_entries: DEFAULT_MAX_CACHED_PAYLOADS,
        }
    }
}

impl PreloadCacheConfig {
    /// Creates a budget with both limits clamped to the supported range.
    #[must_use]
    pub fn new(max_bytes: usize, max_entries: usize) -> Self {
        Self {
            max_bytes: max_bytes.clamp(MIN_PRELOAD_CACHE_BYTES, MAX_PRELOAD_CACHE_BYTES),
            max_entries: max_entries.clamp(MIN_MAX_CACHED_PAYLOADS, MAX_MAX_CACHED_PAYLOADS),
        }
    }
}

/// Statistics about preload cache performance.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreloadStats {
    /// Number of payloads currently retained.
    pub payload_count: usize,

    /// Total bytes currently retained.
    pub total_bytes: usize,

    /// Lookups answered with a payload.
    pub hits: u64,

    /// Lookups that had to go to the network.
    pub misses: u64,

    /// Payloads dropped due to limits.
    pub evictions: u64,

    /// Payloads retained.
    pub insertions: u64,
}

impl PreloadStats {
    /// Returns the cache hit rate as a percentage (0.0 - 100.0).
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Network fetch that several consumers may await.
pub type SharedFetch = Shared<FetchFuture>;

/// Loaded/failed/in-flight bookkeeping of one gallery session.
///
/// `loaded` and `failed` are append-only and disjoint: the first recorded
/// outcome of a URI wins.
pub struct PreloadCache {
    loaded: HashSet<ResourceUri>,
    failed: HashSet<ResourceUri>,
    in_flight: HashMap<ResourceUri, Option<SharedFetch>>,
    payloads: LruCache<ResourceUri, Payload>,
    config: PreloadCacheConfig,
    current_bytes: usize,
    stats: PreloadStats,
}

impl PreloadCache {
    #[must_use]
    pub fn new(config: PreloadCacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            loaded: HashSet::new(),
            failed: HashSet::new(),
            in_flight: HashMap::new(),
            payloads: LruCache::new(capacity),
            config,
            current_bytes: 0,
            stats: PreloadStats::default(),
        }
    }

    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(PreloadCacheConfig::default())
    }

    /// Marks `uri` as in flight.
    ///
    /// Returns `false`, leaving the cache untouched, if the URI already
    /// resolved or is being fetched.
    pub fn begin(&mut self, uri: &ResourceUri) -> bool {
        if self.is_known(uri) {
            return false;
        }
        self.in_flight.insert(uri.clone(), None);
        true
    }

    /// Marks `uri` as in flight and publishes `fetch` so others can join it.
    ///
    /// Returns the handle the caller should await.
    pub fn begin_shared(&mut self, uri: &ResourceUri, fetch: FetchFuture) -> SharedFetch {
        let shared = fetch.shared();
        self.in_flight.insert(uri.clone(), Some(shared.clone()));
        shared
    }

    /// Returns the published fetch of `uri` if it is still running.
    #[must_use]
    pub fn join(&self, uri: &ResourceUri) -> Option<SharedFetch> {
        match self.in_flight.get(uri) {
            Some(Some(shared)) if shared.peek().is_none() => Some(shared.clone()),
            _ => None,
        }
    }

    /// Clears the in-flight mark of `uri` without recording an outcome, as
    /// long as it still refers to `fetch`.
    pub fn abandon(&mut self, uri: &ResourceUri, fetch: &SharedFetch) {
        if matches!(self.in_flight.get(uri), Some(Some(current)) if current.ptr_eq(fetch)) {
            self.in_flight.remove(uri);
        }
    }

    /// Records a successful fetch and retains its payload.
    ///
    /// Returns `false` if the URI already resolved as failed.
    pub fn record_loaded(&mut self, uri: &ResourceUri, payload: Payload) -> bool {
        self.in_flight.remove(uri);
        if self.failed.contains(uri) {
            return false;
        }
        self.loaded.insert(uri.clone());
        if !self.payloads.contains(uri) {
            self.retain(uri.clone(), payload);
        }
        true
    }

    /// Records a failed fetch.
    ///
    /// Returns `false` if the URI already resolved as loaded.
    pub fn record_failed(&mut self, uri: &ResourceUri) -> bool {
        self.in_flight.remove(uri);
        if self.loaded.contains(uri) {
            return false;
        }
        self.failed.insert(uri.clone());
        true
    }

    /// Returns the retained payload of a loaded URI.
    ///
    /// Updates LRU order. A loaded URI whose bytes were evicted, or never
    /// retained, yields `None` here but still reports [`is_loaded`](Self::is_loaded).
    pub fn lookup(&mut self, uri: &ResourceUri) -> Option<Payload> {
        if let Some(payload) = self.payloads.get(uri) {
            self.stats.hits += 1;
            Some(Arc::clone(payload))
        } else {
            self.stats.misses += 1;
            None
        }
    }

    #[must_use]
    pub fn is_loaded(&self, uri: &ResourceUri) -> bool {
        self.loaded.contains(uri)
    }

    #[must_use]
    pub fn is_failed(&self, uri: &ResourceUri) -> bool {
        self.failed.contains(uri)
    }

    #[must_use]
    pub fn is_in_flight(&self, uri: &ResourceUri) -> bool {
        self.in_flight.contains_key(uri)
    }

    /// Returns `true` if the URI is loaded, failed or in flight.
    #[must_use]
    pub fn is_known(&self, uri: &ResourceUri) -> bool {
        self.loaded.contains(uri) || self.failed.contains(uri) || self.in_flight.contains_key(uri)
    }

    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Returns the current memory usage of retained payloads in bytes.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.current_bytes
    }

    #[must_use]
    pub fn stats(&self) -> PreloadStats {
        self.stats
    }

    #[must_use]
    pub fn config(&self) -> &PreloadCacheConfig {
        &self.config
    }

    fn retain(&mut self, uri: ResourceUri, payload: Payload) {
        let size = payload.len();

        // Don't keep payloads larger than half the budget
        if size > self.config.max_bytes / 2 {
            return;
        }

        while self.current_bytes + size > self.config.max_bytes && !self.payloads.is_empty() {
            if let Some((_, evicted)) = self.payloads.pop_lru() {
                self.current_bytes = self.current_bytes.saturating_sub(evicted.len());
                self.stats.evictions += 1;
            }
        }

        // `push` reports the entry displaced by the entry-count limit.
        if let Some((_, evicted)) = self.payloads.push(uri, payload) {
            self.current_bytes = self.current_bytes.saturating_sub(evicted.len());
            self.stats.evictions += 1;
        }
        self.current_bytes += size;
        self.stats.insertions += 1;
        self.stats.payload_count = self.payloads.len();
        self.stats.total_bytes = self.current_bytes;
    }
}

impl Default for PreloadCache {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for PreloadCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreloadCache")
            .field("loaded", &self.loaded.len())
            .field("failed", &self.failed.len())
            .field("in_flight", &self.in_flight.len())
            .field("memory_usage", &self.current_bytes)
            .field("max_bytes", &self.config.max_bytes)
            .field("max_entries", &self.config.max_entries)
            .field("stats", &self.stats)
            .finish()
    }
}

// =============================================================================
// Preload window
// =============================================================================

/// Indices to preload around `focal` in a sequence of `len` items.
///
/// Nearest neighbors come first, forward before backward at equal distance.
/// The focal index itself is never included; an out-of-range focal yields
/// nothing.
#[must_use]
pub fn preload_window(len: usize, focal: usize, lookahead: usize) -> Vec<usize> {
    if focal >= len {
        return Vec::new();
    }
    let mut window = Vec::with_capacity(lookahead * 2);
    for distance in 1..=lookahead {
        if let Some(next) = focal.checked_add(distance).filter(|index| *index < len) {
            window.push(next);
        }
        if let Some(previous) = focal.checked_sub(distance) {
            window.push(previous);
        }
    }
    window
}

// =============================================================================
// PreloadScheduler
// =============================================================================

type PreloadFuture = BoxFuture<'static, (ResourceUri, Result<Payload, FetchError>)>;

/// Issues one-shot fetches for the neighborhood of the focal item.
///
/// The scheduler holds in-flight fetches but never polls them on its own:
/// the owner absorbs completions with [`absorb_ready`](Self::absorb_ready),
/// [`next_completion`](Self::next_completion) or [`settle`](Self::settle).
pub struct PreloadScheduler {
    fetcher: Arc<dyn ResourceFetcher>,
    fetch_timeout: Option<Duration>,
    in_flight: FuturesUnordered<PreloadFuture>,
    stopped: bool,
}

impl PreloadScheduler {
    #[must_use]
    pub fn new(fetcher: Arc<dyn ResourceFetcher>, fetch_timeout: Option<Duration>) -> Self {
        Self {
            fetcher,
            fetch_timeout,
            in_flight: FuturesUnordered::new(),
            stopped: false,
        }
    }

    /// Starts a fetch for every URI of the window not yet known to `cache`.
    ///
    /// Returns the number of fetches issued.
    pub fn schedule(
        &mut self,
        cache: &mut PreloadCache,
        sequence: &[ResourceUri],
        focal: usize,
        lookahead: Lookahead,
    ) -> usize {
        if self.stopped {
            return 0;
        }
        let mut issued = 0;
        for index in preload_window(sequence.len(), focal, lookahead.value()) {
            let uri = &sequence[index];
            if cache.is_known(uri) {
                continue;
            }
            let fetch = cache.begin_shared(uri, self.fetcher.fetch(uri));
            self.dispatch(uri.clone(), fetch);
            issued += 1;
        }
        if issued > 0 {
            tracing::debug!(focal, issued, "preload scheduled");
        }
        issued
    }

    /// Records every completion that is already available, without waiting.
    pub fn absorb_ready(&mut self, cache: &mut PreloadCache) -> usize {
        let mut absorbed = 0;
        while let Some(Some((uri, result))) = self.in_flight.next().now_or_never() {
            record(cache, &uri, result);
            absorbed += 1;
        }
        absorbed
    }

    /// Waits for the next completion and records it.
    ///
    /// Returns `None` once nothing is in flight.
    pub async fn next_completion(&mut self, cache: &mut PreloadCache) -> Option<ResourceUri> {
        let (uri, result) = self.in_flight.next().await?;
        record(cache, &uri, result);
        Some(uri)
    }

    /// Waits for every in-flight fetch and records the outcomes.
    pub async fn settle(&mut self, cache: &mut PreloadCache) {
        while self.next_completion(cache).await.is_some() {}
    }

    /// Stops issuing new fetches. In-flight ones still complete.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn resume(&mut self) {
        self.stopped = false;
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Number of fetches not yet absorbed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    fn dispatch(&mut self, uri: ResourceUri, fetch: SharedFetch) {
        let timeout = self.fetch_timeout;
        self.in_flight.push(
            async move {
                let result = match timeout {
                    Some(limit) => tokio::time::timeout(limit, fetch)
                        .await
                        .unwrap_or(Err(FetchError::Timeout(limit))),
                    None => fetch.await,
                };
                (uri, result)
            }
            .boxed(),
        );
    }
}

impl std::fmt::Debug for PreloadScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreloadScheduler")
            .field("fetch_timeout", &self.fetch_timeout)
            .field("in_flight", &self.in_flight.len())
            .field("stopped", &self.stopped)
            .finish_non_exhaustive()
    }
}

fn record(cache: &mut PreloadCache, uri: &ResourceUri, result: Result<Payload, FetchError>) {
    match result {
        Ok(payload) => {
            tracing::debug!(%uri, bytes = payload.len(), "preload complete");
            cache.record_loaded(uri, payload);
        }
        Err(error) => {
            tracing::debug!(%uri, %error, "preload failed");
            cache.record_failed(uri);
        }
    }
}
