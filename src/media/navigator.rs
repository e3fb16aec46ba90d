// SPDX-License-Identifier: MPL-2.0
//! Gallery navigation with neighbor preloading.
//!
//! [`GalleryNavigator`] is the composition root of a gallery session. It owns
//! the [`PreloadCache`] of the session, keeps the focal index and the view
//! transform, and asks the [`PreloadScheduler`] for the neighbors every time
//! the focal item changes.
//!
//! # Usage
//!
//! ```ignore
//! let mut gallery = GalleryNavigator::new(photos, HttpFetcher::new()?)
//!     .with_lookahead(Lookahead::new(2));
//!
//! gallery.open(3)?;
//! gallery.zoom_in();
//! gallery.next();
//! gallery.absorb_preloads();
//!
//! if let Some(download) = gallery.download_current().await? {
//!     download.save_to(&downloads_dir)?;
//! }
//! gallery.close();
//! ```

use crate::application::port::ResourceFetcher;
use crate::config::Config;
use crate::domain::gallery::{Lookahead, Rotation, ZoomScale};
use crate::domain::loading::{Payload, ResourceUri};
use crate::error::{Error, FetchError, Result};
use crate::media::prefetch::{PreloadCache, PreloadCacheConfig, PreloadScheduler};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Document-level side effects of an open gallery.
///
/// Both hooks default to no-ops.
pub trait NavigatorHost: Send {
    /// Called when the gallery opens.
    fn lock_scroll(&mut self) {}

    /// Called when the gallery closes.
    fn unlock_scroll(&mut self) {}
}

/// Host without side effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHost;

impl NavigatorHost for NoopHost {}

/// Render snapshot of the view state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub scale: f32,
    /// Rotation folded into `0..360`.
    pub rotation_degrees: u16,
}

/// Navigation state information for UI rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationInfo {
    /// Whether there is a next item to navigate to.
    pub has_next: bool,
    /// Whether there is a previous item to navigate to.
    pub has_previous: bool,
    /// Current position in the sequence (0-indexed), if open.
    pub current_index: Option<usize>,
    /// Total number of items in the sequence.
    pub total_count: usize,
}

/// Bytes of the current item, ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub source: ResourceUri,
    pub file_name: String,
    pub bytes: Payload,
}

impl Download {
    /// Writes the bytes to `dir/file_name`, creating `dir` if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the directory or the file cannot be written.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, self.bytes.as_slice())?;
        tracing::info!(path = %path.display(), bytes = self.bytes.len(), "download saved");
        Ok(path)
    }
}

/// Browsable sequence of resources with a focal item.
pub struct GalleryNavigator {
    sequence: Vec<ResourceUri>,
    focal_index: Option<usize>,
    scale: ZoomScale,
    rotation: Rotation,
    lookahead: Lookahead,
    cache: PreloadCache,
    scheduler: PreloadScheduler,
    fetcher: Arc<dyn ResourceFetcher>,
    fetch_timeout: Option<Duration>,
    host: Box<dyn NavigatorHost>,
}

impl GalleryNavigator {
    /// Creates a closed navigator over `sequence`.
    pub fn new(sequence: Vec<ResourceUri>, fetcher: impl ResourceFetcher + 'static) -> Self {
        let fetcher: Arc<dyn ResourceFetcher> = Arc::new(fetcher);
        Self {
            sequence,
            focal_index: None,
            scale: ZoomScale::default(),
            rotation: Rotation::ZERO,
            lookahead: Lookahead::default(),
            cache: PreloadCache::with_defaults(),
            scheduler: PreloadScheduler::new(Arc::clone(&fetcher), None),
            fetcher,
            fetch_timeout: None,
            host: Box::new(NoopHost),
        }
    }

    /// Creates a navigator with the lookahead, payload budget and timeout of `config`.
    pub fn from_config(
        sequence: Vec<ResourceUri>,
        fetcher: impl ResourceFetcher + 'static,
        config: &Config,
    ) -> Self {
        let (max_bytes, max_entries) = config.preload_budget();
        Self::new(sequence, fetcher)
            .with_lookahead(config.lookahead())
            .with_cache(PreloadCache::new(PreloadCacheConfig::new(max_bytes, max_entries)))
            .with_fetch_timeout(config.fetch_timeout())
    }

    #[must_use]
    pub fn with_lookahead(mut self, lookahead: Lookahead) -> Self {
        self.lookahead = lookahead;
        self
    }

    /// Replaces the session cache, e.g. to carry one over from a previous session.
    #[must_use]
    pub fn with_cache(mut self, cache: PreloadCache) -> Self {
        self.cache = cache;
        self
    }

    #[must_use]
    pub fn with_host(mut self, host: impl NavigatorHost + 'static) -> Self {
        self.host = Box::new(host);
        self
    }

    #[must_use]
    pub fn with_fetch_timeout(mut self, fetch_timeout: Option<Duration>) -> Self {
        self.fetch_timeout = fetch_timeout;
        self.scheduler = PreloadScheduler::new(Arc::clone(&self.fetcher), fetch_timeout);
        self
    }

    // -------------------------------------------------------------------------
    // Navigation
    // -------------------------------------------------------------------------

    /// Opens the gallery at `index` with a fresh view.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIndex`] if `index` is outside the sequence.
    pub fn open(&mut self, index: usize) -> Result<()> {
        if index >= self.sequence.len() {
            return Err(Error::InvalidIndex {
                index,
                len: self.sequence.len(),
            });
        }
        if self.focal_index.is_none() {
            self.host.lock_scroll();
        }
        self.reset_view();
        self.scheduler.resume();
        tracing::debug!(index, total = self.sequence.len(), "gallery opened");
        self.focus(index);
        Ok(())
    }

    /// Closes the gallery, resetting the view and releasing the host.
    ///
    /// Preloads already in flight still land in the cache; no new ones start.
    pub fn close(&mut self) {
        self.reset_view();
        self.scheduler.stop();
        if self.focal_index.take().is_some() {
            self.host.unlock_scroll();
            tracing::debug!("gallery closed");
        }
    }

    /// Moves to the next item. Returns `false` at the end or when closed.
    pub fn next(&mut self) -> bool {
        match self.focal_index {
            Some(index) if index + 1 < self.sequence.len() => {
                self.focus(index + 1);
                true
            }
            _ => false,
        }
    }

    /// Moves to the previous item. Returns `false` at the start or when closed.
    pub fn previous(&mut self) -> bool {
        match self.focal_index {
            Some(index) if index > 0 => {
                self.focus(index - 1);
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.focal_index.is_some()
    }

    #[must_use]
    pub fn focal_index(&self) -> Option<usize> {
        self.focal_index
    }

    #[must_use]
    pub fn current(&self) -> Option<&ResourceUri> {
        self.focal_index.and_then(|index| self.sequence.get(index))
    }

    #[must_use]
    pub fn sequence(&self) -> &[ResourceUri] {
        &self.sequence
    }

    #[must_use]
    pub fn lookahead(&self) -> Lookahead {
        self.lookahead
    }

    #[must_use]
    pub fn navigation_info(&self) -> NavigationInfo {
        let total_count = self.sequence.len();
        NavigationInfo {
            has_next: self.focal_index.is_some_and(|index| index + 1 < total_count),
            has_previous: self.focal_index.is_some_and(|index| index > 0),
            current_index: self.focal_index,
            total_count,
        }
    }

    // -------------------------------------------------------------------------
    // View transform
    // -------------------------------------------------------------------------

    pub fn zoom_in(&mut self) {
        self.scale = self.scale.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.scale = self.scale.zoom_out();
    }

    /// Rotates 90° clockwise.
    pub fn rotate(&mut self) {
        self.rotation = self.rotation.rotate_clockwise();
    }

    #[must_use]
    pub fn scale(&self) -> ZoomScale {
        self.scale
    }

    #[must_use]
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    #[must_use]
    pub fn view_transform(&self) -> ViewTransform {
        ViewTransform {
            scale: self.scale.value(),
            rotation_degrees: self.rotation.normalized(),
        }
    }

    // -------------------------------------------------------------------------
    // Preloading
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn cache(&self) -> &PreloadCache {
        &self.cache
    }

    /// Lends the session cache, e.g. to a lazy loader.
    pub fn cache_mut(&mut self) -> &mut PreloadCache {
        &mut self.cache
    }

    /// Ends the session and hands the cache to the caller.
    #[must_use]
    pub fn into_cache(mut self) -> PreloadCache {
        self.close();
        std::mem::take(&mut self.cache)
    }

    /// Records every preload that already completed, without waiting.
    pub fn absorb_preloads(&mut self) -> usize {
        self.scheduler.absorb_ready(&mut self.cache)
    }

    /// Waits for every preload in flight.
    pub async fn settle_preloads(&mut self) {
        self.scheduler.settle(&mut self.cache).await;
    }

    #[must_use]
    pub fn pending_preloads(&self) -> usize {
        self.scheduler.pending()
    }

    // -------------------------------------------------------------------------
    // Download
    // -------------------------------------------------------------------------

    /// Fetches the current item, serving preloaded bytes when available.
    ///
    /// Returns `Ok(None)` when the gallery is closed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fetch`] if the item has to be fetched and the fetch fails.
    pub async fn download_current(&mut self) -> Result<Option<Download>> {
        let Some(index) = self.focal_index else {
            return Ok(None);
        };
        let Some(source) = self.sequence.get(index).cloned() else {
            return Ok(None);
        };

        let bytes = match self.cache.lookup(&source) {
            Some(bytes) => bytes,
            None => {
                let fetch = self.fetcher.fetch(&source);
                match self.fetch_timeout {
                    Some(limit) => tokio::time::timeout(limit, fetch)
                        .await
                        .unwrap_or(Err(FetchError::Timeout(limit)))?,
                    None => fetch.await?,
                }
            }
        };

        let file_name = source
            .file_name()
            .filter(|name| *name != "." && *name != "..")
            .map_or_else(|| format!("resource-{index}"), str::to_string);
        tracing::debug!(%source, %file_name, bytes = bytes.len(), "download ready");
        Ok(Some(Download {
            source,
            file_name,
            bytes,
        }))
    }

    fn focus(&mut self, index: usize) {
        self.focal_index = Some(index);
        self.scheduler
            .schedule(&mut self.cache, &self.sequence, index, self.lookahead);
    }

    fn reset_view(&mut self) {
        self.scale = ZoomScale::default();
        self.rotation = Rotation::ZERO;
    }
}

impl Drop for GalleryNavigator {
    fn drop(&mut self) {
        if self.focal_index.is_some() {
            self.host.unlock_scroll();
        }
    }
}

impl std::fmt::Debug for GalleryNavigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GalleryNavigator")
            .field("len", &self.sequence.len())
            .field("focal_index", &self.focal_index)
            .field("scale", &self.scale)
            .field("rotation", &self.rotation)
            .field("lookahead", &self.lookahead)
            .field("cache", &self.cache)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}
