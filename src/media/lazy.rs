// SPDX-License-Identifier: MPL-2.0
//! Lazy loading driver.
//!
//! [`LazyLoader`] glues the visibility detector, one [`ResourceLoader`] per
//! tracked placeholder, a [`TimerQueue`] and a [`ResourceFetcher`] together.
//! It runs on the caller's task: fetches are held in a `FuturesUnordered` and
//! only make progress while the host awaits [`LazyLoader::next_event`].
//!
//! When a [`PreloadCache`] is lent, fetches are published in it: a URI already
//! being preloaded is joined rather than requested twice.
//!
//! # Usage
//!
//! ```ignore
//! let mut lazy = LazyLoader::from_config(HttpFetcher::new()?, &config);
//! lazy.track(id, primary, Some(fallback), placeholder_rect, None, None)?;
//! lazy.set_viewport(viewport, None);
//!
//! while let Some(event) = lazy.next_event(None).await {
//!     match event {
//!         LoaderEvent::Loaded { id, source, payload } => render(id, source, payload),
//!         LoaderEvent::Failed { id, error } => show_error(id, error),
//!         LoaderEvent::StateChanged { .. } => {}
//!     }
//! }
//! ```

use crate::application::port::ResourceFetcher;
use crate::config::Config;
use crate::domain::loading::{
    Payload, ResourceId, ResourceState, ResourceUri, RetryPolicy, TrackedResource,
};
use crate::domain::visibility::{Rect, VisibilityOptions};
use crate::error::{FetchError, RegistrationError};
use crate::media::loader::{LoaderAction, LoaderEvent, ResourceLoader};
use crate::media::prefetch::{PreloadCache, SharedFetch};
use crate::media::timer::{TimerId, TimerQueue};
use crate::media::visibility::{ChannelNotifier, VisibilityDetector};
use futures_util::future::BoxFuture;
use futures_util::stream::FuturesUnordered;
use futures_util::{FutureExt, StreamExt};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::Instant;

struct FetchOutcome {
    id: ResourceId,
    ticket: u64,
    source: ResourceUri,
    shared: Option<SharedFetch>,
    result: Result<Payload, FetchError>,
}

/// Retry timer payload: `(resource, ticket)`.
type RetryTimer = (ResourceId, u64);

/// Drives lazily loaded resources from visibility to their terminal state.
pub struct LazyLoader {
    fetcher: Arc<dyn ResourceFetcher>,
    policy: RetryPolicy,
    fetch_timeout: Option<Duration>,
    visibility_options: VisibilityOptions,
    visibility: VisibilityDetector<ChannelNotifier>,
    visible_tx: UnboundedSender<ResourceId>,
    visible_rx: UnboundedReceiver<ResourceId>,
    loaders: HashMap<ResourceId, ResourceLoader>,
    timers: TimerQueue<RetryTimer>,
    armed: HashMap<ResourceId, TimerId>,
    fetches: FuturesUnordered<BoxFuture<'static, FetchOutcome>>,
    events: VecDeque<LoaderEvent>,
    origin: Instant,
}

impl LazyLoader {
    /// Creates a driver; `fetch_timeout` bounds every attempt when set.
    pub fn new(
        fetcher: impl ResourceFetcher + 'static,
        policy: RetryPolicy,
        fetch_timeout: Option<Duration>,
    ) -> Self {
        let (visible_tx, visible_rx) = mpsc::unbounded_channel();
        Self {
            fetcher: Arc::new(fetcher),
            policy,
            fetch_timeout,
            visibility_options: VisibilityOptions::default(),
            visibility: VisibilityDetector::new(),
            visible_tx,
            visible_rx,
            loaders: HashMap::new(),
            timers: TimerQueue::new(),
            armed: HashMap::new(),
            fetches: FuturesUnordered::new(),
            events: VecDeque::new(),
            origin: Instant::now(),
        }
    }

    /// Creates a driver using the retry policy, timeout and visibility
    /// window of `config`.
    pub fn from_config(fetcher: impl ResourceFetcher + 'static, config: &Config) -> Self {
        Self::new(fetcher, config.retry_policy(), config.fetch_timeout())
            .with_visibility_options(config.visibility_options())
    }

    /// Sets the threshold and margin used by [`track`](Self::track) when it
    /// is given no options.
    #[must_use]
    pub fn with_visibility_options(mut self, options: VisibilityOptions) -> Self {
        self.visibility_options = options;
        self
    }

    #[must_use]
    pub fn visibility_options(&self) -> VisibilityOptions {
        self.visibility_options
    }

    /// Starts tracking a placeholder.
    ///
    /// Nothing is fetched until the region becomes visible. Passing `None` as
    /// `options` uses the driver's [`visibility_options`](Self::visibility_options).
    ///
    /// # Errors
    ///
    /// Returns a [`RegistrationError`] if `id` is tracked, was tracked before
    /// or was untracked.
    pub fn track(
        &mut self,
        id: ResourceId,
        primary_source: ResourceUri,
        fallback_source: Option<ResourceUri>,
        region: Rect,
        options: impl Into<Option<VisibilityOptions>>,
        cache: Option<&mut PreloadCache>,
    ) -> Result<(), RegistrationError> {
        let options = options.into().unwrap_or(self.visibility_options);
        if self.loaders.contains_key(&id) {
            return Err(RegistrationError::AlreadyRegistered(id));
        }
        // Insert first: registration may fire immediately.
        self.loaders.insert(
            id,
            ResourceLoader::new(id, primary_source, fallback_source, self.policy),
        );
        let registered = self.visibility.register(
            id,
            region,
            ChannelNotifier(self.visible_tx.clone()),
            options,
        );
        if let Err(error) = registered {
            self.loaders.remove(&id);
            return Err(error);
        }
        self.drain_visible(cache);
        Ok(())
    }

    /// Stops tracking a placeholder and cancels its retry timer.
    ///
    /// Results of fetches still in flight are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::Unknown`] if `id` was never tracked.
    pub fn untrack(&mut self, id: ResourceId) -> Result<(), RegistrationError> {
        self.visibility.unregister(id)?;
        if let Some(mut loader) = self.loaders.remove(&id) {
            let actions = loader.cancel();
            self.apply(id, actions, None);
            tracing::debug!(%id, "resource untracked");
        }
        Ok(())
    }

    /// Moves the viewing window.
    pub fn set_viewport(&mut self, viewport: Rect, cache: Option<&mut PreloadCache>) {
        self.visibility.set_viewport(viewport);
        self.drain_visible(cache);
    }

    /// Moves a tracked placeholder.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistrationError`] if `id` is not tracked.
    pub fn update_region(
        &mut self,
        id: ResourceId,
        region: Rect,
        cache: Option<&mut PreloadCache>,
    ) -> Result<(), RegistrationError> {
        self.visibility.update_region(id, region)?;
        self.drain_visible(cache);
        Ok(())
    }

    /// Restarts loading of `id` from its primary source.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::Unknown`] if `id` is not tracked.
    pub fn retry(&mut self, id: ResourceId) -> Result<(), RegistrationError> {
        let loader = self
            .loaders
            .get_mut(&id)
            .ok_or(RegistrationError::Unknown(id))?;
        let actions = loader.retry();
        self.apply(id, actions, None);
        Ok(())
    }

    #[must_use]
    pub fn state(&self, id: ResourceId) -> Option<&ResourceState> {
        self.loaders.get(&id).map(ResourceLoader::state)
    }

    #[must_use]
    pub fn resource(&self, id: ResourceId) -> Option<&TrackedResource> {
        self.loaders.get(&id).map(ResourceLoader::resource)
    }

    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.loaders.len()
    }

    /// Returns `true` when no event is queued and nothing is in flight or armed.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.events.is_empty() && self.fetches.is_empty() && self.timers.is_empty()
    }

    /// Pops an already queued event without waiting.
    pub fn try_next_event(&mut self) -> Option<LoaderEvent> {
        self.events.pop_front()
    }

    /// Waits for the next event.
    ///
    /// Drives in-flight fetches and retry timers while waiting. Returns `None`
    /// once the driver is idle.
    pub async fn next_event(&mut self, mut cache: Option<&mut PreloadCache>) -> Option<LoaderEvent> {
        loop {
            if let Some(event) = self.events.pop_front() {
                return Some(event);
            }
            if self.fetches.is_empty() && self.timers.is_empty() {
                return None;
            }

            let deadline = self.timers.next_deadline().map(|at| self.origin + at);
            let sleep_until = deadline.unwrap_or_else(Instant::now);
            let has_deadline = deadline.is_some();
            let has_fetches = !self.fetches.is_empty();

            let completed = tokio::select! {
                Some(outcome) = self.fetches.next(), if has_fetches => Some(outcome),
                () = tokio::time::sleep_until(sleep_until), if has_deadline => None,
                else => None,
            };

            match completed {
                Some(outcome) => self.complete(outcome, cache.as_deref_mut()),
                None => self.fire_due_timers(cache.as_deref_mut()),
            }
        }
    }

    /// Drives everything to completion and returns the events in order.
    pub async fn run_until_idle(&mut self, mut cache: Option<&mut PreloadCache>) -> Vec<LoaderEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next_event(cache.as_deref_mut()).await {
            events.push(event);
        }
        events
    }

    fn now(&self) -> Duration {
        Instant::now().saturating_duration_since(self.origin)
    }

    fn drain_visible(&mut self, mut cache: Option<&mut PreloadCache>) {
        while let Ok(id) = self.visible_rx.try_recv() {
            let Some(loader) = self.loaders.get_mut(&id) else {
                continue;
            };
            let actions = loader.on_visible(cache.as_deref_mut());
            self.apply(id, actions, cache.as_deref_mut());
        }
    }

    fn complete(&mut self, outcome: FetchOutcome, mut cache: Option<&mut PreloadCache>) {
        let FetchOutcome {
            id,
            ticket,
            source,
            shared,
            result,
        } = outcome;
        // A published fetch settles in the cache even if its loader moved on.
        if let (Some(cache), Some(shared)) = (cache.as_deref_mut(), shared.as_ref()) {
            match &result {
                Ok(payload) => {
                    cache.record_loaded(&source, Arc::clone(payload));
                }
                Err(_) => cache.abandon(&source, shared),
            }
        }
        let Some(loader) = self.loaders.get_mut(&id) else {
            tracing::trace!(%id, "completion for untracked resource dropped");
            return;
        };
        let actions = loader.on_fetch_complete(ticket, result, cache.as_deref_mut());
        self.apply(id, actions, cache);
    }

    fn fire_due_timers(&mut self, mut cache: Option<&mut PreloadCache>) {
        for (id, ticket) in self.timers.pop_due(self.now()) {
            self.armed.remove(&id);
            let Some(loader) = self.loaders.get_mut(&id) else {
                continue;
            };
            let actions = loader.on_timer(ticket);
            self.apply(id, actions, cache.as_deref_mut());
        }
    }

    fn apply(
        &mut self,
        id: ResourceId,
        actions: Vec<LoaderAction>,
        mut cache: Option<&mut PreloadCache>,
    ) {
        for action in actions {
            match action {
                LoaderAction::Fetch { ticket, source } => {
                    self.spawn_fetch(id, ticket, source, cache.as_deref_mut());
                }
                LoaderAction::ScheduleRetry { ticket, delay } => {
                    let timer = self.timers.schedule(self.now(), delay, (id, ticket));
                    if let Some(previous) = self.armed.insert(id, timer) {
                        self.timers.cancel(previous);
                    }
                }
                LoaderAction::CancelTimer => {
                    if let Some(timer) = self.armed.remove(&id) {
                        self.timers.cancel(timer);
                    }
                }
                LoaderAction::Emit(event) => self.events.push_back(event),
            }
        }
    }

    /// Issues the fetch, joining or publishing it in `cache` while the URI is
    /// unresolved there.
    fn spawn_fetch(
        &mut self,
        id: ResourceId,
        ticket: u64,
        source: ResourceUri,
        cache: Option<&mut PreloadCache>,
    ) {
        let shared = match cache {
            Some(cache) if !cache.is_loaded(&source) && !cache.is_failed(&source) => {
                Some(match cache.join(&source) {
                    Some(running) => {
                        tracing::debug!(%id, %source, "joining in-flight fetch");
                        running
                    }
                    None => cache.begin_shared(&source, self.fetcher.fetch(&source)),
                })
            }
            _ => None,
        };
        let fetch = match &shared {
            Some(shared) => shared.clone().boxed(),
            None => self.fetcher.fetch(&source),
        };
        let timeout = self.fetch_timeout;
        self.fetches.push(
            async move {
                let result = match timeout {
                    Some(limit) => tokio::time::timeout(limit, fetch)
                        .await
                        .unwrap_or(Err(FetchError::Timeout(limit))),
                    None => fetch.await,
                };
                FetchOutcome {
                    id,
                    ticket,
                    source,
                    shared,
                    result,
                }
            }
            .boxed(),
        );
    }
}

impl std::fmt::Debug for LazyLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyLoader")
            .field("policy", &self.policy)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("tracked", &self.loaders.len())
            .field("pending_visibility", &self.visibility.pending_count())
            .field("in_flight", &self.fetches.len())
            .field("armed_timers", &self.timers.len())
            .field("queued_events", &self.events.len())
            .finish_non_exhaustive()
    }
}
