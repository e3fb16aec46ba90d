// SPDX-License-Identifier: MPL-2.0
//! Per-resource loading state machine with retry and fallback.
//!
//! The loader performs no I/O. Every input returns the [`LoaderAction`]s the
//! driver must carry out: start a fetch, arm or disarm the retry timer, or
//! publish an event. Each fetch and each timer carries a ticket; inputs with a
//! stale ticket are ignored, which makes late completions after `retry()` or
//! `cancel()` harmless.
//!
//! ```text
//! Idle ──visible──▶ Pending(1) ──ok──▶ Loaded(source)
//!                      │
//!                      └─err─▶ Pending(n+1) after base_delay * n   (n < max)
//!                          └─▶ Pending(1) on fallback, immediately (n == max)
//!                          └─▶ Failed                              (exhausted)
//! ```

use crate::domain::loading::{
    Payload, ResourceId, ResourceState, ResourceUri, RetryPolicy, TrackedResource,
};
use crate::error::{FetchError, LoadError};
use crate::media::prefetch::PreloadCache;
use std::time::Duration;

/// Notification surfaced to the UI host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderEvent {
    /// Emitted on every state transition.
    StateChanged { id: ResourceId, state: ResourceState },

    /// The resource is ready to render.
    ///
    /// `payload` is `None` when `source` was already loaded earlier in the
    /// session but its bytes are no longer retained by the preload cache; the
    /// host renders from `source` through its own cache.
    Loaded {
        id: ResourceId,
        source: ResourceUri,
        payload: Option<Payload>,
    },

    /// Retries and fallback are exhausted. Emitted at most once.
    Failed { id: ResourceId, error: LoadError },
}

impl LoaderEvent {
    #[must_use]
    pub fn id(&self) -> ResourceId {
        match self {
            LoaderEvent::StateChanged { id, .. }
            | LoaderEvent::Loaded { id, .. }
            | LoaderEvent::Failed { id, .. } => *id,
        }
    }
}

/// Command for the driver of a [`ResourceLoader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderAction {
    /// Start one network fetch; report it back with the same ticket.
    Fetch { ticket: u64, source: ResourceUri },

    /// Arm the retry timer; report it back with the same ticket.
    ScheduleRetry { ticket: u64, delay: Duration },

    /// Disarm the retry timer, if armed.
    CancelTimer,

    Emit(LoaderEvent),
}

/// State machine of one tracked resource.
#[derive(Debug, Clone)]
pub struct ResourceLoader {
    resource: TrackedResource,
    policy: RetryPolicy,
    ticket: u64,
    timer_armed: bool,
    network_attempts: u32,
    last_error: Option<FetchError>,
}

impl ResourceLoader {
    #[must_use]
    pub fn new(
        id: ResourceId,
        primary_source: ResourceUri,
        fallback_source: Option<ResourceUri>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            resource: TrackedResource::new(id, primary_source, fallback_source),
            policy,
            ticket: 0,
            timer_armed: false,
            network_attempts: 0,
            last_error: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> ResourceId {
        self.resource.id
    }

    #[must_use]
    pub fn state(&self) -> &ResourceState {
        &self.resource.state
    }

    #[must_use]
    pub fn resource(&self) -> &TrackedResource {
        &self.resource
    }

    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// The resource became visible. Only acts while `Idle`.
    pub fn on_visible(&mut self, cache: Option<&mut PreloadCache>) -> Vec<LoaderAction> {
        if self.resource.state != ResourceState::Idle {
            return Vec::new();
        }
        let mut actions = Vec::new();
        self.start_source(cache, true, &mut actions);
        actions
    }

    /// Reports the outcome of the fetch issued with `ticket`.
    pub fn on_fetch_complete(
        &mut self,
        ticket: u64,
        result: Result<Payload, FetchError>,
        cache: Option<&mut PreloadCache>,
    ) -> Vec<LoaderAction> {
        if ticket != self.ticket || self.timer_armed || self.resource.state.attempt().is_none() {
            tracing::trace!(id = %self.resource.id, ticket, "stale fetch completion ignored");
            return Vec::new();
        }
        let mut actions = Vec::new();
        match result {
            Ok(payload) => {
                if let Some(cache) = cache {
                    cache.record_loaded(&self.resource.current_source, payload.clone());
                }
                self.finish_loaded(Some(payload), &mut actions);
            }
            Err(error) => self.handle_failure(error, cache, &mut actions),
        }
        actions
    }

    /// Reports that the retry timer armed with `ticket` fired.
    pub fn on_timer(&mut self, ticket: u64) -> Vec<LoaderAction> {
        if ticket != self.ticket || !self.timer_armed {
            return Vec::new();
        }
        self.timer_armed = false;
        vec![self.fetch_action()]
    }

    /// Restarts loading from the primary source, whatever the current state.
    ///
    /// Always goes to the network so the outcome is `Pending(1)` on the primary
    /// source even if a preload already resolved it.
    pub fn retry(&mut self) -> Vec<LoaderAction> {
        let mut actions = Vec::new();
        if self.timer_armed {
            self.timer_armed = false;
            actions.push(LoaderAction::CancelTimer);
        }
        self.resource.attempt_count = 0;
        self.resource.current_source = self.resource.primary_source.clone();
        self.network_attempts = 0;
        self.last_error = None;
        tracing::debug!(id = %self.resource.id, "manual retry");
        self.start_source(None, false, &mut actions);
        actions
    }

    /// Invalidates any in-flight fetch and disarms the timer.
    ///
    /// The state is left as is; the driver drops the loader afterwards.
    pub fn cancel(&mut self) -> Vec<LoaderAction> {
        self.ticket += 1;
        if self.timer_armed {
            self.timer_armed = false;
            return vec![LoaderAction::CancelTimer];
        }
        Vec::new()
    }

    /// Enters `Pending(1)` on the current source, or `Loaded` on a cache hit.
    ///
    /// A hit is any URI the cache marks loaded, whether or not its bytes are
    /// still retained.
    fn start_source(
        &mut self,
        cache: Option<&mut PreloadCache>,
        consult_cache: bool,
        actions: &mut Vec<LoaderAction>,
    ) {
        if consult_cache {
            if let Some(cache) = cache.filter(|cache| cache.is_loaded(&self.resource.current_source)) {
                let payload = cache.lookup(&self.resource.current_source);
                tracing::debug!(
                    id = %self.resource.id,
                    source = %self.resource.current_source,
                    retained = payload.is_some(),
                    "served from preload cache"
                );
                self.finish_loaded(payload, actions);
                return;
            }
        }
        self.resource.attempt_count = 1;
        self.transition(ResourceState::Pending(1), actions);
        actions.push(self.fetch_action());
    }

    fn handle_failure(
        &mut self,
        error: FetchError,
        cache: Option<&mut PreloadCache>,
        actions: &mut Vec<LoaderAction>,
    ) {
        let attempt = self.resource.attempt_count;
        let id = self.resource.id;
        tracing::debug!(%id, attempt, source = %self.resource.current_source, %error, "fetch attempt failed");
        self.last_error = Some(error);

        if attempt < self.policy.max_attempts() {
            let delay = self.policy.delay_after(attempt);
            self.resource.attempt_count = attempt + 1;
            self.ticket += 1;
            self.timer_armed = true;
            tracing::debug!(%id, next_attempt = attempt + 1, ?delay, "retry scheduled");
            actions.push(LoaderAction::ScheduleRetry {
                ticket: self.ticket,
                delay,
            });
            self.transition(ResourceState::Pending(attempt + 1), actions);
            return;
        }

        if !self.resource.is_on_fallback() {
            if let Some(fallback) = self.resource.distinct_fallback().cloned() {
                tracing::info!(%id, %fallback, "switching to fallback source");
                self.resource.current_source = fallback;
                self.start_source(cache, true, actions);
                return;
            }
        }

        let last_error = self
            .last_error
            .take()
            .unwrap_or(FetchError::Request(String::from("no attempt recorded")));
        let error = LoadError::ExhaustedRetries {
            id,
            attempts: self.network_attempts,
            last_error,
        };
        tracing::warn!(%id, %error, "resource failed");
        self.transition(ResourceState::Failed, actions);
        actions.push(LoaderAction::Emit(LoaderEvent::Failed { id, error }));
    }

    fn finish_loaded(&mut self, payload: Option<Payload>, actions: &mut Vec<LoaderAction>) {
        let source = self.resource.current_source.clone();
        let bytes = payload.as_ref().map(|payload| payload.len());
        tracing::debug!(id = %self.resource.id, %source, ?bytes, "resource loaded");
        self.transition(ResourceState::Loaded(source.clone()), actions);
        actions.push(LoaderAction::Emit(LoaderEvent::Loaded {
            id: self.resource.id,
            source,
            payload,
        }));
    }

    fn fetch_action(&mut self) -> LoaderAction {
        self.ticket += 1;
        self.network_attempts += 1;
        LoaderAction::Fetch {
            ticket: self.ticket,
            source: self.resource.current_source.clone(),
        }
    }

    fn transition(&mut self, state: ResourceState, actions: &mut Vec<LoaderAction>) {
        self.resource.state = state.clone();
        actions.push(LoaderAction::Emit(LoaderEvent::StateChanged {
            id: self.resource.id,
            state,
        }));
    }
}
