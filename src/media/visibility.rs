// SPDX-License-Identifier: MPL-2.0
//! One-shot visibility detection for placeholder regions.
//!
//! The host reports the viewport and region geometry; the detector fires each
//! subscription's notifier the first time its region reaches the threshold
//! inside the margin-expanded viewport, then retires it.
//!
//! # Usage
//!
//! ```
//! use gallery_loader::domain::loading::ResourceId;
//! use gallery_loader::domain::visibility::{Rect, VisibilityOptions};
//! use gallery_loader::media::visibility::{BoxedNotifier, VisibilityDetector};
//!
//! let mut detector: VisibilityDetector<BoxedNotifier> = VisibilityDetector::new();
//! let id = ResourceId::new(1);
//! detector
//!     .register(
//!         id,
//!         Rect::new(0.0, 900.0, 100.0, 100.0),
//!         Box::new(|id: ResourceId| println!("{id} is visible")),
//!         VisibilityOptions::new(0.5, 0.0),
//!     )
//!     .unwrap();
//!
//! assert!(detector.set_viewport(Rect::new(0.0, 0.0, 800.0, 600.0)).is_empty());
//! assert_eq!(detector.set_viewport(Rect::new(0.0, 500.0, 800.0, 600.0)), vec![id]);
//! ```

use crate::domain::loading::ResourceId;
use crate::domain::visibility::{Rect, VisibilityOptions};
use crate::error::RegistrationError;
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc::UnboundedSender;

/// Receiver of a one-shot "became visible" notification.
pub trait OnVisible {
    fn notify(self, id: ResourceId);
}

impl<F: FnOnce(ResourceId)> OnVisible for F {
    fn notify(self, id: ResourceId) {
        self(id);
    }
}

/// Forwards notifications into a channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier(pub UnboundedSender<ResourceId>);

impl OnVisible for ChannelNotifier {
    fn notify(self, id: ResourceId) {
        // A closed receiver means nobody is interested any more.
        let _ = self.0.send(id);
    }
}

/// Boxed closure notifier, the default for hosts without a channel.
pub type BoxedNotifier = Box<dyn FnOnce(ResourceId) + Send>;

struct Subscription<N> {
    region: Rect,
    options: VisibilityOptions,
    notifier: N,
}

impl<N> Subscription<N> {
    fn is_visible_in(&self, viewport: &Rect) -> bool {
        let window = viewport.expand(self.options.margin);
        self.region.touches(&window)
            && self
                .options
                .threshold
                .is_met_by(self.region.visible_fraction(&window))
    }
}

/// Tracks placeholder regions and fires their notifiers exactly once.
pub struct VisibilityDetector<N = BoxedNotifier> {
    viewport: Option<Rect>,
    subscriptions: HashMap<ResourceId, Subscription<N>>,
    fired: HashSet<ResourceId>,
    destroyed: HashSet<ResourceId>,
}

impl<N> Default for VisibilityDetector<N> {
    fn default() -> Self {
        Self {
            viewport: None,
            subscriptions: HashMap::new(),
            fired: HashSet::new(),
            destroyed: HashSet::new(),
        }
    }
}

impl<N: OnVisible> VisibilityDetector<N> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `region` under `id`.
    ///
    /// If a viewport is already known the region is evaluated immediately;
    /// returns `true` when it fired on registration.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::Destroyed`] if `id` was unregistered before
    /// - [`RegistrationError::AlreadyRegistered`] if `id` is subscribed or already fired
    pub fn register(
        &mut self,
        id: ResourceId,
        region: Rect,
        notifier: N,
        options: VisibilityOptions,
    ) -> Result<bool, RegistrationError> {
        if self.destroyed.contains(&id) {
            return Err(RegistrationError::Destroyed(id));
        }
        if self.subscriptions.contains_key(&id) || self.fired.contains(&id) {
            return Err(RegistrationError::AlreadyRegistered(id));
        }
        self.subscriptions.insert(
            id,
            Subscription {
                region,
                options,
                notifier,
            },
        );
        tracing::debug!(%id, "visibility subscription registered");
        Ok(self.evaluate(id))
    }

    /// Cancels the subscription of `id`; its notifier is dropped unfired.
    ///
    /// Unregistering a fired or already destroyed id is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::Unknown`] if `id` was never registered.
    pub fn unregister(&mut self, id: ResourceId) -> Result<(), RegistrationError> {
        if self.subscriptions.remove(&id).is_some() {
            tracing::debug!(%id, "visibility subscription cancelled");
        } else if !self.fired.contains(&id) && !self.destroyed.contains(&id) {
            return Err(RegistrationError::Unknown(id));
        }
        self.destroyed.insert(id);
        Ok(())
    }

    /// Moves the viewing window and returns the ids that fired, in id order.
    pub fn set_viewport(&mut self, viewport: Rect) -> Vec<ResourceId> {
        self.viewport = Some(viewport);
        let mut candidates: Vec<ResourceId> = self.subscriptions.keys().copied().collect();
        candidates.sort_unstable();
        candidates
            .into_iter()
            .filter(|id| self.evaluate(*id))
            .collect()
    }

    /// Moves a subscribed region; returns `true` if it fired.
    ///
    /// Updating an id that already fired is accepted and ignored.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::Destroyed`] if `id` was unregistered
    /// - [`RegistrationError::Unknown`] if `id` was never registered
    pub fn update_region(&mut self, id: ResourceId, region: Rect) -> Result<bool, RegistrationError> {
        if let Some(subscription) = self.subscriptions.get_mut(&id) {
            subscription.region = region;
            return Ok(self.evaluate(id));
        }
        if self.destroyed.contains(&id) {
            Err(RegistrationError::Destroyed(id))
        } else if self.fired.contains(&id) {
            Ok(false)
        } else {
            Err(RegistrationError::Unknown(id))
        }
    }

    /// Returns `true` while `id` waits to become visible.
    #[must_use]
    pub fn is_pending(&self, id: ResourceId) -> bool {
        self.subscriptions.contains_key(&id)
    }

    /// Returns `true` once `id` has fired.
    #[must_use]
    pub fn has_fired(&self, id: ResourceId) -> bool {
        self.fired.contains(&id)
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.subscriptions.len()
    }

    fn evaluate(&mut self, id: ResourceId) -> bool {
        let Some(viewport) = self.viewport else {
            return false;
        };
        let visible = self
            .subscriptions
            .get(&id)
            .is_some_and(|subscription| subscription.is_visible_in(&viewport));
        if !visible {
            return false;
        }
        let Some(subscription) = self.subscriptions.remove(&id) else {
            return false;
        };
        self.fired.insert(id);
        tracing::debug!(%id, "resource became visible");
        subscription.notifier.notify(id);
        true
    }
}
