// SPDX-License-Identifier: MPL-2.0
//! Core loading types for the domain layer.
//!
//! These types represent pure data without any I/O dependencies.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Fetched resource bytes, shared between the cache and its consumers.
pub type Payload = Arc<Vec<u8>>;

/// Identifier of a tracked placeholder, chosen by the UI host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

impl ResourceId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for ResourceId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Location of a remote resource.
///
/// Treated as an opaque string: the fetcher decides how to interpret it.
/// Cloning is cheap (shared allocation).
///
/// # Example
///
/// ```
/// use gallery_loader::domain::loading::ResourceUri;
///
/// let uri = ResourceUri::from("https://cdn.example.com/cars/42.jpg");
/// assert_eq!(uri.as_str(), "https://cdn.example.com/cars/42.jpg");
/// assert_eq!(uri.file_name(), Some("42.jpg"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceUri(Arc<str>);

impl ResourceUri {
    #[must_use]
    pub fn new(uri: impl Into<Arc<str>>) -> Self {
        Self(uri.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the last path segment, without query string or fragment.
    ///
    /// Returns `None` when the path ends with a slash or is empty.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        let without_suffix = self
            .0
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let after_scheme = without_suffix
            .split_once("://")
            .map_or(without_suffix, |(_, rest)| {
                // Drop the authority so a bare host is not mistaken for a file.
                rest.split_once('/').map_or("", |(_, path)| path)
            });
        after_scheme
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
    }
}

impl From<&str> for ResourceUri {
    fn from(uri: &str) -> Self {
        Self(Arc::from(uri))
    }
}

impl From<String> for ResourceUri {
    fn from(uri: String) -> Self {
        Self(Arc::from(uri))
    }
}

impl Borrow<str> for ResourceUri {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ResourceUri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-resource loading state.
///
/// `Loaded` and `Failed` are terminal: only an explicit retry leaves them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResourceState {
    /// Mounted, not yet visible.
    #[default]
    Idle,
    /// Attempt `n` on the current source is in flight or waiting for its timer.
    Pending(u32),
    /// The given source was fetched successfully.
    Loaded(ResourceUri),
    /// Retries and fallback are exhausted.
    Failed,
}

impl ResourceState {
    /// Returns `true` for `Loaded` and `Failed`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, ResourceState::Loaded(_) | ResourceState::Failed)
    }

    /// Returns the attempt number while pending.
    #[must_use]
    pub fn attempt(&self) -> Option<u32> {
        match self {
            ResourceState::Pending(n) => Some(*n),
            _ => None,
        }
    }
}

/// A placeholder whose remote resource is loaded lazily.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedResource {
    pub id: ResourceId,
    pub primary_source: ResourceUri,
    pub fallback_source: Option<ResourceUri>,
    pub current_source: ResourceUri,
    pub state: ResourceState,
    pub attempt_count: u32,
}

impl TrackedResource {
    #[must_use]
    pub fn new(
        id: ResourceId,
        primary_source: ResourceUri,
        fallback_source: Option<ResourceUri>,
    ) -> Self {
        Self {
            id,
            current_source: primary_source.clone(),
            primary_source,
            fallback_source,
            state: ResourceState::Idle,
            attempt_count: 0,
        }
    }

    /// Returns the fallback source if it differs from the primary one.
    #[must_use]
    pub fn distinct_fallback(&self) -> Option<&ResourceUri> {
        self.fallback_source
            .as_ref()
            .filter(|fallback| **fallback != self.primary_source)
    }

    /// Returns `true` while the current source is the fallback.
    #[must_use]
    pub fn is_on_fallback(&self) -> bool {
        self.distinct_fallback() == Some(&self.current_source)
    }
}
