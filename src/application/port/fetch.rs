// SPDX-License-Identifier: MPL-2.0
//! Resource fetching port definition.
//!
//! This module defines the [`ResourceFetcher`] trait, the network endpoint the
//! lazy loader and the preload scheduler draw bytes from. Infrastructure
//! adapters implement it (see [`HttpFetcher`]); tests plug in scripted fakes.
//!
//! [`HttpFetcher`]: crate::infrastructure::HttpFetcher

use crate::domain::loading::{Payload, ResourceUri};
use crate::error::FetchError;
use futures_util::future::BoxFuture;
use std::sync::Arc;

/// Future returned by [`ResourceFetcher::fetch`].
///
/// `'static` so it can be parked in a `FuturesUnordered` owned by the caller.
pub type FetchFuture = BoxFuture<'static, Result<Payload, FetchError>>;

/// Port for fetching remote binary resources.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; fetches may be polled from any
/// runtime worker.
///
/// # Example
///
/// ```ignore
/// use gallery_loader::application::port::ResourceFetcher;
/// use gallery_loader::domain::loading::ResourceUri;
///
/// async fn size_of(fetcher: &impl ResourceFetcher, uri: &ResourceUri) -> usize {
///     fetcher.fetch(uri).await.map(|bytes| bytes.len()).unwrap_or(0)
/// }
/// ```
pub trait ResourceFetcher: Send + Sync {
    /// Starts one fetch attempt for `uri`.
    ///
    /// The returned future performs a single attempt; retrying is the
    /// caller's business.
    ///
    /// # Errors
    ///
    /// The future resolves to a [`FetchError`] if the transport fails, the
    /// endpoint answers with a non-success status or the body cannot be read.
    fn fetch(&self, uri: &ResourceUri) -> FetchFuture;
}

impl<T: ResourceFetcher + ?Sized> ResourceFetcher for Arc<T> {
    fn fetch(&self, uri: &ResourceUri) -> FetchFuture {
        (**self).fetch(uri)
    }
}

impl<T: ResourceFetcher + ?Sized> ResourceFetcher for Box<T> {
    fn fetch(&self, uri: &ResourceUri) -> FetchFuture {
        (**self).fetch(uri)
    }
}
