// SPDX-License-Identifier: MPL-2.0
//! HTTP adapter implementing the [`ResourceFetcher`] port with `reqwest`.
//!
//! Each call issues one `GET`. Non-success statuses map to
//! [`FetchError::Status`], transport failures to [`FetchError::Request`] and
//! interrupted or oversized bodies to [`FetchError::Body`]. Per-attempt
//! timeouts are applied by the callers, not here, so the same deadline governs
//! every adapter.

use crate::application::port::{FetchFuture, ResourceFetcher};
use crate::config::{DEFAULT_MAX_BODY_BYTES, MAX_BODY_PREALLOC_BYTES};
use crate::domain::loading::ResourceUri;
use crate::error::{Error, FetchError, Result};
use futures_util::{FutureExt, StreamExt};
use std::sync::Arc;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("GalleryLoader/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects followed per request.
const MAX_REDIRECTS: usize = 10;

/// Fetches resources over HTTP(S).
///
/// Cloning is cheap: the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    /// Builds a fetcher with an explicit redirect policy and user agent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fetch`] if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Fetch(FetchError::Request(e.to_string())))?;
        Ok(Self::with_client(client))
    }

    /// Wraps an already configured client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Sets the largest body accepted; longer responses fail with
    /// [`FetchError::Body`].
    #[must_use]
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    #[must_use]
    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }
}

fn body_too_large(limit: usize) -> FetchError {
    FetchError::Body(format!("body exceeds {limit} bytes"))
}

impl ResourceFetcher for HttpFetcher {
    fn fetch(&self, uri: &ResourceUri) -> FetchFuture {
        let client = self.client.clone();
        let limit = self.max_body_bytes;
        let uri = uri.clone();
        async move {
            tracing::debug!(%uri, "http fetch");
            let response = client
                .get(uri.as_str())
                .send()
                .await
                .map_err(|e| FetchError::Request(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                tracing::debug!(%uri, status = status.as_u16(), "http fetch rejected");
                return Err(FetchError::Status(status.as_u16()));
            }

            // The header is untrusted: reject what cannot fit, reserve at most a little.
            let declared = response.content_length().unwrap_or(0);
            if declared > limit as u64 {
                tracing::debug!(%uri, declared, limit, "http body too large");
                return Err(body_too_large(limit));
            }
            let mut body = Vec::with_capacity(
                usize::try_from(declared).map_or(0, |len| len.min(MAX_BODY_PREALLOC_BYTES)),
            );
            let mut stream = response.bytes_stream();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| FetchError::Body(e.to_string()))?;
                if body.len() + chunk.len() > limit {
                    tracing::debug!(%uri, limit, "http body too large");
                    return Err(body_too_large(limit));
                }
                body.extend_from_slice(&chunk);
            }

            tracing::debug!(%uri, bytes = body.len(), "http fetch complete");
            Ok(Arc::new(body))
        }
        .boxed()
    }
}
