// SPDX-License-Identifier: MPL-2.0
//! Infrastructure layer adapters.
//!
//! This module contains concrete implementations of the port traits defined in
//! `application::port`.
//!
//! # Available Adapters
//!
//! - [`http`]: Resource fetching over HTTP(S) via `reqwest` (implements [`ResourceFetcher`])
//!
//! [`ResourceFetcher`]: crate::application::port::ResourceFetcher

pub mod http;

// Re-export main types for convenience
pub use http::HttpFetcher;
