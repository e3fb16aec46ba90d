// SPDX-License-Identifier: MPL-2.0
//! Port definitions (traits) for dependency inversion.
//!
//! This module defines abstract interfaces that infrastructure adapters implement.
//! These traits use only domain types, ensuring the loading pipeline remains
//! independent of concrete transports.
//!
//! # Available Ports
//!
//! - [`fetch`]: Remote resource fetching
//!
//! # Design Notes
//!
//! - All traits use domain types only (no `reqwest` types)
//! - Traits are `Send + Sync` so adapters can be shared behind an `Arc`
//! - Futures are boxed and `'static` so callers can hold many of them at once

pub mod fetch;

// Re-export main types for convenience
pub use fetch::{FetchFuture, ResourceFetcher};
