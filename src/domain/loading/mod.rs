// SPDX-License-Identifier: MPL-2.0
//! Loading domain types.
//!
//! Identity, location and state of lazily loaded resources, plus the retry
//! parameters that govern them.

pub mod newtypes;
mod types;

pub use newtypes::{MaxAttempts, RetryPolicy};
pub use types::{Payload, ResourceId, ResourceState, ResourceUri, TrackedResource};
