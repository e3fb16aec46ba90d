// SPDX-License-Identifier: MPL-2.0
//! Gallery domain types.
//!
//! This module contains view-state value objects that are independent
//! of any presentation framework.

pub mod newtypes;

// Re-export commonly used types
pub use newtypes::{Lookahead, Rotation, ZoomScale};
