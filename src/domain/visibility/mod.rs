// SPDX-License-Identifier: MPL-2.0
//! Visibility domain types.
//!
//! Geometry of placeholder regions and viewing windows, and the options
//! deciding when a region counts as visible.

pub mod newtypes;

pub use newtypes::{Rect, VisibilityOptions, VisibilityThreshold};
