// SPDX-License-Identifier: MPL-2.0
//! Domain layer - Core types with no I/O.
//!
//! This module contains pure domain types, value objects, and business rules.
//! Apart from `serde` derives on configuration-facing enums, it depends on
//! nothing but `std` to ensure testability.
//!
//! # Modules
//!
//! - [`gallery`]: View values ([`ZoomScale`](gallery::ZoomScale),
//!   [`Rotation`](gallery::Rotation), [`Lookahead`](gallery::Lookahead))
//! - [`loading`]: Resource identity and state ([`ResourceUri`](loading::ResourceUri),
//!   [`ResourceState`](loading::ResourceState), [`RetryPolicy`](loading::RetryPolicy))
//! - [`transcode`]: Encoder parameters ([`Quality`](transcode::Quality),
//!   [`MaxDimension`](transcode::MaxDimension))
//! - [`visibility`]: Geometry and thresholds ([`Rect`](visibility::Rect),
//!   [`VisibilityOptions`](visibility::VisibilityOptions))

pub mod gallery;
pub mod loading;
pub mod transcode;
pub mod visibility;
