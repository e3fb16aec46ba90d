// SPDX-License-Identifier: MPL-2.0
//! Transcode domain types.

pub mod newtypes;

pub use newtypes::{MaxDimension, Quality, ResampleFilter};
