// SPDX-License-Identifier: MPL-2.0
//! Transcode newtypes.
//!
//! Unlike the clamped view values, transcode parameters are validated:
//! an out-of-range value is a caller error the encoder must reject.

use crate::config::{DEFAULT_MAX_DIMENSION, DEFAULT_QUALITY, MAX_MAX_DIMENSION};
use serde::{Deserialize, Serialize};

// =============================================================================
// Quality
// =============================================================================

/// Encoder quality in `(0, 1]`.
///
/// # Example
///
/// ```
/// use gallery_loader::domain::transcode::Quality;
///
/// assert_eq!(Quality::new(0.8).map(|q| q.as_percent()), Some(80));
/// assert!(Quality::new(0.0).is_none());
/// assert!(Quality::new(1.5).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quality(f32);

impl Quality {
    /// Returns `None` when `value` is NaN or outside `(0, 1]`.
    #[must_use]
    pub fn new(value: f32) -> Option<Self> {
        (value > 0.0 && value <= 1.0).then_some(Self(value))
    }

    #[must_use]
    pub fn value(self) -> f32 {
        self.0
    }

    /// Quality on the 1–100 scale used by lossy encoders.
    #[must_use]
    pub fn as_percent(self) -> u8 {
        // Value is in (0, 1], so the rounded product is in 0..=100.
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(DEFAULT_QUALITY)
    }
}

// =============================================================================
// MaxDimension
// =============================================================================

/// Bound on the longer edge of a transcoded image (1–16384 pixels).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxDimension(u32);

impl MaxDimension {
    /// Returns `None` for zero or values above the supported maximum.
    #[must_use]
    pub fn new(value: u32) -> Option<Self> {
        (value > 0 && value <= MAX_MAX_DIMENSION).then_some(Self(value))
    }

    #[must_use]
    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for MaxDimension {
    fn default() -> Self {
        Self(DEFAULT_MAX_DIMENSION)
    }
}

// =============================================================================
// ResampleFilter
// =============================================================================

/// Resampling filter used when shrinking.
///
/// `Bilinear` is the default: it is cheap and, for downscaling factors up to
/// about 2x, visually close to the heavier kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResampleFilter {
    Nearest,
    #[default]
    Bilinear,
    CatmullRom,
    Lanczos3,
}
