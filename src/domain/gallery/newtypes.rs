// SPDX-License-Identifier: MPL-2.0
//! Gallery newtypes.
//!
//! This module provides type-safe wrappers for gallery view values,
//! ensuring they are always within valid ranges.

use crate::config::{
    DEFAULT_PRELOAD_LOOKAHEAD, DEFAULT_ZOOM_SCALE, MAX_PRELOAD_LOOKAHEAD, MAX_ZOOM_SCALE,
    MIN_PRELOAD_LOOKAHEAD, MIN_ZOOM_SCALE, ROTATION_STEP_DEGREES, ZOOM_STEP_FACTOR,
};

// =============================================================================
// ZoomScale
// =============================================================================

/// Zoom multiplier, guaranteed to be within valid range (0.5–3.0).
///
/// Zooming is multiplicative: each step multiplies or divides by 1.2 and the
/// result is clamped.
///
/// # Example
///
/// ```
/// use gallery_loader::domain::gallery::ZoomScale;
///
/// let zoom = ZoomScale::default().zoom_in().zoom_in();
/// assert!((zoom.value() - 1.44).abs() < 1e-5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomScale(f32);

impl ZoomScale {
    /// Creates a new zoom scale, clamping the value to the valid range.
    ///
    /// NaN falls back to the default.
    #[must_use]
    pub fn new(scale: f32) -> Self {
        if scale.is_nan() {
            return Self::default();
        }
        Self(scale.clamp(MIN_ZOOM_SCALE, MAX_ZOOM_SCALE))
    }

    /// Returns the raw multiplier.
    #[must_use]
    pub fn value(self) -> f32 {
        self.0
    }

    /// Returns whether the zoom is at the minimum value.
    #[must_use]
    pub fn is_min(self) -> bool {
        self.0 <= MIN_ZOOM_SCALE
    }

    /// Returns whether the zoom is at the maximum value.
    #[must_use]
    pub fn is_max(self) -> bool {
        self.0 >= MAX_ZOOM_SCALE
    }

    /// Multiplies by the zoom step.
    #[must_use]
    pub fn zoom_in(self) -> Self {
        Self::new(self.0 * ZOOM_STEP_FACTOR)
    }

    /// Divides by the zoom step.
    #[must_use]
    pub fn zoom_out(self) -> Self {
        Self::new(self.0 / ZOOM_STEP_FACTOR)
    }
}

impl Default for ZoomScale {
    fn default() -> Self {
        Self(DEFAULT_ZOOM_SCALE)
    }
}

// =============================================================================
// Rotation
// =============================================================================

/// Accumulated rotation in degrees.
///
/// Unbounded: rotating four times yields 360, not 0. Only
/// [`Rotation::normalized`] folds the value into `0..360` for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rotation(i64);

impl Rotation {
    /// No rotation (0°).
    pub const ZERO: Self = Self(0);

    /// Creates a rotation, rounding down to a multiple of 90°.
    #[must_use]
    pub fn new(degrees: i64) -> Self {
        Self(degrees.div_euclid(ROTATION_STEP_DEGREES) * ROTATION_STEP_DEGREES)
    }

    /// Returns the accumulated angle in degrees.
    #[must_use]
    pub fn degrees(self) -> i64 {
        self.0
    }

    /// Returns the angle folded into `0..360`.
    #[must_use]
    pub fn normalized(self) -> u16 {
        // rem_euclid keeps the result in 0..360, which always fits in u16.
        u16::try_from(self.0.rem_euclid(360)).unwrap_or(0)
    }

    /// Rotates 90° clockwise.
    #[must_use]
    pub fn rotate_clockwise(self) -> Self {
        Self(self.0.saturating_add(ROTATION_STEP_DEGREES))
    }

    /// Returns true if the rendered angle is not zero.
    #[must_use]
    pub fn is_rotated(self) -> bool {
        self.normalized() != 0
    }
}

// =============================================================================
// Lookahead
// =============================================================================

/// Number of neighbors preloaded on each side of the focal item (0–10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookahead(usize);

impl Lookahead {
    /// Creates a new lookahead, clamping to valid range.
    #[must_use]
    pub fn new(value: usize) -> Self {
        Self(value.clamp(MIN_PRELOAD_LOOKAHEAD, MAX_PRELOAD_LOOKAHEAD))
    }

    #[must_use]
    pub fn value(self) -> usize {
        self.0
    }

    /// Returns true if preloading is effectively disabled.
    #[must_use]
    pub fn is_disabled(self) -> bool {
        self.0 == 0
    }
}

impl Default for Lookahead {
    fn default() -> Self {
        Self(DEFAULT_PRELOAD_LOOKAHEAD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_abs_diff_eq, F32_EPSILON};

    // -------------------------------------------------------------------------
    // ZoomScale tests
    // -------------------------------------------------------------------------

    #[test]
    fn zoom_clamps_to_valid_range() {
        assert_eq!(ZoomScale::new(0.1).value(), MIN_ZOOM_SCALE);
        assert_eq!(ZoomScale::new(10.0).value(), MAX_ZOOM_SCALE);
        assert_eq!(ZoomScale::new(f32::NAN).value(), DEFAULT_ZOOM_SCALE);
    }

    #[test]
    fn zoom_in_is_multiplicative() {
        let zoom = ZoomScale::default().zoom_in().zoom_in().zoom_in();
        assert_abs_diff_eq!(zoom.value(), 1.728, epsilon = 1e-4);
        let zoom = zoom.zoom_in();
        assert_abs_diff_eq!(zoom.value(), 2.0736, epsilon = 1e-4);
    }

    #[test]
    fn zoom_in_caps_at_max() {
        let mut zoom = ZoomScale::default();
        for _ in 0..20 {
            zoom = zoom.zoom_in();
        }
        assert!(zoom.is_max());
        assert_abs_diff_eq!(zoom.value(), MAX_ZOOM_SCALE, epsilon = F32_EPSILON);
    }

    #[test]
    fn zoom_out_floors_at_min() {
        let mut zoom = ZoomScale::default();
        for _ in 0..20 {
            zoom = zoom.zoom_out();
        }
        assert!(zoom.is_min());
    }

    #[test]
    fn zoom_out_undoes_zoom_in() {
        let zoom = ZoomScale::default().zoom_in().zoom_out();
        assert_abs_diff_eq!(zoom.value(), 1.0, epsilon = 1e-6);
    }

    // -------------------------------------------------------------------------
    // Rotation tests
    // -------------------------------------------------------------------------

    #[test]
    fn rotation_accumulates_without_wrapping() {
        let mut rotation = Rotation::ZERO;
        for _ in 0..5 {
            rotation = rotation.rotate_clockwise();
        }
        assert_eq!(rotation.degrees(), 450);
        assert_eq!(rotation.normalized(), 90);
    }

    #[test]
    fn rotation_new_rounds_to_quarter_turns() {
        assert_eq!(Rotation::new(45).degrees(), 0);
        assert_eq!(Rotation::new(90).degrees(), 90);
        assert_eq!(Rotation::new(-90).normalized(), 270);
        assert_eq!(Rotation::new(-45).degrees(), -90);
    }

    #[test]
    fn full_turn_is_not_rotated() {
        assert!(!Rotation::new(720).is_rotated());
        assert!(Rotation::new(180).is_rotated());
    }

    // -------------------------------------------------------------------------
    // Lookahead tests
    // -------------------------------------------------------------------------

    #[test]
    fn lookahead_clamps() {
        assert_eq!(Lookahead::new(100).value(), MAX_PRELOAD_LOOKAHEAD);
        assert!(Lookahead::new(0).is_disabled());
        assert_eq!(Lookahead::default().value(), DEFAULT_PRELOAD_LOOKAHEAD);
    }
}
