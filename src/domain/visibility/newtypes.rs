// SPDX-License-Identifier: MPL-2.0
//! Visibility newtypes.

use crate::config::{
    DEFAULT_VISIBILITY_MARGIN, DEFAULT_VISIBILITY_THRESHOLD, MAX_VISIBILITY_THRESHOLD,
    MIN_VISIBILITY_THRESHOLD,
};

// =============================================================================
// Rect
// =============================================================================

/// Axis-aligned rectangle in host coordinates.
///
/// Negative sizes are normalized to zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[must_use]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[must_use]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Grows the rectangle by `margin` on every side.
    #[must_use]
    pub fn expand(&self, margin: f32) -> Self {
        let margin = margin.max(0.0);
        Self::new(
            self.x - margin,
            self.y - margin,
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }

    /// Returns `true` if the rectangles overlap or share an edge.
    #[must_use]
    pub fn touches(&self, other: &Rect) -> bool {
        self.x <= other.right()
            && other.x <= self.right()
            && self.y <= other.bottom()
            && other.y <= self.bottom()
    }

    /// Returns the overlapping area, or `None` if the rectangles are apart.
    #[must_use]
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.touches(other) {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Some(Rect::new(x, y, right - x, bottom - y))
    }

    /// Fraction of `self` lying inside `window`, in `[0, 1]`.
    ///
    /// A zero-area region counts as fully visible when it lies inside the window.
    #[must_use]
    pub fn visible_fraction(&self, window: &Rect) -> f32 {
        let Some(overlap) = self.intersection(window) else {
            return 0.0;
        };
        let area = self.area();
        if area <= 0.0 {
            return 1.0;
        }
        (overlap.area() / area).clamp(0.0, 1.0)
    }
}

// =============================================================================
// VisibilityThreshold
// =============================================================================

/// Fraction of a region that must be inside the window, clamped to `[0, 1]`.
///
/// `0` means "any intersection", `1` means "fully inside".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityThreshold(f32);

impl VisibilityThreshold {
    /// Creates a new threshold, clamping the value to the valid range.
    ///
    /// NaN falls back to the default.
    #[must_use]
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::default();
        }
        Self(value.clamp(MIN_VISIBILITY_THRESHOLD, MAX_VISIBILITY_THRESHOLD))
    }

    #[must_use]
    pub fn value(self) -> f32 {
        self.0
    }

    /// Returns whether `fraction` meets this threshold.
    #[must_use]
    pub fn is_met_by(self, fraction: f32) -> bool {
        fraction >= self.0
    }
}

impl Default for VisibilityThreshold {
    fn default() -> Self {
        Self(DEFAULT_VISIBILITY_THRESHOLD)
    }
}

// =============================================================================
// VisibilityOptions
// =============================================================================

/// Options of one visibility subscription.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityOptions {
    pub threshold: VisibilityThreshold,
    /// Pixels added around the viewing window on every side.
    pub margin: f32,
}

impl VisibilityOptions {
    #[must_use]
    pub fn new(threshold: f32, margin: f32) -> Self {
        Self {
            threshold: VisibilityThreshold::new(threshold),
            margin: if margin.is_finite() { margin.max(0.0) } else { 0.0 },
        }
    }
}

impl Default for VisibilityOptions {
    fn default() -> Self {
        Self {
            threshold: VisibilityThreshold::default(),
            margin: DEFAULT_VISIBILITY_MARGIN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::assert_abs_diff_eq;

    #[test]
    fn negative_size_is_normalized() {
        let rect = Rect::new(0.0, 0.0, -5.0, 10.0);
        assert_eq!(rect.width, 0.0);
        assert_eq!(rect.area(), 0.0);
    }

    #[test]
    fn expand_grows_every_side() {
        let rect = Rect::new(10.0, 10.0, 100.0, 50.0).expand(5.0);
        assert_eq!(rect, Rect::new(5.0, 5.0, 110.0, 60.0));
    }

    #[test]
    fn half_overlap_has_half_fraction() {
        let window = Rect::new(0.0, 0.0, 100.0, 100.0);
        let region = Rect::new(50.0, 0.0, 100.0, 100.0);
        assert_abs_diff_eq!(region.visible_fraction(&window), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn disjoint_rects_have_zero_fraction() {
        let window = Rect::new(0.0, 0.0, 100.0, 100.0);
        let region = Rect::new(200.0, 200.0, 10.0, 10.0);
        assert!(!region.touches(&window));
        assert_eq!(region.visible_fraction(&window), 0.0);
    }

    #[test]
    fn edge_contact_counts_as_touching() {
        let window = Rect::new(0.0, 0.0, 100.0, 100.0);
        let region = Rect::new(100.0, 0.0, 10.0, 10.0);
        assert!(region.touches(&window));
        assert_eq!(region.visible_fraction(&window), 0.0);
    }

    #[test]
    fn zero_area_region_inside_window_is_visible() {
        let window = Rect::new(0.0, 0.0, 100.0, 100.0);
        let region = Rect::new(10.0, 10.0, 0.0, 0.0);
        assert_eq!(region.visible_fraction(&window), 1.0);
    }

    #[test]
    fn threshold_clamps_and_rejects_nan() {
        assert_eq!(VisibilityThreshold::new(-1.0).value(), 0.0);
        assert_eq!(VisibilityThreshold::new(2.0).value(), 1.0);
        assert_eq!(
            VisibilityThreshold::new(f32::NAN).value(),
            DEFAULT_VISIBILITY_THRESHOLD
        );
    }

    #[test]
    fn options_normalize_margin() {
        let options = VisibilityOptions::new(0.5, -10.0);
        assert_eq!(options.margin, 0.0);
        let options = VisibilityOptions::new(0.5, f32::INFINITY);
        assert_eq!(options.margin, 0.0);
    }
}
