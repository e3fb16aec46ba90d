// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for all configuration constants.
//!
//! This module serves as the single source of truth for default values
//! used across the crate. Constants are organized by category.
//!
//! # Categories
//!
//! - **Loading**: Retry attempts, backoff and per-attempt timeout
//! - **Visibility**: Threshold and margin of the viewing window
//! - **Preload**: Lookahead and payload cache budget
//! - **Transcode**: Maximum dimension and quality for uploads
//! - **Gallery**: Zoom bounds and rotation step

// ==========================================================================
// Loading Defaults
// ==========================================================================

/// Default number of attempts per source before giving up on it.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Minimum attempts per source.
pub const MIN_MAX_ATTEMPTS: u32 = 1;

/// Maximum attempts per source.
pub const MAX_MAX_ATTEMPTS: u32 = 10;

/// Default base delay for linear backoff (in milliseconds).
pub const DEFAULT_BASE_DELAY_MS: u64 = 1_000;

/// Maximum base delay (in milliseconds).
pub const MAX_BASE_DELAY_MS: u64 = 60_000;

/// Default per-attempt fetch timeout (in milliseconds). `0` disables it.
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 30_000;

/// Largest response body the HTTP fetcher accepts (64 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Upper bound on the buffer reserved from a `Content-Length` header (1 MiB).
pub const MAX_BODY_PREALLOC_BYTES: usize = 1024 * 1024;

// ==========================================================================
// Visibility Defaults
// ==========================================================================

/// Default fraction of a region that must be inside the window.
pub const DEFAULT_VISIBILITY_THRESHOLD: f32 = 0.1;

/// Minimum visibility threshold (any intersection).
pub const MIN_VISIBILITY_THRESHOLD: f32 = 0.0;

/// Maximum visibility threshold (fully visible).
pub const MAX_VISIBILITY_THRESHOLD: f32 = 1.0;

/// Default margin added around the viewing window (in pixels).
pub const DEFAULT_VISIBILITY_MARGIN: f32 = 50.0;

// ==========================================================================
// Preload Defaults
// ==========================================================================

/// Default number of neighbors to preload in each direction.
pub const DEFAULT_PRELOAD_LOOKAHEAD: usize = 2;

/// Minimum lookahead (`0` disables preloading).
pub const MIN_PRELOAD_LOOKAHEAD: usize = 0;

/// Maximum lookahead.
pub const MAX_PRELOAD_LOOKAHEAD: usize = 10;

/// Default payload cache size in bytes (32 MB).
pub const DEFAULT_PRELOAD_CACHE_BYTES: usize = 32 * 1024 * 1024;

/// Minimum payload cache size in bytes (8 MB).
pub const MIN_PRELOAD_CACHE_BYTES: usize = 8 * 1024 * 1024;

/// Maximum payload cache size in bytes (128 MB).
pub const MAX_PRELOAD_CACHE_BYTES: usize = 128 * 1024 * 1024;

/// Default maximum number of retained payloads.
pub const DEFAULT_MAX_CACHED_PAYLOADS: usize = 16;

/// Minimum number of retained payloads.
pub const MIN_MAX_CACHED_PAYLOADS: usize = 4;

/// Maximum number of retained payloads.
pub const MAX_MAX_CACHED_PAYLOADS: usize = 64;

// ==========================================================================
// Transcode Defaults
// ==========================================================================

/// Default bound on the longer edge of an uploaded image.
pub const DEFAULT_MAX_DIMENSION: u32 = 1920;

/// Largest accepted bound on the longer edge.
pub const MAX_MAX_DIMENSION: u32 = 16_384;

/// Default encoder quality in `(0, 1]`.
pub const DEFAULT_QUALITY: f32 = 0.8;

// ==========================================================================
// Gallery Defaults
// ==========================================================================

/// Zoom scale when the gallery opens.
pub const DEFAULT_ZOOM_SCALE: f32 = 1.0;

/// Minimum zoom scale.
pub const MIN_ZOOM_SCALE: f32 = 0.5;

/// Maximum zoom scale.
pub const MAX_ZOOM_SCALE: f32 = 3.0;

/// Multiplicative zoom step.
pub const ZOOM_STEP_FACTOR: f32 = 1.2;

/// Degrees added by one rotation.
pub const ROTATION_STEP_DEGREES: i64 = 90;

// ==========================================================================
// Compile-time Validation
// ==========================================================================

const _: () = {
    // Loading validation
    assert!(MIN_MAX_ATTEMPTS > 0);
    assert!(MAX_MAX_ATTEMPTS >= MIN_MAX_ATTEMPTS);
    assert!(DEFAULT_MAX_ATTEMPTS >= MIN_MAX_ATTEMPTS);
    assert!(DEFAULT_MAX_ATTEMPTS <= MAX_MAX_ATTEMPTS);
    assert!(DEFAULT_BASE_DELAY_MS <= MAX_BASE_DELAY_MS);
    assert!(MAX_BODY_PREALLOC_BYTES <= DEFAULT_MAX_BODY_BYTES);

    // Visibility validation
    assert!(MIN_VISIBILITY_THRESHOLD >= 0.0);
    assert!(MAX_VISIBILITY_THRESHOLD <= 1.0);
    assert!(DEFAULT_VISIBILITY_THRESHOLD >= MIN_VISIBILITY_THRESHOLD);
    assert!(DEFAULT_VISIBILITY_THRESHOLD <= MAX_VISIBILITY_THRESHOLD);
    assert!(DEFAULT_VISIBILITY_MARGIN >= 0.0);

    // Preload validation
    assert!(MAX_PRELOAD_LOOKAHEAD >= MIN_PRELOAD_LOOKAHEAD);
    assert!(DEFAULT_PRELOAD_LOOKAHEAD <= MAX_PRELOAD_LOOKAHEAD);
    assert!(MIN_PRELOAD_CACHE_BYTES > 0);
    assert!(MAX_PRELOAD_CACHE_BYTES >= MIN_PRELOAD_CACHE_BYTES);
    assert!(DEFAULT_PRELOAD_CACHE_BYTES >= MIN_PRELOAD_CACHE_BYTES);
    assert!(DEFAULT_PRELOAD_CACHE_BYTES <= MAX_PRELOAD_CACHE_BYTES);
    assert!(MIN_MAX_CACHED_PAYLOADS > 0);
    assert!(DEFAULT_MAX_CACHED_PAYLOADS >= MIN_MAX_CACHED_PAYLOADS);
    assert!(DEFAULT_MAX_CACHED_PAYLOADS <= MAX_MAX_CACHED_PAYLOADS);

    // Transcode validation
    assert!(DEFAULT_MAX_DIMENSION > 0);
    assert!(DEFAULT_MAX_DIMENSION <= MAX_MAX_DIMENSION);
    assert!(DEFAULT_QUALITY > 0.0);
    assert!(DEFAULT_QUALITY <= 1.0);

    // Gallery validation
    assert!(MIN_ZOOM_SCALE > 0.0);
    assert!(MIN_ZOOM_SCALE < DEFAULT_ZOOM_SCALE);
    assert!(MAX_ZOOM_SCALE > DEFAULT_ZOOM_SCALE);
    assert!(ZOOM_STEP_FACTOR > 1.0);
    assert!(ROTATION_STEP_DEGREES % 90 == 0);
};
