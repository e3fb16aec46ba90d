// SPDX-License-Identifier: MPL-2.0
//! Visual-resource loading pipeline.
//!
//! - [`visibility`]: one-shot "became visible" detection for placeholders
//! - [`loader`]: per-resource retry/fallback state machine (no I/O)
//! - [`timer`]: delayed-task queue driving retries
//! - [`lazy`]: async driver executing loaders against a fetcher
//! - [`prefetch`]: session cache and neighbor preloading
//! - [`transcode`]: resize and recompression before upload
//! - [`navigator`]: gallery session tying preloading to the focal item

pub mod lazy;
pub mod loader;
pub mod navigator;
pub mod prefetch;
pub mod timer;
pub mod transcode;
pub mod visibility;

// Re-export commonly used types
pub use lazy::LazyLoader;
pub use loader::{LoaderAction, LoaderEvent, ResourceLoader};
pub use navigator::{Download, GalleryNavigator, NavigationInfo, NavigatorHost, NoopHost, ViewTransform};
pub use prefetch::{preload_window, PreloadCache, PreloadCacheConfig, PreloadScheduler, PreloadStats};
pub use timer::{TimerId, TimerQueue};
pub use transcode::{
    target_dimensions, transcode, transcode_blocking, TranscodeRequest, TranscodeResult,
    Transcoder, UploadPayload,
};
pub use visibility::{BoxedNotifier, ChannelNotifier, OnVisible, VisibilityDetector};
