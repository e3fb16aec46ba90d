// SPDX-License-Identifier: MPL-2.0
//! This module handles the crate's configuration, including loading and saving
//! tuning parameters to a `settings.toml` file.
//!
//! # Configuration Sections
//!
//! The configuration is organized into logical sections:
//! - `[loading]` - Retry attempts, backoff delay and per-attempt timeout
//! - `[visibility]` - Threshold and margin of the lazy-load window
//! - `[preload]` - Neighbor lookahead and payload cache budget
//! - `[transcode]` - Upload resize bound, quality and filter
//!
//! Every field is optional; missing fields take the values in [`defaults`].
//!
//! # Path Resolution
//!
//! The config file location can be customized for testing or portable deployments:
//! 1. Use `load_from_path()`/`save_to_path()` with explicit path
//! 2. Pass an override directory to `load_with_override()`/`save_with_override()`
//! 3. Set `GALLERY_LOADER_CONFIG_DIR` environment variable
//! 4. Falls back to platform-specific config directory
//!
//! # Examples
//!
//! ```no_run
//! use gallery_loader::config::{self, Config};
//!
//! // Load existing configuration (returns tuple with optional warning)
//! let (mut config, _warning) = config::load();
//!
//! // Modify a setting
//! config.loading.max_attempts = Some(5);
//!
//! // Save the modified configuration
//! config::save(&config).expect("Failed to save config");
//! ```

pub mod defaults;

pub use defaults::*;

use crate::domain::gallery::Lookahead;
use crate::domain::loading::{MaxAttempts, RetryPolicy};
use crate::domain::transcode::{MaxDimension, Quality, ResampleFilter};
use crate::domain::visibility::VisibilityOptions;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "settings.toml";

/// Application name used for directory naming.
const APP_NAME: &str = "GalleryLoader";

/// Environment variable to override the config directory.
pub const ENV_CONFIG_DIR: &str = "GALLERY_LOADER_CONFIG_DIR";

/// Warning key returned by [`load`] when the file exists but cannot be parsed.
pub const LOAD_ERROR_WARNING: &str = "notification-config-load-error";

// =============================================================================
// Section Structs
// =============================================================================

/// Lazy-load retry settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LoadingConfig {
    /// Attempts per source before switching to the fallback or failing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,

    /// Base delay of the linear backoff, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_delay_ms: Option<u64>,

    /// Per-attempt timeout in milliseconds; `0` disables it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_timeout_ms: Option<u64>,
}

/// Visibility window settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct VisibilityConfig {
    /// Fraction of a placeholder that must be inside the window (0.0–1.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f32>,

    /// Pixels added around the viewport.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin: Option<f32>,
}

/// Neighbor preloading settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PreloadConfig {
    /// Whether the gallery preloads neighbors at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Neighbors preloaded on each side of the focal item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookahead: Option<usize>,

    /// Byte budget of retained payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_bytes: Option<usize>,

    /// Maximum number of retained payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_entries: Option<usize>,
}

/// Upload transcode settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TranscodeConfig {
    /// Bound on the longer edge, in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_dimension: Option<u32>,

    /// Encoder quality in (0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<f32>,

    /// Resampling filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<ResampleFilter>,
}

// =============================================================================
// Main Config Struct
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub loading: LoadingConfig,

    #[serde(default)]
    pub visibility: VisibilityConfig,

    #[serde(default)]
    pub preload: PreloadConfig,

    #[serde(default)]
    pub transcode: TranscodeConfig,
}

impl Config {
    /// Retry policy with out-of-range values clamped.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            MaxAttempts::new(self.loading.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS)),
            Duration::from_millis(self.loading.base_delay_ms.unwrap_or(DEFAULT_BASE_DELAY_MS)),
        )
    }

    /// Per-attempt timeout, `None` when disabled.
    #[must_use]
    pub fn fetch_timeout(&self) -> Option<Duration> {
        match self
            .loading
            .fetch_timeout_ms
            .unwrap_or(DEFAULT_FETCH_TIMEOUT_MS)
        {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    #[must_use]
    pub fn visibility_options(&self) -> VisibilityOptions {
        VisibilityOptions::new(
            self.visibility
                .threshold
                .unwrap_or(DEFAULT_VISIBILITY_THRESHOLD),
            self.visibility.margin.unwrap_or(DEFAULT_VISIBILITY_MARGIN),
        )
    }

    /// Lookahead; zero when preloading is disabled.
    #[must_use]
    pub fn lookahead(&self) -> Lookahead {
        if self.preload.enabled == Some(false) {
            return Lookahead::new(0);
        }
        Lookahead::new(self.preload.lookahead.unwrap_or(DEFAULT_PRELOAD_LOOKAHEAD))
    }

    /// Payload budget as `(bytes, entries)`, clamped to the supported range.
    #[must_use]
    pub fn preload_budget(&self) -> (usize, usize) {
        (
            self.preload
                .cache_bytes
                .unwrap_or(DEFAULT_PRELOAD_CACHE_BYTES)
                .clamp(MIN_PRELOAD_CACHE_BYTES, MAX_PRELOAD_CACHE_BYTES),
            self.preload
                .max_entries
                .unwrap_or(DEFAULT_MAX_CACHED_PAYLOADS)
                .clamp(MIN_MAX_CACHED_PAYLOADS, MAX_MAX_CACHED_PAYLOADS),
        )
    }

    /// Invalid stored values fall back to the default.
    #[must_use]
    pub fn max_dimension(&self) -> MaxDimension {
        self.transcode
            .max_dimension
            .and_then(MaxDimension::new)
            .unwrap_or_default()
    }

    /// Invalid stored values fall back to the default.
    #[must_use]
    pub fn quality(&self) -> Quality {
        self.transcode
            .quality
            .and_then(Quality::new)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn resample_filter(&self) -> ResampleFilter {
        self.transcode.filter.unwrap_or_default()
    }
}

// =============================================================================
// Path Resolution
// =============================================================================

/// Returns the config directory with an optional override.
///
/// # Resolution Order
///
/// 1. `override_path` parameter (if `Some`) - most specific, for tests
/// 2. `GALLERY_LOADER_CONFIG_DIR` environment variable (if set and non-empty)
/// 3. Platform-specific config directory (with app name appended)
#[must_use]
pub fn config_dir_with_override(override_path: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = override_path {
        return Some(path);
    }

    if let Ok(env_path) = std::env::var(ENV_CONFIG_DIR) {
        if !env_path.is_empty() {
            return Some(PathBuf::from(env_path));
        }
    }

    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path
    })
}

fn config_path_with_override(base_dir: Option<PathBuf>) -> Option<PathBuf> {
    config_dir_with_override(base_dir).map(|mut path| {
        path.push(CONFIG_FILE);
        path
    })
}

// =============================================================================
// Load / Save
// =============================================================================

/// Loads the configuration from the default location.
///
/// Returns a tuple of (config, optional_warning). If loading fails, returns
/// default config with a warning key explaining what went wrong.
pub fn load() -> (Config, Option<String>) {
    load_with_override(None)
}

/// Loads the configuration from a custom directory.
pub fn load_with_override(base_dir: Option<PathBuf>) -> (Config, Option<String>) {
    if let Some(path) = config_path_with_override(base_dir) {
        if path.exists() {
            match load_from_path(&path) {
                Ok(config) => return (config, None),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable config");
                    return (Config::default(), Some(LOAD_ERROR_WARNING.to_string()));
                }
            }
        }
    }
    (Config::default(), None)
}

/// Loads configuration from a specific path.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML.
pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    let config = toml::from_str::<Config>(&content)?;
    Ok(config)
}

/// Saves the configuration to the default location.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file written.
pub fn save(config: &Config) -> Result<()> {
    save_with_override(config, None)
}

/// Saves the configuration to a custom directory.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file written.
pub fn save_with_override(config: &Config, base_dir: Option<PathBuf>) -> Result<()> {
    if let Some(path) = config_path_with_override(base_dir) {
        return save_to_path(config, &path);
    }
    Ok(())
}

/// Saves configuration to a specific path.
///
/// # Errors
///
/// Returns an error if the directory cannot be created, the config cannot be
/// serialized or the file cannot be written.
pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config).map_err(Error::from)?;
    fs::write(path, content)?;
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_and_load_round_trip_preserves_sections() {
        let config = Config {
            loading: LoadingConfig {
                max_attempts: Some(2),
                base_delay_ms: Some(100),
                fetch_timeout_ms: Some(0),
            },
            transcode: TranscodeConfig {
                max_dimension: Some(1000),
                quality: Some(0.7),
                filter: Some(ResampleFilter::Lanczos3),
            },
            ..Config::default()
        };
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join("settings.toml");

        save_to_path(&config, &config_path).expect("failed to save config");
        let loaded = load_from_path(&config_path).expect("failed to load config");

        assert_eq!(loaded, config);
    }

    #[test]
    fn empty_file_yields_defaults() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(&config_path, "").expect("write file");

        let loaded = load_from_path(&config_path).expect("empty toml is valid");
        assert_eq!(loaded, Config::default());
        assert_eq!(loaded.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(&config_path, "[preload]\nlookahead = 4\n").expect("write file");

        let loaded = load_from_path(&config_path).expect("valid toml");
        assert_eq!(loaded.lookahead().value(), 4);
        assert_eq!(loaded.quality(), Quality::default());
    }

    #[test]
    fn load_from_path_errors_on_invalid_toml() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(&config_path, "not = valid = toml").expect("write file");

        assert!(matches!(load_from_path(&config_path), Err(Error::Config(_))));
    }

    #[test]
    fn load_with_override_from_empty_directory_returns_default() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let (config, warning) = load_with_override(Some(temp_dir.path().to_path_buf()));
        assert!(warning.is_none(), "should not warn for missing file");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_with_override_from_corrupted_file_returns_default_with_warning() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let base_dir = temp_dir.path().to_path_buf();
        fs::write(base_dir.join(CONFIG_FILE), "not = valid = toml").expect("write file");

        let (config, warning) = load_with_override(Some(base_dir));
        assert_eq!(warning.as_deref(), Some(LOAD_ERROR_WARNING));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn save_with_override_then_load_with_override() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let base_dir = temp_dir.path().join("deep").join("path");
        let config = Config {
            visibility: VisibilityConfig {
                threshold: Some(0.5),
                margin: Some(0.0),
            },
            ..Config::default()
        };

        save_with_override(&config, Some(base_dir.clone())).expect("save should create dirs");
        let (loaded, warning) = load_with_override(Some(base_dir));
        assert!(warning.is_none());
        assert_eq!(loaded.visibility_options(), VisibilityOptions::new(0.5, 0.0));
    }

    #[test]
    fn disabled_preload_forces_zero_lookahead() {
        let config = Config {
            preload: PreloadConfig {
                enabled: Some(false),
                lookahead: Some(5),
                ..PreloadConfig::default()
            },
            ..Config::default()
        };
        assert!(config.lookahead().is_disabled());
    }

    #[test]
    fn zero_timeout_disables_it() {
        let mut config = Config::default();
        assert_eq!(
            config.fetch_timeout(),
            Some(Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS))
        );
        config.loading.fetch_timeout_ms = Some(0);
        assert_eq!(config.fetch_timeout(), None);
    }

    #[test]
    fn invalid_transcode_values_fall_back_to_defaults() {
        let config = Config {
            transcode: TranscodeConfig {
                max_dimension: Some(0),
                quality: Some(3.0),
                filter: None,
            },
            ..Config::default()
        };
        assert_eq!(config.max_dimension(), MaxDimension::default());
        assert_eq!(config.quality(), Quality::default());
        assert_eq!(config.resample_filter(), ResampleFilter::Bilinear);
    }

    #[test]
    fn preload_budget_is_clamped() {
        let config = Config {
            preload: PreloadConfig {
                cache_bytes: Some(1),
                max_entries: Some(usize::MAX),
                ..PreloadConfig::default()
            },
            ..Config::default()
        };
        assert_eq!(
            config.preload_budget(),
            (MIN_PRELOAD_CACHE_BYTES, MAX_MAX_CACHED_PAYLOADS)
        );
    }
}
