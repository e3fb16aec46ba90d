// SPDX-License-Identifier: MPL-2.0
use crate::domain::loading::ResourceId;
use std::time::Duration;
use thiserror::Error;

/// Crate-level error.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("I/O Error: {0}")]
    Io(String),

    #[error("Config Error: {0}")]
    Config(String),

    #[error("Fetch Error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Transcode Error: {0}")]
    Transcode(#[from] TranscodeError),

    #[error("Load Error: {0}")]
    Load(#[from] LoadError),

    #[error("Registration Error: {0}")]
    Registration(#[from] RegistrationError),

    #[error("Index {index} is out of range for a sequence of {len}")]
    InvalidIndex { index: usize, len: usize },
}

/// A single fetch attempt failed.
///
/// Always transient: the resource loader retries it, the preload scheduler
/// records it as failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connection reset, invalid URL, ...).
    #[error("request failed: {0}")]
    Request(String),

    /// The endpoint answered with a non-success status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// The attempt exceeded the configured per-attempt timeout.
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),

    /// The response body could not be read completely.
    #[error("body read failed: {0}")]
    Body(String),
}

impl FetchError {
    /// Returns the i18n message key for this error type.
    pub fn i18n_key(&self) -> &'static str {
        match self {
            FetchError::Request(_) => "error-fetch-request",
            FetchError::Status(_) => "error-fetch-status",
            FetchError::Timeout(_) => "error-fetch-timeout",
            FetchError::Body(_) => "error-fetch-body",
        }
    }
}

/// Transcoding failed. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscodeError {
    /// The source bytes are unreadable, corrupt or of an unknown format.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The encoder rejected the parameters or the target format.
    #[error("encode failed: {0}")]
    Encode(String),
}

impl TranscodeError {
    /// Returns the i18n message key for this error type.
    pub fn i18n_key(&self) -> &'static str {
        match self {
            TranscodeError::Decode(_) => "error-transcode-decode",
            TranscodeError::Encode(_) => "error-transcode-encode",
        }
    }
}

/// Terminal outcome of a tracked resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// Every attempt on the primary source, and on the fallback if any, failed.
    #[error("resource {id} failed after {attempts} attempts: {last_error}")]
    ExhaustedRetries {
        id: ResourceId,
        attempts: u32,
        last_error: FetchError,
    },
}

impl LoadError {
    /// Returns the i18n message key for this error type.
    pub fn i18n_key(&self) -> &'static str {
        match self {
            LoadError::ExhaustedRetries { .. } => "error-load-exhausted-retries",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("resource {0} is already registered")]
    AlreadyRegistered(ResourceId),

    #[error("resource {0} was destroyed")]
    Destroyed(ResourceId),

    #[error("resource {0} is not registered")]
    Unknown(ResourceId),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
