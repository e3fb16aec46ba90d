// SPDX-License-Identifier: MPL-2.0
//! Test utilities for float comparisons and other common test helpers.
//!
//! This module re-exports the `approx` crate's assertion macros for float comparison,
//! which properly handle floating-point precision issues that `assert_eq!` cannot.
//! It also provides a scripted [`FakeFetcher`] and small image builders.

// Re-export approx macros for convenient use in tests
pub use approx::{assert_abs_diff_eq, assert_relative_eq};

use crate::application::port::{FetchFuture, ResourceFetcher};
use crate::domain::loading::{Payload, ResourceUri};
use crate::error::FetchError;
use futures_util::FutureExt;
use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Default epsilon for f32 comparisons.
/// Suitable for values that should be "exactly equal" but may have minor floating-point errors.
pub const F32_EPSILON: f32 = 1e-6;

/// Scripted outcome of one fake fetch.
pub type Outcome = Result<Payload, FetchError>;

/// Returns a successful outcome carrying `bytes`.
pub fn ok(bytes: &[u8]) -> Outcome {
    Ok(Arc::new(bytes.to_vec()))
}

/// Returns a failed outcome.
pub fn fail() -> Outcome {
    Err(FetchError::Status(500))
}

#[derive(Default)]
struct FakeState {
    scripts: HashMap<String, VecDeque<Outcome>>,
    always: HashMap<String, Outcome>,
    latency: HashMap<String, Duration>,
    calls: Vec<(ResourceUri, Instant)>,
}

/// In-memory [`ResourceFetcher`] with per-URI scripted outcomes.
///
/// Scripted outcomes are consumed in order; once a script is empty the
/// `always` outcome applies, and unknown URIs fail with `404`. Every call is
/// logged with the (possibly paused) tokio clock.
#[derive(Clone, Default)]
pub struct FakeFetcher {
    state: Arc<Mutex<FakeState>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every fetch of `uri` with `outcome`.
    pub fn always(self, uri: &str, outcome: Outcome) -> Self {
        self.state
            .lock()
            .expect("fake state poisoned")
            .always
            .insert(uri.to_string(), outcome);
        self
    }

    /// Answers the next fetches of `uri` with `outcomes`, in order.
    pub fn script(self, uri: &str, outcomes: Vec<Outcome>) -> Self {
        self.state
            .lock()
            .expect("fake state poisoned")
            .scripts
            .insert(uri.to_string(), outcomes.into());
        self
    }

    /// Delays every answer for `uri` by `latency`.
    pub fn latency(self, uri: &str, latency: Duration) -> Self {
        self.state
            .lock()
            .expect("fake state poisoned")
            .latency
            .insert(uri.to_string(), latency);
        self
    }

    /// Returns every fetched URI with the instant of the call.
    pub fn calls(&self) -> Vec<(ResourceUri, Instant)> {
        self.state.lock().expect("fake state poisoned").calls.clone()
    }

    /// Returns the fetched URIs in call order.
    pub fn fetched(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|(uri, _)| uri.as_str().to_string())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().expect("fake state poisoned").calls.len()
    }
}

impl ResourceFetcher for FakeFetcher {
    fn fetch(&self, uri: &ResourceUri) -> FetchFuture {
        let (outcome, latency) = {
            let mut state = self.state.lock().expect("fake state poisoned");
            state.calls.push((uri.clone(), Instant::now()));
            let key = uri.as_str();
            let scripted = state.scripts.get_mut(key).and_then(VecDeque::pop_front);
            let outcome = scripted
                .or_else(|| state.always.get(key).cloned())
                .unwrap_or(Err(FetchError::Status(404)));
            (outcome, state.latency.get(key).copied())
        };
        async move {
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            outcome
        }
        .boxed()
    }
}

/// Encodes a `width`×`height` gradient in `format`.
pub fn encoded_image(width: u32, height: u32, format: image_rs::ImageFormat) -> Vec<u8> {
    let image = image_rs::RgbImage::from_fn(width, height, |x, y| {
        image_rs::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut out = Cursor::new(Vec::new());
    image_rs::DynamicImage::ImageRgb8(image)
        .write_to(&mut out, format)
        .expect("test image encodes");
    out.into_inner()
}
