// SPDX-License-Identifier: MPL-2.0
use futures_util::FutureExt;
use gallery_loader::application::port::{FetchFuture, ResourceFetcher};
use gallery_loader::config::{self, Config, LoadingConfig, PreloadConfig};
use gallery_loader::domain::gallery::Lookahead;
use gallery_loader::domain::loading::{ResourceId, ResourceState, ResourceUri};
use gallery_loader::domain::visibility::{Rect, VisibilityOptions};
use gallery_loader::error::FetchError;
use gallery_loader::media::transcode::{transcode, TranscodeRequest};
use gallery_loader::media::{GalleryNavigator, LazyLoader, LoaderEvent};
use image_rs::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;
use tokio::time::Instant;

/// Serves fixed bytes for known URIs, `404` otherwise, and logs every call.
#[derive(Clone, Default)]
struct StaticFetcher {
    responses: Arc<HashMap<String, Vec<u8>>>,
    calls: Arc<Mutex<Vec<(String, Instant)>>>,
}

impl StaticFetcher {
    fn serving(uris: &[&str]) -> Self {
        let responses = uris
            .iter()
            .map(|uri| ((*uri).to_string(), uri.as_bytes().to_vec()))
            .collect();
        Self {
            responses: Arc::new(responses),
            calls: Arc::default(),
        }
    }

    fn calls(&self) -> Vec<(String, Instant)> {
        self.calls.lock().expect("call log poisoned").clone()
    }
}

impl ResourceFetcher for StaticFetcher {
    fn fetch(&self, uri: &ResourceUri) -> FetchFuture {
        self.calls
            .lock()
            .expect("call log poisoned")
            .push((uri.as_str().to_string(), Instant::now()));
        let result = self
            .responses
            .get(uri.as_str())
            .map(|bytes| Arc::new(bytes.clone()))
            .ok_or(FetchError::Status(404));
        async move { result }.boxed()
    }
}

const VIEWPORT: Rect = Rect {
    x: 0.0,
    y: 0.0,
    width: 1280.0,
    height: 720.0,
};

#[tokio::test(start_paused = true)]
async fn failing_primary_retries_then_loads_fallback() {
    let fetcher = StaticFetcher::serving(&["good"]);
    let config = Config {
        loading: LoadingConfig {
            max_attempts: Some(2),
            base_delay_ms: Some(100),
            fetch_timeout_ms: Some(0),
        },
        ..Config::default()
    };
    let mut lazy = LazyLoader::from_config(fetcher.clone(), &config);
    let start = Instant::now();
    let id = ResourceId::new(1);

    lazy.track(
        id,
        ResourceUri::from("bad"),
        Some(ResourceUri::from("good")),
        Rect::new(20.0, 20.0, 200.0, 150.0),
        VisibilityOptions::default(),
        None,
    )
    .expect("fresh id");
    lazy.set_viewport(VIEWPORT, None);
    let events = lazy.run_until_idle(None).await;

    let timeline: Vec<(String, u128)> = fetcher
        .calls()
        .into_iter()
        .map(|(uri, at)| (uri, (at - start).as_millis()))
        .collect();
    assert_eq!(
        timeline,
        vec![
            ("bad".to_string(), 0),
            ("bad".to_string(), 100),
            ("good".to_string(), 100),
        ]
    );
    assert_eq!(
        lazy.state(id),
        Some(&ResourceState::Loaded(ResourceUri::from("good")))
    );
    assert!(events.iter().any(|event| matches!(
        event,
        LoaderEvent::Loaded { source, .. } if source.as_str() == "good"
    )));
    assert!(!events
        .iter()
        .any(|event| matches!(event, LoaderEvent::Failed { .. })));
}

#[tokio::test]
async fn gallery_preloads_exactly_the_neighbors() {
    let uris: Vec<String> = (0..10).map(|i| format!("photo-{i}")).collect();
    let refs: Vec<&str> = uris.iter().map(String::as_str).collect();
    let fetcher = StaticFetcher::serving(&refs);
    let sequence: Vec<ResourceUri> = uris.iter().map(|uri| ResourceUri::from(uri.as_str())).collect();
    let mut gallery =
        GalleryNavigator::new(sequence.clone(), fetcher.clone()).with_lookahead(Lookahead::new(2));

    gallery.open(5).expect("in range");
    gallery.settle_preloads().await;

    let mut fetched: Vec<String> = fetcher.calls().into_iter().map(|(uri, _)| uri).collect();
    fetched.sort();
    assert_eq!(fetched, vec!["photo-3", "photo-4", "photo-6", "photo-7"]);
    for untouched in [0, 1, 2, 5, 8, 9] {
        assert!(!gallery.cache().is_known(&sequence[untouched]));
    }
}

#[test]
fn large_image_is_halved_and_shrinks() {
    let image = RgbImage::from_fn(2000, 1000, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
    });
    let mut source = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut source, ImageFormat::Jpeg)
        .expect("source encodes");
    let source = source.into_inner();

    let result = transcode(&TranscodeRequest::new(source.clone(), 1000, 0.8)).expect("transcodes");

    assert_eq!((result.width, result.height), (1000, 500));
    assert!(result.byte_size < source.len());
    let decoded = image_rs::load_from_memory(&result.bytes).expect("result decodes");
    assert_eq!(decoded.dimensions(), (1000, 500));
}

#[test]
fn zoom_steps_multiply_until_the_cap() {
    let mut gallery = GalleryNavigator::new(vec![ResourceUri::from("only")], StaticFetcher::default());
    assert_eq!(gallery.scale().value(), 1.0);
    for _ in 0..3 {
        gallery.zoom_in();
    }
    assert!((gallery.scale().value() - 1.728).abs() < 1e-4);
    gallery.zoom_in();
    assert!((gallery.scale().value() - 2.0736).abs() < 1e-4);
    for _ in 0..3 {
        gallery.zoom_in();
    }
    assert_eq!(gallery.scale().value(), 3.0);
}

#[tokio::test(start_paused = true)]
async fn unmounted_placeholder_is_never_fetched() {
    let fetcher = StaticFetcher::serving(&["car.jpg"]);
    let mut lazy = LazyLoader::new(fetcher.clone(), Default::default(), None);
    let id = ResourceId::new(42);

    lazy.track(
        id,
        ResourceUri::from("car.jpg"),
        None,
        Rect::new(0.0, 4000.0, 300.0, 200.0),
        VisibilityOptions::default(),
        None,
    )
    .expect("fresh id");
    lazy.untrack(id).expect("tracked");
    lazy.set_viewport(Rect::new(0.0, 3800.0, 1280.0, 720.0), None);
    tokio::time::advance(Duration::from_secs(5)).await;

    assert!(lazy.run_until_idle(None).await.is_empty());
    assert!(fetcher.calls().is_empty());
    assert_eq!(lazy.state(id), None);
}

#[tokio::test]
async fn lazy_loader_uses_gallery_preloads() {
    let fetcher = StaticFetcher::serving(&["a", "b", "c"]);
    let sequence = vec![ResourceUri::from("a"), ResourceUri::from("b"), ResourceUri::from("c")];
    let mut gallery =
        GalleryNavigator::new(sequence, fetcher.clone()).with_lookahead(Lookahead::new(1));
    gallery.open(0).expect("in range");
    gallery.settle_preloads().await;
    let preload_calls = fetcher.calls().len();

    let mut lazy = LazyLoader::new(fetcher.clone(), Default::default(), None);
    lazy.set_viewport(VIEWPORT, Some(gallery.cache_mut()));
    lazy.track(
        ResourceId::new(1),
        ResourceUri::from("b"),
        None,
        Rect::new(0.0, 0.0, 100.0, 100.0),
        VisibilityOptions::default(),
        Some(gallery.cache_mut()),
    )
    .expect("fresh id");
    lazy.run_until_idle(Some(gallery.cache_mut())).await;

    assert_eq!(fetcher.calls().len(), preload_calls);
    assert_eq!(
        lazy.state(ResourceId::new(1)),
        Some(&ResourceState::Loaded(ResourceUri::from("b")))
    );
}

#[test]
fn settings_file_round_trip() {
    let dir = tempdir().expect("Failed to create temporary directory");
    let config = Config {
        loading: LoadingConfig {
            max_attempts: Some(4),
            base_delay_ms: Some(250),
            fetch_timeout_ms: None,
        },
        preload: PreloadConfig {
            enabled: Some(true),
            lookahead: Some(3),
            ..PreloadConfig::default()
        },
        ..Config::default()
    };

    config::save_with_override(&config, Some(dir.path().to_path_buf()))
        .expect("Failed to write config file");
    let (loaded, warning) = config::load_with_override(Some(dir.path().to_path_buf()));

    assert!(warning.is_none());
    assert_eq!(loaded, config);
    assert_eq!(loaded.retry_policy().max_attempts(), 4);
    assert_eq!(loaded.retry_policy().base_delay(), Duration::from_millis(250));
    assert_eq!(loaded.lookahead().value(), 3);
}
