// SPDX-License-Identifier: MPL-2.0
//! Client-side resize and recompression of images before upload.
//!
//! The pipeline is decode → pixel buffer → resample → encode, always in the
//! format of the source. Resampling uses bilinear filtering unless another
//! [`ResampleFilter`] is requested; images already within bounds are never
//! enlarged.
//!
//! Quality only affects lossy output (JPEG). PNG is re-encoded with the best
//! compression level; WebP is written lossless; GIF, BMP, TIFF and ICO use
//! their default encoders.

use crate::config::Config;
use crate::domain::transcode::{MaxDimension, Quality, ResampleFilter};
use crate::error::TranscodeError;
use image_rs::codecs::jpeg::JpegEncoder;
use image_rs::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image_rs::codecs::webp::WebPEncoder;
use image_rs::imageops::FilterType;
use image_rs::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

/// One transcode job.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeRequest {
    pub source_bytes: Vec<u8>,
    /// Bound on the longer edge, in pixels. Must be positive.
    pub max_dimension: u32,
    /// Encoder quality in `(0, 1]`.
    pub quality: f32,
    pub filter: ResampleFilter,
}

impl TranscodeRequest {
    /// Creates a request with the default bilinear filter.
    #[must_use]
    pub fn new(source_bytes: Vec<u8>, max_dimension: u32, quality: f32) -> Self {
        Self {
            source_bytes,
            max_dimension,
            quality,
            filter: ResampleFilter::default(),
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: ResampleFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// Re-encoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeResult {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub byte_size: usize,
    pub format: ImageFormat,
}

/// Dimensions after fitting the longer edge into `max_dimension`.
///
/// Never enlarges; each edge is rounded and kept within `1..=max_dimension`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn target_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longer = width.max(height);
    if longer == 0 || max_dimension == 0 || longer <= max_dimension {
        return (width, height);
    }
    let scale = f64::from(max_dimension) / f64::from(longer);
    let fit = |edge: u32| {
        ((f64::from(edge) * scale).round() as u32).clamp(1, max_dimension)
    };
    (fit(width), fit(height))
}

/// Decodes, resizes and re-encodes `request.source_bytes`.
///
/// # Errors
///
/// - [`TranscodeError::Decode`] if the bytes are not a readable image
/// - [`TranscodeError::Encode`] if the parameters are invalid, the source
///   format cannot be written back or the encoder fails
pub fn transcode(request: &TranscodeRequest) -> Result<TranscodeResult, TranscodeError> {
    run(request).map(|(result, _)| result)
}

/// Transcodes and reports whether the image was resized.
fn run(request: &TranscodeRequest) -> Result<(TranscodeResult, bool), TranscodeError> {
    if request.max_dimension == 0 {
        return Err(TranscodeError::Encode(
            "max dimension must be positive".into(),
        ));
    }
    let quality = Quality::new(request.quality).ok_or_else(|| {
        TranscodeError::Encode(format!("quality {} is outside (0, 1]", request.quality))
    })?;

    let format = image_rs::guess_format(&request.source_bytes)
        .map_err(|e| TranscodeError::Decode(e.to_string()))?;
    let image = image_rs::load_from_memory_with_format(&request.source_bytes, format)
        .map_err(|e| TranscodeError::Decode(e.to_string()))?;

    let (width, height) = image.dimensions();
    let (target_width, target_height) = target_dimensions(width, height, request.max_dimension);
    let resized = (target_width, target_height) != (width, height);
    let image = if resized {
        image.resize_exact(target_width, target_height, filter_type(request.filter))
    } else {
        image
    };

    let bytes = encode(&image, format, quality)?;
    tracing::debug!(
        ?format,
        from = %format_args!("{width}x{height}"),
        to = %format_args!("{target_width}x{target_height}"),
        original = request.source_bytes.len(),
        encoded = bytes.len(),
        "image transcoded"
    );
    let result = TranscodeResult {
        byte_size: bytes.len(),
        bytes,
        width: target_width,
        height: target_height,
        format,
    };
    Ok((result, resized))
}

/// Runs [`transcode`] on the blocking thread pool.
///
/// # Errors
///
/// Same as [`transcode`]; a panicked worker is reported as an encode error.
pub async fn transcode_blocking(request: TranscodeRequest) -> Result<TranscodeResult, TranscodeError> {
    tokio::task::spawn_blocking(move || transcode(&request))
        .await
        .unwrap_or_else(|e| Err(TranscodeError::Encode(format!("transcode task failed: {e}"))))
}

fn filter_type(filter: ResampleFilter) -> FilterType {
    match filter {
        ResampleFilter::Nearest => FilterType::Nearest,
        ResampleFilter::Bilinear => FilterType::Triangle,
        ResampleFilter::CatmullRom => FilterType::CatmullRom,
        ResampleFilter::Lanczos3 => FilterType::Lanczos3,
    }
}

fn encode(
    image: &DynamicImage,
    format: ImageFormat,
    quality: Quality,
) -> Result<Vec<u8>, TranscodeError> {
    let mut out = Cursor::new(Vec::new());
    let written = match format {
        ImageFormat::Jpeg => image
            .to_rgb8()
            .write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality.as_percent())),
        ImageFormat::Png => image.write_with_encoder(PngEncoder::new_with_quality(
            &mut out,
            CompressionType::Best,
            PngFilterType::Adaptive,
        )),
        ImageFormat::WebP => image
            .to_rgba8()
            .write_with_encoder(WebPEncoder::new_lossless(&mut out)),
        ImageFormat::Gif | ImageFormat::Bmp | ImageFormat::Tiff | ImageFormat::Ico => {
            image.write_to(&mut out, format)
        }
        other => {
            return Err(TranscodeError::Encode(format!(
                "cannot encode {other:?} output"
            )))
        }
    };
    written.map_err(|e| TranscodeError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}

// =============================================================================
// Transcoder
// =============================================================================

/// Transcode settings shared by every upload of a form.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transcoder {
    max_dimension: MaxDimension,
    quality: Quality,
    filter: ResampleFilter,
}

impl Transcoder {
    #[must_use]
    pub fn new(max_dimension: MaxDimension, quality: Quality, filter: ResampleFilter) -> Self {
        Self {
            max_dimension,
            quality,
            filter,
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.max_dimension(),
            config.quality(),
            config.resample_filter(),
        )
    }

    #[must_use]
    pub fn max_dimension(&self) -> MaxDimension {
        self.max_dimension
    }

    #[must_use]
    pub fn quality(&self) -> Quality {
        self.quality
    }

    #[must_use]
    pub fn filter(&self) -> ResampleFilter {
        self.filter
    }

    #[must_use]
    pub fn request(&self, source_bytes: Vec<u8>) -> TranscodeRequest {
        TranscodeRequest::new(
            source_bytes,
            self.max_dimension.value(),
            self.quality.value(),
        )
        .with_filter(self.filter)
    }

    /// Transcodes `source_bytes` with these settings.
    ///
    /// # Errors
    ///
    /// Same as [`transcode`].
    pub fn transcode(&self, source_bytes: Vec<u8>) -> Result<TranscodeResult, TranscodeError> {
        transcode(&self.request(source_bytes))
    }

    /// Shrinks `source_bytes` for upload, never failing.
    ///
    /// Falls back to the original bytes when transcoding fails, or when it
    /// neither resized the image nor saved any bytes.
    #[must_use]
    pub fn compress_for_upload(&self, source_bytes: Vec<u8>) -> UploadPayload {
        let original_size = source_bytes.len();
        let request = self.request(source_bytes);
        match run(&request) {
            Ok((result, resized)) if resized || result.byte_size < original_size => UploadPayload {
                width: Some(result.width),
                height: Some(result.height),
                original_size,
                transcoded: true,
                bytes: result.bytes,
            },
            Ok(_) => {
                tracing::debug!(original_size, "transcode saved nothing, keeping original");
                UploadPayload::original(request.source_bytes)
            }
            Err(error) => {
                tracing::warn!(%error, "transcode failed, uploading original");
                UploadPayload::original(request.source_bytes)
            }
        }
    }

    /// Runs [`Transcoder::compress_for_upload`] on the blocking thread pool.
    pub async fn compress_for_upload_blocking(self, source_bytes: Vec<u8>) -> UploadPayload {
        let original = source_bytes.clone();
        tokio::task::spawn_blocking(move || self.compress_for_upload(source_bytes))
            .await
            .unwrap_or_else(|_| UploadPayload::original(original))
    }
}

/// Bytes ready for upload, with what the transcoder did to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPayload {
    pub bytes: Vec<u8>,
    /// Dimensions of `bytes`, when transcoded.
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub original_size: usize,
    /// `false` when `bytes` are the untouched original.
    pub transcoded: bool,
}

impl UploadPayload {
    fn original(bytes: Vec<u8>) -> Self {
        Self {
            original_size: bytes.len(),
            bytes,
            width: None,
            height: None,
            transcoded: false,
        }
    }

    #[must_use]
    pub fn byte_size(&self) -> usize {
        self.bytes.len()
    }

    /// Bytes saved compared to the original; zero when untouched or larger.
    #[must_use]
    pub fn savings(&self) -> usize {
        self.original_size.saturating_sub(self.bytes.len())
    }
}
