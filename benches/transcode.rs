// SPDX-License-Identifier: MPL-2.0
use criterion::{criterion_group, criterion_main, Criterion};
use gallery_loader::domain::transcode::ResampleFilter;
use gallery_loader::media::transcode::{transcode, TranscodeRequest};
use image_rs::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::hint::black_box;
use std::io::Cursor;

fn sample(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x ^ y) % 256) as u8])
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut out, format)
        .expect("sample encodes");
    out.into_inner()
}

fn transcode_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("transcode");
    group.sample_size(20);

    let jpeg = sample(2000, 1000, ImageFormat::Jpeg);
    for filter in [ResampleFilter::Bilinear, ResampleFilter::Lanczos3] {
        let request = TranscodeRequest::new(jpeg.clone(), 1000, 0.8).with_filter(filter);
        group.bench_function(format!("jpeg_2000x1000_{filter:?}"), |b| {
            b.iter(|| black_box(transcode(&request).expect("transcodes")));
        });
    }

    let png = sample(800, 600, ImageFormat::Png);
    let request = TranscodeRequest::new(png, 400, 1.0);
    group.bench_function("png_800x600", |b| {
        b.iter(|| black_box(transcode(&request).expect("transcodes")));
    });

    group.finish();
}

criterion_group!(benches, transcode_benchmark);
criterion_main!(benches);
