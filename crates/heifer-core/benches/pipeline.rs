//! Benchmarks for the Heifer conversion stages.
//!
//! Run with: cargo bench -p heifer-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use heifer_core::config::{EncodingConfig, LimitsConfig, ResizeFilter};
use heifer_core::pipeline::{
    fit_dimensions, ImageDecoder, JpegWriter, SourceFormat, ThumbnailGenerator,
};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;

fn benchmark_fit_dimensions(c: &mut Criterion) {
    c.bench_function("fit_dimensions", |b| {
        b.iter(|| fit_dimensions(black_box(8000), black_box(6000), black_box(4096)))
    });
}

fn benchmark_decode(c: &mut Criterion) {
    let mut png = Vec::new();
    DynamicImage::new_rgb8(1920, 1080)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();
    let decoder = ImageDecoder::new(LimitsConfig::default());
    let format = SourceFormat::Image(ImageFormat::Png);

    c.bench_function("decode_png_1080p", |b| {
        b.iter(|| {
            let _ = decoder.decode_bytes(black_box(&png), Path::new("bench.heic"), format);
        })
    });
}

fn benchmark_resize(c: &mut Criterion) {
    let img = DynamicImage::new_rgb8(4032, 3024);
    let mut group = c.benchmark_group("resize_12mp_to_1024");
    group.sample_size(10);

    for filter in [ResizeFilter::Triangle, ResizeFilter::CatmullRom, ResizeFilter::Lanczos3] {
        let generator = ThumbnailGenerator::new(1024, filter);
        group.bench_function(format!("{filter:?}"), |b| {
            b.iter(|| generator.generate(black_box(img.clone())))
        });
    }
    group.finish();
}

fn benchmark_encode(c: &mut Criterion) {
    let img = DynamicImage::new_rgb8(1920, 1080);
    let progressive = JpegWriter::new(EncodingConfig::default());
    let baseline = JpegWriter::new(EncodingConfig {
        progressive: false,
        optimize: false,
        ..Default::default()
    });

    let mut group = c.benchmark_group("encode_jpeg_1080p");
    group.sample_size(20);
    group.bench_function("progressive_optimized", |b| {
        b.iter(|| progressive.encode(black_box(img.clone())))
    });
    group.bench_function("baseline", |b| {
        b.iter(|| baseline.encode(black_box(img.clone())))
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_fit_dimensions,
    benchmark_decode,
    benchmark_resize,
    benchmark_encode,
);
criterion_main!(benches);
