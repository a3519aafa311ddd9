// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the two transforms in the bildwerk-imaging crate,
// run on a synthetic image with two bright blobs on a dark background.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, GrayImage, Luma};

use bildwerk_core::{ProcessingMethod, ProcessingParams};
use bildwerk_imaging::process;

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// 256x128 dark canvas with two bright squares separated by a gap.
fn two_blob_image() -> DynamicImage {
    let mut img = GrayImage::from_pixel(256, 128, Luma([30u8]));
    for y in 24..104 {
        for x in (24..104).chain(152..232) {
            img.put_pixel(x, y, Luma([220u8]));
        }
    }
    DynamicImage::ImageLuma8(img)
}

fn bench_threshold(c: &mut Criterion) {
    let input = two_blob_image();
    let params = ProcessingParams::default();
    c.bench_function("threshold (256x128)", |b| {
        b.iter(|| {
            black_box(process(
                black_box(input.clone()),
                ProcessingMethod::Threshold,
                &params,
            ));
        });
    });
}

/// Watershed is dominated by the distance transform and the flood; the
/// two-blob image exercises both with several seed regions.
fn bench_watershed(c: &mut Criterion) {
    let input = two_blob_image();
    let params = ProcessingParams::default();
    c.bench_function("watershed (256x128)", |b| {
        b.iter(|| {
            black_box(process(
                black_box(input.clone()),
                ProcessingMethod::Watershed,
                &params,
            ));
        });
    });
}

criterion_group!(benches, bench_threshold, bench_watershed);
criterion_main!(benches);
