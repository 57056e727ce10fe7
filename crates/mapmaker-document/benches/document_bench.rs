// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the mapmaker-document crate: layout planning and
// tile cropping of a large synthetic map.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgb, RgbImage};

use mapmaker_core::{BorderSpec, GridSpec, OverlapSpec, PaperSize};
use mapmaker_document::{RasterImage, plan};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Plan a 40 x 20 square map at 5 px/mm on A4.
fn bench_plan(c: &mut Criterion) {
    let grid = GridSpec::new(40.0, 20.0).expect("valid grid");
    let border = BorderSpec::default();
    let overlap = OverlapSpec::default();

    c.bench_function("plan (5080x2540 on A4)", |b| {
        b.iter(|| {
            let layout = plan(
                black_box(5080),
                black_box(2540),
                &grid,
                PaperSize::A4,
                &border,
                &overlap,
            )
            .expect("plan succeeds");
            black_box(layout.tiles());
        });
    });
}

/// Crop every tile of the same map out of a full-size RGB buffer.
fn bench_crop_tiles(c: &mut Criterion) {
    let image = RasterImage::from_rgb(RgbImage::from_fn(5080, 2540, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 96])
    }));
    let layout = plan(
        image.width(),
        image.height(),
        &GridSpec::new(40.0, 20.0).expect("valid grid"),
        PaperSize::A4,
        &BorderSpec::default(),
        &OverlapSpec::default(),
    )
    .expect("plan succeeds");
    let tiles = layout.tiles();

    c.bench_function("crop tiles (12 pages)", |b| {
        b.iter(|| {
            for tile in &tiles {
                black_box(image.crop(black_box(tile.rect)));
            }
        });
    });
}

criterion_group!(benches, bench_plan, bench_crop_tiles);
criterion_main!(benches);
