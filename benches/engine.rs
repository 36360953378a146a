//! Benchmarks for the puzzle engine.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Vec2;

use cubemorph::geometry::build_piece_geometry;
use cubemorph::gesture::{major_axis, resolve_drag, Camera};
use cubemorph::model::PuzzleModel;
use cubemorph::moves::Letter;
use cubemorph::{EngineConfig, PuzzleEngine};

/// Benchmark one ring permutation on the model.
fn bench_rotate_slice(c: &mut Criterion) {
    let Some(ring) = Letter::R.descriptor().ring() else {
        return;
    };
    let mut model = PuzzleModel::new();

    c.bench_function("rotate_slice", |b| {
        b.iter(|| model.rotate_slice(black_box(&ring), true))
    });
}

/// Benchmark building the mesh of a corner piece with its morph target.
fn bench_piece_geometry(c: &mut Criterion) {
    c.bench_function("build_piece_geometry", |b| {
        b.iter(|| build_piece_geometry(black_box(26)))
    });
}

/// Benchmark a full drag lookup from a grabbed face.
fn bench_gesture_lookup(c: &mut Criterion) {
    let normal = major_axis(glam::Vec3::new(0.1, 0.9, 0.2));
    let drag = major_axis(glam::Vec3::new(0.3, 0.05, -0.1));

    c.bench_function("resolve_drag", |b| {
        b.iter(|| resolve_drag(black_box((1, 1, 1)), normal, drag))
    });
}

/// Benchmark ray picking against all 27 piece meshes.
fn bench_pick(c: &mut Criterion) {
    let engine = PuzzleEngine::new(EngineConfig::default());
    let camera = Camera::default();
    let pixel = Vec2::new(410.0, 290.0);

    c.bench_function("pick", |b| b.iter(|| engine.pick(&camera, black_box(pixel))));
}

/// Benchmark a 20-move shuffle animated to completion at 60 Hz.
fn bench_shuffle_to_idle(c: &mut Criterion) {
    let mut group = c.benchmark_group("shuffle");
    group.sample_size(10);
    group.bench_function("shuffle_20_run_until_idle", |b| {
        b.iter(|| {
            let mut engine = PuzzleEngine::new(EngineConfig { seed: Some(1), ..EngineConfig::default() });
            engine.shuffle(black_box(20));
            engine.run_until_idle();
            engine
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_rotate_slice,
    bench_piece_geometry,
    bench_gesture_lookup,
    bench_pick,
    bench_shuffle_to_idle
);
criterion_main!(benches);
