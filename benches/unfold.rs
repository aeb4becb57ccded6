//! Benchmarks for mesh unfolding.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use unfolder::algo::unfold::{corrected_angles, segment};
use unfolder::prelude::*;
use nalgebra::Point3;

/// Grid over the unit square lifted onto a bump, so the angles need correcting.
fn create_bumped_grid(n: usize) -> TriangleMesh {
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    let mut faces = Vec::with_capacity(n * n * 2);

    for j in 0..=n {
        for i in 0..=n {
            let (x, y) = (i as f64 / n as f64, j as f64 / n as f64);
            let z = 0.25 * (std::f64::consts::PI * x).sin() * (std::f64::consts::PI * y).sin();
            vertices.push(Point3::new(x, y, z));
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;

            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    build_from_triangles(&vertices, &faces).unwrap()
}

fn bench_angle_solve(c: &mut Criterion) {
    let mesh = create_bumped_grid(20);
    let options = UnfoldOptions::default();

    c.bench_function("angle_solve_20x20", |b| {
        b.iter(|| corrected_angles(&mesh, &options).unwrap());
    });
}

fn bench_segmentation(c: &mut Criterion) {
    let mesh = create_bumped_grid(50);

    c.bench_function("segment_50x50", |b| {
        b.iter(|| segment(&mesh));
    });
}

fn bench_unfold(c: &mut Criterion) {
    let mut group = c.benchmark_group("unfold");
    group.sample_size(10);

    for n in [10, 20] {
        let mesh = create_bumped_grid(n);
        let sequential = UnfoldOptions::default().with_parallel(false);
        group.bench_with_input(BenchmarkId::from_parameter(n), &mesh, |b, mesh| {
            b.iter(|| unfold(mesh, &sequential).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_angle_solve, bench_segmentation, bench_unfold);
criterion_main!(benches);
