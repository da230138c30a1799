//! Benchmarks for the quality and transform kernels and one smoothing sweep.

use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::Point3;

use hexsmooth::algo::quality::mean_ratio;
use hexsmooth::algo::smooth::{simultaneous_smooth, SimultaneousOptions};
use hexsmooth::algo::transform::dual_transform;
use hexsmooth::mesh::{BlockMesh, Connectivity, HexCell};

/// n x n x n grid of unit cubes with jittered interior points.
fn create_grid_mesh(n: usize) -> BlockMesh {
    let stride = n + 1;
    let mut points = Vec::with_capacity(stride * stride * stride);
    for k in 0..=n {
        for j in 0..=n {
            for i in 0..=n {
                // Deterministic jitter keeps interior cells imperfect.
                let interior =
                    |v: usize| -> f64 { if v > 0 && v < n { 0.2 } else { 0.0 } };
                points.push(Point3::new(
                    i as f64 + 0.3 * interior(i),
                    j as f64 + 0.2 * interior(j),
                    k as f64 + 0.1 * interior(k),
                ));
            }
        }
    }

    let index = |i: usize, j: usize, k: usize| k * stride * stride + j * stride + i;
    let mut cells = Vec::with_capacity(n * n * n);
    for k in 0..n {
        for j in 0..n {
            for i in 0..n {
                cells.push(HexCell::from_indices([
                    index(i, j, k),
                    index(i + 1, j, k),
                    index(i + 1, j + 1, k),
                    index(i, j + 1, k),
                    index(i, j, k + 1),
                    index(i + 1, j, k + 1),
                    index(i + 1, j + 1, k + 1),
                    index(i, j + 1, k + 1),
                ]));
            }
        }
    }

    BlockMesh::new(points, cells, Vec::new()).unwrap()
}

fn skewed_hex() -> [Point3<f64>; 8] {
    [
        Point3::new(0.3, 0.3, 0.3),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(1.0, 0.0, 1.0),
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(0.0, 1.0, 1.0),
    ]
}

fn bench_kernels(c: &mut Criterion) {
    let hex = skewed_hex();

    c.bench_function("mean_ratio", |b| {
        b.iter(|| mean_ratio(std::hint::black_box(&hex)));
    });

    c.bench_function("dual_transform", |b| {
        b.iter(|| dual_transform(std::hint::black_box(&hex), 0.3, 0.5));
    });
}

fn bench_sweep(c: &mut Criterion) {
    let mesh = create_grid_mesh(10);
    let connectivity = Connectivity::build(&mesh);
    let options = SimultaneousOptions::default().with_sweeps(1).single_threaded();

    c.bench_function("simultaneous_sweep_1000_cells", |b| {
        b.iter_batched(
            || mesh.clone(),
            |mut mesh| simultaneous_smooth(&mut mesh, &connectivity, &options),
            criterion::BatchSize::LargeInput,
        );
    });
}

fn bench_connectivity(c: &mut Criterion) {
    let mesh = create_grid_mesh(10);

    c.bench_function("connectivity_build_1000_cells", |b| {
        b.iter(|| Connectivity::build(std::hint::black_box(&mesh)));
    });
}

criterion_group!(benches, bench_kernels, bench_sweep, bench_connectivity);
criterion_main!(benches);
