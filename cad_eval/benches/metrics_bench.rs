//! Criterion benchmarks for the metric kernels.

use cad_eval::{chamfer_distance, volumetric_iou};
use cad_io::{box_mesh, sample_surface, Point3, TriangleMesh};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn two_boxes() -> (TriangleMesh, TriangleMesh) {
    let a = box_mesh(Point3::ZERO, Point3::splat(1.0));
    let b = box_mesh(Point3::splat(0.1), Point3::new(1.1, 0.9, 1.05));
    (a, b)
}

fn bench_chamfer(c: &mut Criterion) {
    let (a, b) = two_boxes();
    let mut group = c.benchmark_group("chamfer");

    for samples in [1024usize, 8192] {
        let pa = sample_surface(&a, samples, 0).unwrap();
        let pb = sample_surface(&b, samples, 1).unwrap();
        group.throughput(Throughput::Elements(2 * samples as u64));
        group.bench_with_input(BenchmarkId::from_parameter(samples), &samples, |bench, _| {
            bench.iter(|| black_box(chamfer_distance(black_box(&pa), black_box(&pb))))
        });
    }

    group.finish();
}

fn bench_iou(c: &mut Criterion) {
    let (a, b) = two_boxes();
    let mut group = c.benchmark_group("volumetric_iou");
    group.sample_size(20);

    group.bench_function("two_boxes", |bench| {
        bench.iter(|| black_box(volumetric_iou(black_box(&a), black_box(&b), 32)))
    });

    // Five components per side: every overlapping pair runs one boolean.
    let mut legs_a = a.clone();
    let mut legs_b = b.clone();
    for i in 1..5 {
        let offset = Point3::new(2.0 * i as f32, 0.0, 0.0);
        legs_a.append(&box_mesh(offset, offset + Point3::splat(1.0)));
        legs_b.append(&box_mesh(offset + Point3::splat(0.1), offset + Point3::splat(1.1)));
    }
    group.bench_function("five_components", |bench| {
        bench.iter(|| black_box(volumetric_iou(black_box(&legs_a), black_box(&legs_b), 32)))
    });

    group.finish();
}

criterion_group!(benches, bench_chamfer, bench_iou);
criterion_main!(benches);
