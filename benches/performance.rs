// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use meshwright::geometry::shapes;
use meshwright::modeling::loft::loft;
use meshwright::modeling::{LoftOptions, RoundCorner, RoundCornerOptions, SubD, SubdivisionOptions, Weld, WeldOptions};
use meshwright::{Curve, Primitive, Vec3};

fn bench_primitives(c: &mut Criterion) {
    let mut group = c.benchmark_group("primitives");

    group.bench_function("cube", |b| {
        b.iter(|| Primitive::cube(black_box(10.0), 10.0, 10.0).to_solid(&Vec3::zeros()).unwrap());
    });

    for segments in [16usize, 32, 64] {
        group.bench_with_input(BenchmarkId::new("sphere", segments), &segments, |b, &segments| {
            b.iter(|| {
                Primitive::sphere(black_box(5.0), segments, segments / 2)
                    .to_solid(&Vec3::zeros())
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_heal(c: &mut Criterion) {
    let mut group = c.benchmark_group("heal");
    let sphere = Primitive::sphere(5.0, 64, 32).to_solid(&Vec3::zeros()).unwrap();

    group.bench_function("sphere_64", |b| {
        b.iter(|| {
            let mut mesh = sphere.mesh().clone();
            mesh.heal(black_box(1e-5), 1e-5);
            mesh
        });
    });

    group.bench_function("weld_sphere_64", |b| {
        b.iter(|| {
            let mut solid = sphere.clone();
            Weld::apply_solid(&mut solid, black_box(&WeldOptions::default())).unwrap();
            solid
        });
    });

    group.finish();
}

fn bench_subdivide(c: &mut Criterion) {
    let mut group = c.benchmark_group("subdivide");
    let cube = Primitive::cube(1.0, 1.0, 1.0).to_solid(&Vec3::zeros()).unwrap();

    for levels in [1usize, 2, 3] {
        group.bench_with_input(BenchmarkId::new("cube", levels), &levels, |b, &levels| {
            let options = SubdivisionOptions {
                levels,
                ..Default::default()
            };
            b.iter(|| {
                let mut solid = cube.clone();
                SubD::subdivide(&mut solid, black_box(&options)).unwrap();
                solid
            });
        });
    }

    group.finish();
}

fn bench_curves(c: &mut Criterion) {
    let mut group = c.benchmark_group("curves");
    let square = Curve::create_from_points(&shapes::rectangle(&Vec3::zeros(), 2.0, 2.0), None).unwrap();
    let circle = Curve::create_from_points(
        &shapes::circle(&Vec3::new(0.0, 3.0, 0.0), &Vec3::new(1.0, 3.0, 0.0), 32),
        None,
    )
    .unwrap();

    group.bench_function("fillet_square", |b| {
        let options = RoundCornerOptions::default();
        b.iter(|| RoundCorner::create_filleted(black_box(&square), &options).unwrap());
    });

    group.bench_function("loft_square_to_circle", |b| {
        let options = LoftOptions {
            sections: 16,
            ..Default::default()
        };
        b.iter(|| loft(black_box(&square), &circle, &options).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_primitives, bench_heal, bench_subdivide, bench_curves);
criterion_main!(benches);
