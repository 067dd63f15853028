// Copyright 2026 the Tracegrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for mapping churn and raytracing.

use core::f64::consts::PI;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tracegrid_benches::warehouse;
use tracegrid_world::{LocalBlock, Pose, Ray, Visibility, predicates};

fn bench_move_robot(c: &mut Criterion) {
    let mut group = c.benchmark_group("move_robot");
    for resolution in [20.0, 50.0, 100.0] {
        let (mut world, robot) = warehouse(resolution, 20.0, 8).unwrap();
        let start = world.model(robot).unwrap().pose();
        let mut step = 0_u32;
        group.bench_with_input(
            BenchmarkId::from_parameter(resolution),
            &resolution,
            |b, _| {
                b.iter(|| {
                    step = step.wrapping_add(1);
                    let a = f64::from(step % 64) * PI / 32.0;
                    let pose =
                        Pose::new(start.x + 0.3 * a.cos(), start.y + 0.3 * a.sin(), 0.0, a);
                    world.set_pose(robot, black_box(pose)).unwrap();
                });
            },
        );
    }
    group.finish();
}

fn bench_add_remove_blocks(c: &mut Criterion) {
    let (mut world, robot) = warehouse(50.0, 20.0, 4).unwrap();
    c.bench_function("add_remove_block", |b| {
        b.iter(|| {
            let id = world
                .add_block(robot, LocalBlock::rect(0.2, -0.1, 0.6, 0.1))
                .unwrap();
            black_box(world.remove_block(id));
        });
    });
}

fn bench_laser_fan(c: &mut Criterion) {
    let mut group = c.benchmark_group("laser_fan");
    let (world, robot) = warehouse(50.0, 20.0, 8).unwrap();
    let pose = world.model(robot).unwrap().global_pose();
    let ray = Ray::new(Pose { z: 0.5, ..pose }, 8.0).with_finder(robot);
    let predicate = predicates::returns(Visibility::RANGER);
    for samples in [180, 360, 1080] {
        group.bench_with_input(
            BenchmarkId::from_parameter(samples),
            &samples,
            |b, &samples| {
                b.iter(|| black_box(world.raytrace_fan(&ray, 2.0 * PI, samples, &predicate)));
            },
        );
    }
    group.finish();
}

fn bench_collision(c: &mut Criterion) {
    let (world, robot) = warehouse(50.0, 20.0, 8).unwrap();
    c.bench_function("test_collision", |b| {
        b.iter(|| black_box(world.test_collision(black_box(robot))));
    });
}

criterion_group!(
    benches,
    bench_move_robot,
    bench_add_remove_blocks,
    bench_laser_fan,
    bench_collision
);
criterion_main!(benches);
