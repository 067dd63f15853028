// Copyright 2026 the Tracegrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Laser sweep demo: a robot drives around a room and scans it every step.
//!
//! Each timestep first moves every robot (mutation phase) and then runs every
//! laser (query phase), printing the nearest return and any collision.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p tracegrid_demos -- --steps 8`

use core::f64::consts::PI;

use clap::Parser;
use tracegrid_world::{
    Color, Error, GridConfig, LocalBlock, LocalModel, ModelId, Pose, Ray, RaytraceResult,
    Visibility, World, ZRange, predicates,
};

/// Sweep simulated lasers through a small room.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Grid resolution in pixels per meter.
    #[arg(short, long, default_value_t = 50.0)]
    resolution: f64,

    /// Number of robots driving around the room.
    #[arg(long, default_value_t = 2)]
    robots: u32,

    /// Beams per laser scan.
    #[arg(long, default_value_t = 181)]
    samples: usize,

    /// Laser field of view in degrees.
    #[arg(long, default_value_t = 180.0)]
    fov: f64,

    /// Laser range in meters.
    #[arg(long, default_value_t = 8.0)]
    range: f64,

    /// Timesteps to simulate.
    #[arg(short, long, default_value_t = 16)]
    steps: u32,
}

struct Robot {
    body: ModelId,
    laser: ModelId,
    /// Center of the circle the robot drives on.
    center: (f64, f64),
    radius: f64,
}

fn build_room(world: &mut World) -> Result<(), Error> {
    let walls = world.add_model(
        None,
        LocalModel {
            color: Color::rgb(0.3, 0.3, 0.3),
            ..LocalModel::default()
        },
    );
    for wall in [
        LocalBlock::rect(0.0, 0.0, 10.0, 0.1),
        LocalBlock::rect(0.0, 9.9, 10.0, 10.0),
        LocalBlock::rect(0.0, 0.0, 0.1, 10.0),
        LocalBlock::rect(9.9, 0.0, 10.0, 10.0),
    ] {
        world.add_block(walls, wall)?;
    }

    // A table the lasers pass under, and a pillar they cannot.
    let table = world.add_model(None, LocalModel::default());
    world.add_block(
        table,
        LocalBlock::rect(6.0, 6.0, 7.5, 7.0).with_z(ZRange::new(0.7, 0.8)),
    )?;
    let pillar = world.add_model(
        None,
        LocalModel {
            color: Color::BLUE,
            ..LocalModel::default()
        },
    );
    world.add_block(pillar, LocalBlock::rect(4.8, 4.8, 5.2, 5.2))?;

    // Glass: seen by blob finders, not by lasers.
    let glass = world.add_model(
        None,
        LocalModel {
            visibility: Visibility::OBSTACLE | Visibility::BLOB,
            ..LocalModel::default()
        },
    );
    world.add_block(glass, LocalBlock::rect(2.0, 7.0, 4.0, 7.05))?;
    Ok(())
}

fn add_robot(world: &mut World, i: u32) -> Result<Robot, Error> {
    let radius = 1.5 + f64::from(i % 3) * 0.8;
    let center = (5.0, 5.0);
    let body = world.add_model(
        None,
        LocalModel {
            pose: Pose::new(center.0 + radius, center.1, 0.0, PI / 2.0),
            color: Color::GREEN,
            ..LocalModel::default()
        },
    );
    world.add_block(body, LocalBlock::rect(-0.2, -0.15, 0.2, 0.15))?;
    let laser = world.add_model(
        Some(body),
        LocalModel {
            pose: Pose::new(0.15, 0.0, 0.3, 0.0),
            ..LocalModel::default()
        },
    );
    Ok(Robot {
        body,
        laser,
        center,
        radius,
    })
}

fn scan(world: &World, laser: ModelId, args: &Args) -> Vec<RaytraceResult> {
    let Some(model) = world.model(laser) else {
        return Vec::new();
    };
    let ray = Ray::new(model.global_pose(), args.range).with_finder(laser);
    world.raytrace_fan(
        &ray,
        args.fov.to_radians(),
        args.samples,
        &predicates::returns(Visibility::RANGER),
    )
}

fn run(args: &Args) -> Result<(), Error> {
    let mut world = World::new(GridConfig::new(args.resolution))?;
    build_room(&mut world)?;
    let robots = (0..args.robots)
        .map(|i| add_robot(&mut world, i))
        .collect::<Result<Vec<_>, _>>()?;
    log::info!(
        "world ready: {} models, {} occupied cell entries",
        world.models().count(),
        world.index().occupancy()
    );

    let lasers: Vec<ModelId> = robots.iter().map(|r| r.laser).collect();
    for step in 0..args.steps {
        let phase = f64::from(step) * 2.0 * PI / f64::from(args.steps.max(1));

        // Mutation phase.
        world.apply_poses(robots.iter().enumerate().map(|(i, r)| {
            #[allow(clippy::cast_precision_loss, reason = "robot counts are tiny")]
            let a = phase + i as f64 * PI / 3.0;
            let pose = Pose::new(
                r.center.0 + r.radius * a.cos(),
                r.center.1 + r.radius * a.sin(),
                0.0,
                a + PI / 2.0,
            );
            (r.body, pose)
        }))?;

        // Query phase.
        let scans = world.sense(&lasers, |world, laser| scan(world, laser, args));

        for (robot, beams) in robots.iter().zip(&scans) {
            let nearest = beams
                .iter()
                .min_by(|a, b| a.range.total_cmp(&b.range));
            let hits = beams.iter().filter(|r| r.is_hit()).count();
            let collision = world.test_collision(robot.body);
            match nearest {
                Some(r) => println!(
                    "step {step:3} robot {:?}: {hits}/{} returns, nearest {:.2} m at {:+.0}°, model {:?}, collision {collision:?}",
                    robot.body,
                    beams.len(),
                    r.range,
                    r.pose.a.to_degrees(),
                    r.model(),
                ),
                None => println!("step {step:3} robot {:?}: no beams", robot.body),
            }
        }
    }

    if let Some(bounds) = world.bounds() {
        log::info!("grid storage covers {bounds:?}");
    }
    log::info!(
        "{} regions pooled for reuse",
        world.index().pooled_regions()
    );
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(e) = run(&args) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
