// Copyright 2026 the Tracegrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracegrid World: simulated objects mapped into an occupancy grid, with
//! raytracing and collision queries.
//!
//! A [`World`] holds **models** (posed objects arranged in parent/child
//! hierarchies) and their **blocks** (polygons with a height range). Every
//! block is rasterized into a [`tracegrid_index::SpatialIndex`] at its
//! owner's global pose and kept there as the model moves, so queries read the
//! grid directly:
//!
//! - [`World::raytrace`] and [`World::raytrace_fan`] walk rays pixel by pixel
//!   and return the nearest block a [`RayPredicate`] accepts.
//! - [`World::test_collision`] and [`World::test_collision_at`] check a
//!   model's footprint against unrelated obstacles.
//! - [`World::touching_models`] lists the models sharing cells with a model.
//!
//! Models in the same hierarchy are *related* and never see or collide with
//! each other through the stock [`predicates`].
//!
//! ## Timesteps
//!
//! Moving models needs `&mut World` and sensing needs `&World`. Apply every
//! pose change first with [`World::apply_poses`], then run sensors with
//! [`World::sense`]; the borrow checker keeps the two phases apart.
//!
//! ```rust
//! use core::f64::consts::PI;
//! use tracegrid_world::{
//!     GridConfig, LocalBlock, LocalModel, Pose, Ray, Visibility, World, predicates,
//! };
//!
//! let mut world = World::new(GridConfig::default()).unwrap();
//! let wall = world.add_model(None, LocalModel::default());
//! world.add_block(wall, LocalBlock::rect(3.0, -2.0, 3.2, 2.0)).unwrap();
//! let robot = world.add_model(None, LocalModel::default());
//! world.add_block(robot, LocalBlock::rect(-0.2, -0.2, 0.2, 0.2)).unwrap();
//!
//! // Mutate, then sense.
//! world.apply_poses([(robot, Pose::new(1.0, 0.0, 0.0, 0.0))]).unwrap();
//! let scans = world.sense(&[robot], |world, id| {
//!     let pose = world.model(id).unwrap().global_pose();
//!     let ray = Ray::new(Pose { z: 0.5, ..pose }, 8.0).with_finder(id);
//!     world.raytrace_fan(&ray, PI / 2.0, 5, &predicates::returns(Visibility::RANGER))
//! });
//!
//! // The middle beam points straight at the wall, two meters away.
//! let middle = scans[0][2];
//! assert_eq!(middle.model(), Some(wall));
//! assert!((middle.range - 2.0).abs() < 0.05);
//! ```
//!
//! ## Features
//!
//! - `std` *(default)*: use the standard library for float math.
//! - `libm`: float math for `no_std` targets.
//! - `serde`: `Serialize`/`Deserialize` for poses, colors, height ranges,
//!   visibility flags and [`GridConfig`].
//! - `rayon`: evaluate ray fans and the sensing phase in parallel.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod arena;
mod block;
mod contact;
mod model;
pub mod predicates;
mod raytrace;
mod types;
mod world;

pub use block::Block;
pub use model::Model;
pub use raytrace::{Ray, RayHit, RayPredicate, RaytraceResult};
pub use types::{
    BlockId, Color, LocalBlock, LocalModel, ModelId, Pose, Visibility, ZRange, normalize_angle,
};
pub use world::World;

pub use tracegrid_index::{Error, GridConfig};
