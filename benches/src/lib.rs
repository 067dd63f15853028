// Copyright 2026 the Tracegrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scenes shared by the tracegrid benchmarks.

use tracegrid_world::{Error, GridConfig, LocalBlock, LocalModel, ModelId, Pose, World};

/// A square room of `side` meters with `boxes × boxes` crates on a lattice
/// inside it, and a robot between the first two rows.
///
/// Returns the world and the robot.
pub fn warehouse(resolution: f64, side: f64, boxes: u32) -> Result<(World, ModelId), Error> {
    let mut world = World::new(GridConfig::new(resolution))?;
    let walls = world.add_model(None, LocalModel::default());
    let t = 0.1;
    for wall in [
        LocalBlock::rect(0.0, 0.0, side, t),
        LocalBlock::rect(0.0, side - t, side, side),
        LocalBlock::rect(0.0, 0.0, t, side),
        LocalBlock::rect(side - t, 0.0, side, side),
    ] {
        world.add_block(walls, wall)?;
    }

    let pitch = side / f64::from(boxes + 1);
    for i in 1..=boxes {
        for j in 1..=boxes {
            let m = world.add_model(
                None,
                LocalModel {
                    pose: Pose::new(f64::from(i) * pitch, f64::from(j) * pitch, 0.0, 0.3),
                    ..LocalModel::default()
                },
            );
            world.add_block(m, LocalBlock::rect(-0.2, -0.2, 0.2, 0.2))?;
        }
    }

    let robot = world.add_model(
        None,
        LocalModel {
            pose: Pose::new(1.5 * pitch, 1.5 * pitch, 0.0, 0.0),
            ..LocalModel::default()
        },
    );
    world.add_block(robot, LocalBlock::rect(-0.15, -0.15, 0.15, 0.15))?;
    Ok((world, robot))
}
