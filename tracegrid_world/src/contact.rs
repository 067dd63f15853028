// Copyright 2026 the Tracegrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collision and contact queries.

use alloc::vec::Vec;
use hashbrown::HashSet;

use crate::block::Scratch;
use crate::model::Model;
use crate::types::{ModelId, Pose, Visibility};
use crate::world::World;

impl World {
    /// The first unrelated obstacle overlapping `id` or any of its
    /// descendants at their current poses.
    ///
    /// Only models flagged [`Visibility::OBSTACLE`] collide, on both sides of
    /// the test, and only when their blocks' height ranges overlap. Returns
    /// `None` for stale ids.
    pub fn test_collision(&self, id: ModelId) -> Option<ModelId> {
        let model = self.model(id)?;
        self.collision_in_subtree(model, model.global_pose(), &mut Scratch::default())
    }

    /// Like [`test_collision`](Self::test_collision), with `id` placed at
    /// `pose` relative to its parent instead of its current pose.
    ///
    /// Nothing is remapped: the hypothetical footprint is rasterized into a
    /// scratch buffer and checked against the index as it is.
    pub fn test_collision_at(&self, id: ModelId, pose: Pose) -> Option<ModelId> {
        let model = self.model(id)?;
        let global = match model.parent() {
            Some(parent) => self.model_ref(parent).global_pose().compose(pose),
            None => pose,
        };
        self.collision_in_subtree(model, global, &mut Scratch::default())
    }

    /// Every unrelated model with a block sharing a cell with one of the
    /// blocks of `id`, sorted by id.
    ///
    /// Visibility flags are not consulted. Returns an empty list for stale
    /// ids.
    pub fn touching_models(&self, id: ModelId) -> Vec<ModelId> {
        let Some(model) = self.model(id) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        for &bid in model.blocks() {
            for &placement in self.block_ref(bid).footprint() {
                let Some(cell) = self.index.placement_cell(placement) else {
                    continue;
                };
                for other in cell.iter() {
                    let owner = self.model_ref(self.block_ref(other).model());
                    if !model.is_related(owner) {
                        seen.insert(owner.id());
                    }
                }
            }
        }
        let mut out: Vec<_> = seen.into_iter().collect();
        out.sort_unstable();
        out
    }

    fn collision_in_subtree(
        &self,
        model: &Model,
        global: Pose,
        scratch: &mut Scratch,
    ) -> Option<ModelId> {
        if model.visibility().contains(Visibility::OBSTACLE) {
            for &bid in model.blocks() {
                let block = self.block_ref(bid);
                block.world_points(&global, &mut scratch.points);
                self.index.polygon_pixels(&scratch.points, &mut scratch.pixels);
                let z = block.local().z.offset(global.z);
                for &p in &scratch.pixels {
                    let Some(cell) = self.index.cell(p) else {
                        continue;
                    };
                    for other in cell.iter() {
                        let candidate = self.block_ref(other);
                        let owner = self.model_ref(candidate.model());
                        if owner.visibility().contains(Visibility::OBSTACLE)
                            && !model.is_related(owner)
                            && candidate.global_z().overlaps(&z)
                        {
                            return Some(owner.id());
                        }
                    }
                }
            }
        }
        for &child in model.children() {
            let child = self.model_ref(child);
            let pose = global.compose(child.pose());
            if let Some(hit) = self.collision_in_subtree(child, pose, scratch) {
                return Some(hit);
            }
        }
        None
    }
}
