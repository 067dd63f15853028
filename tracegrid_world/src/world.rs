// Copyright 2026 the Tracegrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The world: model and block storage synchronized with the spatial index.

use alloc::vec::Vec;
use kurbo::Rect;
use tracegrid_index::{Error, GridConfig, SpatialIndex};

use crate::arena::Arena;
use crate::block::{Block, Scratch};
use crate::model::Model;
use crate::types::{BlockId, Color, LocalBlock, LocalModel, ModelId, Pose, Visibility};

/// Models, their blocks, and the spatial index the blocks are mapped into.
///
/// Unlike a batched scene graph, changes take effect immediately: adding a
/// block or moving a model rewrites the index before the call returns, so
/// the next query sees it.
///
/// Mutation needs `&mut World` and queries need `&World`. A timestep that
/// first applies every pose change ([`World::apply_poses`]) and then runs
/// every sensor ([`World::sense`]) therefore never races, even when the
/// sensing phase runs in parallel.
///
/// ## Example
///
/// ```rust
/// use tracegrid_world::{GridConfig, LocalBlock, LocalModel, Pose, Ray, World, predicates};
///
/// let mut world = World::new(GridConfig::new(100.0)).unwrap();
/// let wall = world.add_model(None, LocalModel::default());
/// world.add_block(wall, LocalBlock::rect(0.0, 0.0, 1.0, 1.0)).unwrap();
///
/// let ray = Ray::new(Pose::new(-1.0, 0.5, 0.5, 0.0), 5.0);
/// let hit = world.raytrace(&ray, &predicates::any_other());
/// assert_eq!(hit.model(), Some(wall));
/// assert!((hit.range - 1.0).abs() <= 0.01);
/// ```
pub struct World {
    pub(crate) index: SpatialIndex<BlockId>,
    pub(crate) models: Arena<Model>,
    pub(crate) blocks: Arena<Block>,
    scratch: Scratch,
}

impl core::fmt::Debug for World {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("World")
            .field("models", &self.models.len())
            .field("blocks", &self.blocks.len())
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl World {
    /// Create an empty world.
    pub fn new(config: GridConfig) -> Result<Self, Error> {
        Ok(Self {
            index: SpatialIndex::new(config)?,
            models: Arena::default(),
            blocks: Arena::default(),
            scratch: Scratch::default(),
        })
    }

    /// The spatial index, for diagnostics and drawing.
    pub fn index(&self) -> &SpatialIndex<BlockId> {
        &self.index
    }

    /// Pixels per meter.
    pub fn resolution(&self) -> f64 {
        self.index.resolution()
    }

    /// Extent of the grid storage created so far, in meters.
    ///
    /// Grows in whole super-regions as blocks are mapped into new areas.
    pub fn bounds(&self) -> Option<Rect> {
        self.index.world_bounds()
    }

    // --- models ---

    /// Add a model as a child of `parent` (or as a root if `None`).
    ///
    /// # Panics
    ///
    /// If `parent` is stale.
    pub fn add_model(&mut self, parent: Option<ModelId>, local: LocalModel) -> ModelId {
        let link = parent.map(|p| {
            let pm = self.model_ref(p);
            (p, pm.root, pm.global_pose)
        });
        let (idx, generation) = self
            .models
            .insert_with(|idx, generation| Model::new(ModelId::new(idx, generation), link, local));
        let id = ModelId::new(idx, generation);
        if let Some(p) = parent {
            self.model_mut(p).children.push(id);
        }
        log::debug!("added model {id:?} under {parent:?}");
        id
    }

    /// Remove a model, its descendants, and all their blocks.
    ///
    /// Every block is unmapped before it is dropped. Stale ids are ignored.
    pub fn remove_model(&mut self, id: ModelId) {
        if !self.is_alive(id) {
            return;
        }
        let children = self.model_ref(id).children.clone();
        for child in children {
            self.remove_model(child);
        }
        let blocks = core::mem::take(&mut self.model_mut(id).blocks);
        for bid in blocks {
            if let Some(mut block) = self.blocks.remove(bid.idx(), bid.1)
                && block.is_mapped()
            {
                block.unmap(&mut self.index);
            }
        }
        let parent = self.model_ref(id).parent;
        if let Some(parent) = parent
            && let Some(p) = self.models.get_mut(parent.idx(), parent.1)
        {
            p.children.retain(|c| *c != id);
        }
        self.models.remove(id.idx(), id.1);
        log::debug!("removed model {id:?}");
    }

    /// Returns true if `id` refers to a live model.
    pub fn is_alive(&self, id: ModelId) -> bool {
        self.models.is_alive(id.idx(), id.1)
    }

    /// A live model, or `None` for stale ids.
    pub fn model(&self, id: ModelId) -> Option<&Model> {
        self.models.get(id.idx(), id.1)
    }

    /// All live models.
    pub fn models(&self) -> impl Iterator<Item = &Model> + '_ {
        self.models.iter()
    }

    /// Set a model's pose relative to its parent.
    ///
    /// Recomputes the global pose of the model and its descendants and remaps
    /// their mapped blocks; unmapped blocks stay unmapped. Stale ids are
    /// ignored. On allocation failure the block being mapped is left unmapped
    /// and blocks not yet reached keep their previous mapping.
    pub fn set_pose(&mut self, id: ModelId, pose: Pose) -> Result<(), Error> {
        let Some(m) = self.models.get_mut(id.idx(), id.1) else {
            return Ok(());
        };
        m.local.pose = pose;
        let parent_pose = m.parent.map(|p| self.model_ref(p).global_pose);
        self.update_subtree(id, parent_pose)
    }

    /// Update a model's color.
    pub fn set_color(&mut self, id: ModelId, color: Color) {
        if let Some(m) = self.models.get_mut(id.idx(), id.1) {
            m.local.color = color;
        }
    }

    /// Update a model's visibility flags.
    pub fn set_visibility(&mut self, id: ModelId, visibility: Visibility) {
        if let Some(m) = self.models.get_mut(id.idx(), id.1) {
            m.local.visibility = visibility;
        }
    }

    // --- blocks ---

    /// Add a block to a model and map it at the model's current pose.
    ///
    /// # Panics
    ///
    /// If `model` is stale.
    pub fn add_block(&mut self, model: ModelId, local: LocalBlock) -> Result<BlockId, Error> {
        let pose = self.model_ref(model).global_pose;
        let (idx, generation) = self
            .blocks
            .insert_with(|idx, generation| Block::new(BlockId::new(idx, generation), model, local));
        let id = BlockId::new(idx, generation);
        if let Err(e) = self.remap_block(id, &pose) {
            self.blocks.remove(id.idx(), id.1);
            return Err(e);
        }
        self.model_mut(model).blocks.push(id);
        log::trace!("added block {id:?} to model {model:?}");
        Ok(id)
    }

    /// Unmap and drop a block, returning its geometry. Stale ids return `None`.
    pub fn remove_block(&mut self, id: BlockId) -> Option<LocalBlock> {
        let mut block = self.blocks.remove(id.idx(), id.1)?;
        if block.is_mapped() {
            block.unmap(&mut self.index);
        }
        let owner = block.model();
        if let Some(m) = self.models.get_mut(owner.idx(), owner.1) {
            m.blocks.retain(|&b| b != id);
        }
        log::trace!("removed block {id:?}");
        Some(block.local)
    }

    /// A live block, or `None` for stale ids.
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.idx(), id.1)
    }

    /// Replace a block's local geometry, remapping it if it is mapped.
    ///
    /// Stale ids are ignored.
    pub fn set_block_geometry(&mut self, id: BlockId, local: LocalBlock) -> Result<(), Error> {
        let Some(block) = self.blocks.get_mut(id.idx(), id.1) else {
            return Ok(());
        };
        block.local = local;
        if !block.is_mapped() {
            return Ok(());
        }
        let owner = block.model();
        let pose = self.model_ref(owner).global_pose;
        self.remap_block(id, &pose)
    }

    /// Map a block at its owner's current pose, replacing any existing
    /// mapping.
    ///
    /// # Panics
    ///
    /// If `id` is stale.
    pub fn map_block(&mut self, id: BlockId) -> Result<(), Error> {
        let owner = self.block_ref(id).model();
        let pose = self.model_ref(owner).global_pose;
        self.remap_block(id, &pose)
    }

    /// Remove a block from the index, keeping it in its model.
    ///
    /// # Panics
    ///
    /// If `id` is stale or the block is not mapped.
    pub fn unmap_block(&mut self, id: BlockId) {
        let block = self.blocks.get_mut(id.idx(), id.1).expect("dangling BlockId");
        block.unmap(&mut self.index);
    }

    /// Effective color of a block: its own, or its owner's when inherited.
    pub fn block_color(&self, id: BlockId) -> Option<Color> {
        let block = self.block(id)?;
        let owner = self.model(block.model())?;
        Some(block.color(owner.color()))
    }

    // --- phases ---

    /// Mutation phase of a timestep: apply every pose update in order.
    ///
    /// Stops at the first allocation failure; see [`World::set_pose`].
    pub fn apply_poses<I>(&mut self, updates: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = (ModelId, Pose)>,
    {
        for (id, pose) in updates {
            self.set_pose(id, pose)?;
        }
        Ok(())
    }

    /// Query phase of a timestep: run `sense` once per sensor model.
    ///
    /// The world is borrowed immutably for the whole phase. With the `rayon`
    /// feature the sensors run in parallel; results are returned in the order
    /// of `sensors` either way.
    #[cfg(feature = "rayon")]
    pub fn sense<R, F>(&self, sensors: &[ModelId], sense: F) -> Vec<R>
    where
        R: Send,
        F: Fn(&Self, ModelId) -> R + Sync,
    {
        use rayon::prelude::*;
        sensors.par_iter().map(|&id| sense(self, id)).collect()
    }

    /// Query phase of a timestep: run `sense` once per sensor model.
    ///
    /// The world is borrowed immutably for the whole phase. With the `rayon`
    /// feature the sensors run in parallel; results are returned in the order
    /// of `sensors` either way.
    #[cfg(not(feature = "rayon"))]
    pub fn sense<R, F>(&self, sensors: &[ModelId], sense: F) -> Vec<R>
    where
        R: Send,
        F: Fn(&Self, ModelId) -> R + Sync,
    {
        sensors.iter().map(|&id| sense(self, id)).collect()
    }

    // --- internals ---

    /// Access a model; panics if `id` is stale.
    pub(crate) fn model_ref(&self, id: ModelId) -> &Model {
        self.models.get(id.idx(), id.1).expect("dangling ModelId")
    }

    fn model_mut(&mut self, id: ModelId) -> &mut Model {
        self.models.get_mut(id.idx(), id.1).expect("dangling ModelId")
    }

    /// Access a block; panics if `id` is stale.
    pub(crate) fn block_ref(&self, id: BlockId) -> &Block {
        self.blocks.get(id.idx(), id.1).expect("dangling BlockId")
    }

    fn remap_block(&mut self, id: BlockId, pose: &Pose) -> Result<(), Error> {
        let block = self.blocks.get_mut(id.idx(), id.1).expect("dangling BlockId");
        if block.is_mapped() {
            block.unmap(&mut self.index);
        }
        block.map(pose, &mut self.index, &mut self.scratch)
    }

    fn update_subtree(&mut self, id: ModelId, parent_pose: Option<Pose>) -> Result<(), Error> {
        let pose = {
            let m = self.model_mut(id);
            m.global_pose = match parent_pose {
                Some(p) => p.compose(m.local.pose),
                None => m.local.pose,
            };
            m.global_pose
        };
        for i in 0..self.model_ref(id).blocks.len() {
            let bid = self.model_ref(id).blocks[i];
            if self.block_ref(bid).is_mapped() {
                self.remap_block(bid, &pose)?;
            }
        }
        for i in 0..self.model_ref(id).children.len() {
            let child = self.model_ref(id).children[i];
            self.update_subtree(child, Some(pose))?;
        }
        Ok(())
    }
}
