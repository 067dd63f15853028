// Copyright 2026 the Tracegrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Blocks: the polygons models rasterize into the index.

use alloc::vec::Vec;
use kurbo::Point;
use tracegrid_index::{Error, PixelPoint, Placement, SpatialIndex};

use crate::types::{BlockId, Color, LocalBlock, ModelId, Pose, ZRange};

/// A polygon with a vertical extent, owned by one model.
///
/// While mapped, a block remembers the [`Placement`] of every cell it was
/// written to, so unmapping costs time proportional to its own footprint.
#[derive(Clone, Debug)]
pub struct Block {
    id: BlockId,
    model: ModelId,
    pub(crate) local: LocalBlock,
    global_z: ZRange,
    footprint: Vec<Placement>,
    mapped: bool,
}

/// Reusable buffers for rasterizing blocks.
#[derive(Clone, Debug, Default)]
pub(crate) struct Scratch {
    pub(crate) points: Vec<Point>,
    pub(crate) pixels: Vec<PixelPoint>,
}

impl Block {
    pub(crate) fn new(id: BlockId, model: ModelId, local: LocalBlock) -> Self {
        Self {
            id,
            model,
            local,
            global_z: ZRange::default(),
            footprint: Vec::new(),
            mapped: false,
        }
    }

    /// This block's id.
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// The owning model.
    pub fn model(&self) -> ModelId {
        self.model
    }

    /// Local geometry as last set.
    pub fn local(&self) -> &LocalBlock {
        &self.local
    }

    /// World-frame vertical extent as of the last mapping.
    pub fn global_z(&self) -> ZRange {
        self.global_z
    }

    /// Where the block is currently written. Empty while unmapped.
    pub fn footprint(&self) -> &[Placement] {
        &self.footprint
    }

    /// Whether the block is currently in the index.
    pub fn is_mapped(&self) -> bool {
        self.mapped
    }

    /// Effective color given the owner's color.
    pub fn color(&self, owner: Color) -> Color {
        if self.local.inherit_color {
            owner
        } else {
            self.local.color
        }
    }

    /// World-frame polygon vertices at the given owner pose.
    pub(crate) fn world_points(&self, pose: &Pose, out: &mut Vec<Point>) {
        let tf = pose.to_affine();
        out.clear();
        out.extend(self.local.points.iter().map(|&p| tf * p));
    }

    /// Write the block into the index at the owner's global pose.
    ///
    /// On error the block stays unmapped and the index is unchanged.
    pub(crate) fn map(
        &mut self,
        pose: &Pose,
        index: &mut SpatialIndex<BlockId>,
        scratch: &mut Scratch,
    ) -> Result<(), Error> {
        assert!(!self.mapped, "block {:?} is already mapped", self.id);
        self.world_points(pose, &mut scratch.points);
        index.insert_polygon(
            &scratch.points,
            self.id,
            &mut self.footprint,
            &mut scratch.pixels,
        )?;
        self.global_z = self.local.z.offset(pose.z);
        self.mapped = true;
        Ok(())
    }

    /// Remove the block from every cell it was written to.
    pub(crate) fn unmap(&mut self, index: &mut SpatialIndex<BlockId>) {
        assert!(self.mapped, "block {:?} is not mapped", self.id);
        index.remove_all(&mut self.footprint, self.id);
        self.mapped = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracegrid_index::GridConfig;

    fn ids() -> (BlockId, ModelId) {
        (BlockId::new(0, 1), ModelId::new(0, 1))
    }

    #[test]
    fn map_records_footprint_and_height() {
        let mut index = SpatialIndex::new(GridConfig::new(10.0)).unwrap();
        let mut scratch = Scratch::default();
        let (bid, mid) = ids();
        let mut b = Block::new(
            bid,
            mid,
            LocalBlock::rect(0.0, 0.0, 1.0, 1.0).with_z(ZRange::new(0.0, 0.5)),
        );
        b.map(&Pose::new(2.0, 0.0, 0.25, 0.0), &mut index, &mut scratch)
            .unwrap();
        assert!(b.is_mapped());
        assert_eq!(b.footprint().len(), 121);
        assert_eq!(b.global_z(), ZRange::new(0.25, 0.75));
        assert!(index.cell(PixelPoint::new(25, 5)).unwrap().contains(bid));
        assert!(index.cell(PixelPoint::new(5, 5)).is_none_or(|c| c.is_empty()));

        b.unmap(&mut index);
        assert!(!b.is_mapped());
        assert!(b.footprint().is_empty());
        assert_eq!(index.occupancy(), 0);
    }

    #[test]
    #[should_panic(expected = "is not mapped")]
    fn unmapping_twice_panics() {
        let mut index = SpatialIndex::new(GridConfig::new(10.0)).unwrap();
        let (bid, mid) = ids();
        let mut b = Block::new(bid, mid, LocalBlock::rect(0.0, 0.0, 1.0, 1.0));
        b.map(&Pose::ORIGIN, &mut index, &mut Scratch::default())
            .unwrap();
        b.unmap(&mut index);
        b.unmap(&mut index);
    }

    #[test]
    fn zero_area_block_maps_to_nothing() {
        let mut index = SpatialIndex::new(GridConfig::new(10.0)).unwrap();
        let (bid, mid) = ids();
        let mut b = Block::new(bid, mid, LocalBlock::rect(0.0, 0.0, 1.0, 0.0));
        b.map(&Pose::ORIGIN, &mut index, &mut Scratch::default())
            .unwrap();
        assert!(b.is_mapped());
        assert!(b.footprint().is_empty());
        assert_eq!(index.occupancy(), 0);
        b.unmap(&mut index);
    }

    #[test]
    fn color_inheritance() {
        let (bid, mid) = ids();
        let own = Block::new(bid, mid, LocalBlock::default().with_color(Color::BLUE));
        let inherit = Block::new(bid, mid, LocalBlock::default());
        assert_eq!(own.color(Color::GREEN), Color::BLUE);
        assert_eq!(inherit.color(Color::GREEN), Color::GREEN);
    }
}
