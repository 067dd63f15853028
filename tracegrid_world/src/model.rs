// Copyright 2026 the Tracegrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Models: the owners of blocks, arranged in a hierarchy.

use alloc::vec::Vec;
use smallvec::SmallVec;

use crate::types::{BlockId, Color, LocalModel, ModelId, Pose, Visibility};

/// A simulated object: a pose in a hierarchy plus the blocks it owns.
///
/// Models are read through [`World::model`](crate::World::model); all
/// mutation goes through the [`World`](crate::World).
#[derive(Clone, Debug)]
pub struct Model {
    pub(crate) id: ModelId,
    pub(crate) root: ModelId,
    pub(crate) parent: Option<ModelId>,
    pub(crate) children: SmallVec<[ModelId; 4]>,
    pub(crate) local: LocalModel,
    pub(crate) global_pose: Pose,
    pub(crate) blocks: Vec<BlockId>,
}

impl Model {
    /// `parent` carries the parent's id, root and global pose.
    pub(crate) fn new(
        id: ModelId,
        parent: Option<(ModelId, ModelId, Pose)>,
        local: LocalModel,
    ) -> Self {
        let (root, parent, global_pose) = match parent {
            Some((parent, root, parent_pose)) => {
                (root, Some(parent), parent_pose.compose(local.pose))
            }
            None => (id, None, local.pose),
        };
        Self {
            id,
            root,
            parent,
            children: SmallVec::new(),
            local,
            global_pose,
            blocks: Vec::new(),
        }
    }

    /// This model's id.
    pub fn id(&self) -> ModelId {
        self.id
    }

    /// The top-level ancestor (the model itself for roots).
    pub fn root(&self) -> ModelId {
        self.root
    }

    /// The parent model, or `None` for roots.
    pub fn parent(&self) -> Option<ModelId> {
        self.parent
    }

    /// Direct children, in creation order.
    pub fn children(&self) -> &[ModelId] {
        &self.children
    }

    /// Pose relative to the parent.
    pub fn pose(&self) -> Pose {
        self.local.pose
    }

    /// Pose in the world frame.
    pub fn global_pose(&self) -> Pose {
        self.global_pose
    }

    /// The model's color.
    pub fn color(&self) -> Color {
        self.local.color
    }

    /// Which sensors and contacts see this model.
    pub fn visibility(&self) -> Visibility {
        self.local.visibility
    }

    /// Blocks owned by this model, in creation order.
    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    /// Whether the two models belong to the same hierarchy.
    ///
    /// A model is related to itself, its ancestors, its descendants, and
    /// every other model under the same root.
    #[inline]
    pub fn is_related(&self, other: &Self) -> bool {
        self.root == other.root
    }
}
