// Copyright 2026 the Tracegrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the world: identifiers, poses, colors, and local geometry.

use alloc::vec::Vec;
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Affine, Point};

/// Identifier for a model in the world (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ModelId(pub(crate) u32, pub(crate) u32);

impl ModelId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Identifier for a block in the world (generational).
///
/// Block ids are what the spatial index stores in its cells.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub(crate) u32, pub(crate) u32);

impl BlockId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Which kinds of sensing and contact a model responds to.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Visibility: u8 {
        /// Blocks other obstacles; participates in collision tests.
        const OBSTACLE = 0b0000_0001;
        /// Returns range sensor beams (laser, sonar).
        const RANGER   = 0b0000_0010;
        /// Is seen by color blob finders.
        const BLOB     = 0b0000_0100;
        /// Is seen by fiducial finders.
        const FIDUCIAL = 0b0000_1000;
        /// Can be picked up by grippers.
        const GRIPPER  = 0b0001_0000;
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Self::OBSTACLE | Self::RANGER | Self::BLOB
    }
}

/// Position and heading in meters and radians, plus a height offset.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pose {
    /// X in meters.
    pub x: f64,
    /// Y in meters.
    pub y: f64,
    /// Height in meters.
    pub z: f64,
    /// Heading in radians, counter-clockwise from +x.
    pub a: f64,
}

impl Pose {
    /// The identity pose.
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Create a pose.
    pub const fn new(x: f64, y: f64, z: f64, a: f64) -> Self {
        Self { x, y, z, a }
    }

    /// The planar position.
    #[inline]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Planar transform from this pose's frame into its parent frame.
    pub fn to_affine(&self) -> Affine {
        Affine::translate((self.x, self.y)) * Affine::rotate(self.a)
    }

    /// The pose `local`, given in this pose's frame, expressed in the parent
    /// frame. Heights add and headings are normalized to `(-π, π]`.
    pub fn compose(&self, local: Self) -> Self {
        let (s, c) = self.a.sin_cos();
        Self {
            x: self.x + local.x * c - local.y * s,
            y: self.y + local.x * s + local.y * c,
            z: self.z + local.z,
            a: normalize_angle(self.a + local.a),
        }
    }
}

/// Wrap an angle into `(-π, π]`.
pub fn normalize_angle(a: f64) -> f64 {
    a.sin().atan2(a.cos())
}

/// An RGBA color with components in `[0, 1]`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha (1 is opaque).
    pub a: f32,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    /// Opaque red.
    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);
    /// Opaque green.
    pub const GREEN: Self = Self::rgb(0.0, 1.0, 0.0);
    /// Opaque blue.
    pub const BLUE: Self = Self::rgb(0.0, 0.0, 1.0);

    /// An opaque color.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// A color with explicit alpha.
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::RED
    }
}

/// A closed vertical interval in meters.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZRange {
    /// Bottom.
    pub min: f64,
    /// Top.
    pub max: f64,
}

impl ZRange {
    /// Create a range.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `z` lies within the range, ends included.
    #[inline]
    pub fn contains(&self, z: f64) -> bool {
        self.min <= z && z <= self.max
    }

    /// Whether the two ranges share at least one height.
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min <= other.max && self.max >= other.min
    }

    /// The range shifted up by `dz`.
    #[inline]
    pub fn offset(&self, dz: f64) -> Self {
        Self::new(self.min + dz, self.max + dz)
    }
}

/// Local data for a model.
#[derive(Clone, Debug)]
pub struct LocalModel {
    /// Pose relative to the parent model, or to the world for roots.
    pub pose: Pose,
    /// Color inherited by blocks that ask for it.
    pub color: Color,
    /// Which sensors and contacts see this model.
    pub visibility: Visibility,
}

impl Default for LocalModel {
    fn default() -> Self {
        Self {
            pose: Pose::ORIGIN,
            color: Color::default(),
            visibility: Visibility::default(),
        }
    }
}

/// Local geometry for a block.
#[derive(Clone, Debug)]
pub struct LocalBlock {
    /// Polygon vertices in the owning model's frame, in meters.
    pub points: Vec<Point>,
    /// Vertical extent relative to the owning model's height.
    pub z: ZRange,
    /// The block's own color.
    pub color: Color,
    /// Use the owning model's color instead of [`color`](Self::color).
    pub inherit_color: bool,
}

impl Default for LocalBlock {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            z: ZRange::new(0.0, 1.0),
            color: Color::default(),
            inherit_color: true,
        }
    }
}

impl LocalBlock {
    /// An axis-aligned rectangle block spanning `[x0, x1] × [y0, y1]`.
    pub fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            points: alloc::vec![
                Point::new(x0, y0),
                Point::new(x1, y0),
                Point::new(x1, y1),
                Point::new(x0, y1),
            ],
            ..Self::default()
        }
    }

    /// Set the vertical extent.
    pub fn with_z(mut self, z: ZRange) -> Self {
        self.z = z;
        self
    }

    /// Use an explicit color rather than the owner's.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self.inherit_color = false;
        self
    }
}
