// Copyright 2026 the Tracegrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Integer lattice primitives.

/// A point on the integer pixel lattice.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PixelPoint {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl PixelPoint {
    /// Create a pixel point.
    #[inline(always)]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Key of a super-region in the sparse map.
///
/// Stored in super-region units (pixel coordinate shifted right by the
/// combined region and super-region bit widths). The pixel of the lower-left
/// corner is available through
/// [`GridLayout::origin_pixel`][crate::GridLayout::origin_pixel].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridOrigin {
    /// Super-region column.
    pub x: i32,
    /// Super-region row.
    pub y: i32,
}

impl GridOrigin {
    /// Create an origin from super-region coordinates.
    #[inline(always)]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Inclusive axis-aligned pixel rectangle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PixelBounds {
    /// Minimum x (left).
    pub min_x: i32,
    /// Minimum y (bottom).
    pub min_y: i32,
    /// Maximum x (right), inclusive.
    pub max_x: i32,
    /// Maximum y (top), inclusive.
    pub max_y: i32,
}

impl PixelBounds {
    /// Create bounds from min/max corners (both inclusive).
    #[inline(always)]
    pub const fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Whether the bounds contain the pixel.
    #[inline]
    pub fn contains(&self, p: PixelPoint) -> bool {
        self.min_x <= p.x && self.min_y <= p.y && p.x <= self.max_x && p.y <= self.max_y
    }

    /// The smallest bounds enclosing both.
    #[inline]
    pub fn union(&self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Number of pixels along x.
    #[inline]
    pub fn width(&self) -> u64 {
        (i64::from(self.max_x) - i64::from(self.min_x) + 1).max(0).unsigned_abs()
    }

    /// Number of pixels along y.
    #[inline]
    pub fn height(&self) -> u64 {
        (i64::from(self.max_y) - i64::from(self.min_y) + 1).max(0).unsigned_abs()
    }
}
