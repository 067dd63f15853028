// Copyright 2026 the Tracegrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversions between meters, pixels, and the three-level hierarchy.
//!
//! A pixel coordinate decomposes into three fields by bit position:
//!
//! ```text
//!   | super-region (high bits) | region (superregion_bits) | cell (region_bits) |
//! ```
//!
//! Arithmetic shifts floor towards -∞, so negative coordinates decompose the
//! same way as positive ones and recomposition is lossless.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::Point;

use crate::error::Error;
use crate::types::{GridOrigin, PixelBounds, PixelPoint};

/// Default resolution in pixels per meter.
pub const DEFAULT_RESOLUTION: f64 = 50.0;
/// Default region width exponent: regions are 2^6 = 64 pixels on a side.
pub const DEFAULT_REGION_BITS: u32 = 6;
/// Default super-region width exponent: super-regions are 2^5 = 32 regions on a side.
pub const DEFAULT_SUPERREGION_BITS: u32 = 5;
/// Default number of reclaimed region buffers kept for reuse.
pub const DEFAULT_MAX_POOLED_REGIONS: usize = 64;

const MAX_TOTAL_BITS: u32 = 24;
const MAX_LEVEL_BITS: u32 = 15;

/// Numeric configuration of a spatial index.
///
/// These values are read once by whatever loads the world description and
/// passed in as plain numbers. Call [`GridConfig::validate`] (or construct a
/// [`SpatialIndex`][crate::SpatialIndex]) to check them.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GridConfig {
    /// Pixels per meter.
    pub resolution: f64,
    /// A region is `2^region_bits` pixels on a side.
    pub region_bits: u32,
    /// A super-region is `2^superregion_bits` regions on a side.
    pub superregion_bits: u32,
    /// Upper bound on reclaimed cell arrays held for reuse.
    pub max_pooled_regions: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            region_bits: DEFAULT_REGION_BITS,
            superregion_bits: DEFAULT_SUPERREGION_BITS,
            max_pooled_regions: DEFAULT_MAX_POOLED_REGIONS,
        }
    }
}

impl GridConfig {
    /// Default configuration at the given resolution.
    pub fn new(resolution: f64) -> Self {
        Self {
            resolution,
            ..Self::default()
        }
    }

    /// Set the region width exponent.
    pub fn with_region_bits(mut self, bits: u32) -> Self {
        self.region_bits = bits;
        self
    }

    /// Set the super-region width exponent.
    pub fn with_superregion_bits(mut self, bits: u32) -> Self {
        self.superregion_bits = bits;
        self
    }

    /// Set the reuse pool capacity (0 disables pooling).
    pub fn with_max_pooled_regions(mut self, n: usize) -> Self {
        self.max_pooled_regions = n;
        self
    }

    /// Check the configuration and precompute the lattice layout.
    pub fn validate(&self) -> Result<GridLayout, Error> {
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(Error::config("resolution must be finite and positive"));
        }
        if self.region_bits == 0 || self.superregion_bits == 0 {
            return Err(Error::config("bit widths must be at least 1"));
        }
        if self.region_bits > MAX_LEVEL_BITS || self.superregion_bits > MAX_LEVEL_BITS {
            return Err(Error::config("bit widths must not exceed 15"));
        }
        if self.region_bits + self.superregion_bits > MAX_TOTAL_BITS {
            return Err(Error::config(
                "region_bits + superregion_bits must not exceed 24",
            ));
        }
        Ok(GridLayout::new(self.region_bits, self.superregion_bits))
    }
}

/// Validated bit layout of the hierarchy.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GridLayout {
    region_bits: u32,
    superregion_bits: u32,
}

impl GridLayout {
    const fn new(region_bits: u32, superregion_bits: u32) -> Self {
        Self {
            region_bits,
            superregion_bits,
        }
    }

    /// Region width exponent.
    #[inline(always)]
    pub const fn region_bits(&self) -> u32 {
        self.region_bits
    }

    /// Super-region width exponent.
    #[inline(always)]
    pub const fn superregion_bits(&self) -> u32 {
        self.superregion_bits
    }

    /// Combined shift from pixel to super-region coordinates.
    #[inline(always)]
    pub const fn total_bits(&self) -> u32 {
        self.region_bits + self.superregion_bits
    }

    /// Pixels along one side of a region.
    #[inline(always)]
    pub const fn region_width(&self) -> i32 {
        1 << self.region_bits
    }

    /// Regions along one side of a super-region.
    #[inline(always)]
    pub const fn superregion_width(&self) -> i32 {
        1 << self.superregion_bits
    }

    /// Cells stored by a populated region.
    #[inline(always)]
    pub const fn cells_per_region(&self) -> usize {
        1 << (2 * self.region_bits)
    }

    /// Regions stored by a super-region.
    #[inline(always)]
    pub const fn regions_per_superregion(&self) -> usize {
        1 << (2 * self.superregion_bits)
    }

    /// Mask selecting the cell field of a pixel coordinate.
    #[inline(always)]
    pub const fn cell_mask(&self) -> i32 {
        self.region_width() - 1
    }

    /// Mask selecting the region and cell fields of a pixel coordinate.
    #[inline(always)]
    pub const fn superregion_mask(&self) -> i32 {
        (1 << self.total_bits()) - 1
    }

    /// Super-region coordinate of a pixel coordinate.
    #[inline(always)]
    pub const fn pixel_to_superregion(&self, px: i32) -> i32 {
        px >> self.total_bits()
    }

    /// Region coordinate (local to its super-region) of a pixel coordinate.
    #[inline(always)]
    pub const fn pixel_to_region(&self, px: i32) -> i32 {
        (px & self.superregion_mask()) >> self.region_bits
    }

    /// Cell coordinate (local to its region) of a pixel coordinate.
    #[inline(always)]
    pub const fn pixel_to_cell(&self, px: i32) -> i32 {
        px & self.cell_mask()
    }

    /// Rebuild a pixel coordinate from its three fields.
    #[inline(always)]
    pub const fn compose(&self, superregion: i32, region: i32, cell: i32) -> i32 {
        (superregion << self.total_bits()) | (region << self.region_bits) | cell
    }

    /// Super-region key covering a pixel.
    #[inline(always)]
    pub const fn origin_of(&self, p: PixelPoint) -> GridOrigin {
        GridOrigin::new(self.pixel_to_superregion(p.x), self.pixel_to_superregion(p.y))
    }

    /// Lower-left pixel of a super-region.
    #[inline(always)]
    pub const fn origin_pixel(&self, origin: GridOrigin) -> PixelPoint {
        PixelPoint::new(origin.x << self.total_bits(), origin.y << self.total_bits())
    }

    /// Pixel footprint of a super-region.
    pub const fn superregion_bounds(&self, origin: GridOrigin) -> PixelBounds {
        let lo = self.origin_pixel(origin);
        let span = self.superregion_mask();
        PixelBounds::new(lo.x, lo.y, lo.x + span, lo.y + span)
    }

    /// Index of a region inside its super-region's table.
    #[allow(
        clippy::cast_sign_loss,
        reason = "region coordinates are masked into [0, superregion_width)"
    )]
    #[inline(always)]
    pub const fn region_index(&self, p: PixelPoint) -> usize {
        (self.pixel_to_region(p.x) + (self.pixel_to_region(p.y) << self.superregion_bits)) as usize
    }

    /// Index of a cell inside its region's cell array.
    #[allow(
        clippy::cast_sign_loss,
        reason = "cell coordinates are masked into [0, region_width)"
    )]
    #[inline(always)]
    pub const fn cell_index(&self, p: PixelPoint) -> usize {
        (self.pixel_to_cell(p.x) + (self.pixel_to_cell(p.y) << self.region_bits)) as usize
    }

    /// Local (x, y) region coordinates for a region table index.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        reason = "table indices are below 2^(2 * superregion_bits)"
    )]
    #[inline]
    pub const fn region_coords(&self, index: usize) -> (i32, i32) {
        let w = self.superregion_width() as usize;
        ((index % w) as i32, (index / w) as i32)
    }

    /// Local (x, y) cell coordinates for a cell array index.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        reason = "cell indices are below 2^(2 * region_bits)"
    )]
    #[inline]
    pub const fn cell_coords(&self, index: usize) -> (i32, i32) {
        let w = self.region_width() as usize;
        ((index % w) as i32, (index / w) as i32)
    }
}

impl Default for GridLayout {
    fn default() -> Self {
        Self::new(DEFAULT_REGION_BITS, DEFAULT_SUPERREGION_BITS)
    }
}

/// Convert a distance in meters to a pixel coordinate: `floor(meters * resolution)`.
///
/// # Panics
///
/// If the scaled value is NaN or outside the `i32` range. The lattice covers
/// every `i32`, so such an input can only come from a broken caller.
#[allow(
    clippy::cast_possible_truncation,
    reason = "range is asserted before the cast"
)]
#[inline]
pub fn world_to_pixel(meters: f64, resolution: f64) -> i32 {
    let v = (meters * resolution).floor();
    assert!(
        v >= f64::from(i32::MIN) && v <= f64::from(i32::MAX),
        "coordinate {meters} m is outside the pixel lattice at {resolution} px/m"
    );
    v as i32
}

/// Convert a point in meters to its pixel.
#[inline]
pub fn point_to_pixel(p: Point, resolution: f64) -> PixelPoint {
    PixelPoint::new(world_to_pixel(p.x, resolution), world_to_pixel(p.y, resolution))
}

/// Convert a pixel back to the meter coordinate of its lower-left corner.
#[inline]
pub fn pixel_to_world(px: i32, resolution: f64) -> f64 {
    f64::from(px) / resolution
}
