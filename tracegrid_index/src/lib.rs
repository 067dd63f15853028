// Copyright 2026 the Tracegrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracegrid Index: a sparse, multi-resolution occupancy grid.
//!
//! The grid maps every pixel of a signed 32-bit lattice (at a fixed number of
//! pixels per meter) to the payloads rasterized onto it. Storage is a
//! three-level hierarchy:
//!
//! - **Super-regions**, held in a hash map keyed by [`GridOrigin`] and created
//!   the first time an insertion touches them.
//! - **Regions**, fixed tables inside a super-region. A region owns a cell
//!   array only while its occupancy count is non-zero; emptied arrays go to a
//!   small reuse pool.
//! - **Cells**, the payloads on a single pixel, in insertion order.
//!
//! Every insertion returns a [`Placement`] that removes the entry again in
//! O(1), so an object that remembers its placements can be unindexed in time
//! proportional to its own footprint.
//!
//! Queries walk the grid with the integer [`LineWalk`] through
//! [`SpatialIndex::walk_line`], which never allocates and skips absent
//! storage.
//!
//! # Example
//!
//! ```rust
//! use core::ops::ControlFlow;
//! use kurbo::Point;
//! use tracegrid_index::{GridConfig, LineWalk, PixelPoint, SpatialIndex};
//!
//! let mut index: SpatialIndex<u32> = SpatialIndex::new(GridConfig::new(100.0)).unwrap();
//!
//! // Index a 1 m square with payload 7.
//! let square = [
//!     Point::new(0.0, 0.0),
//!     Point::new(1.0, 0.0),
//!     Point::new(1.0, 1.0),
//!     Point::new(0.0, 1.0),
//! ];
//! let mut footprint = Vec::new();
//! let mut scratch = Vec::new();
//! index.insert_polygon(&square, 7, &mut footprint, &mut scratch).unwrap();
//!
//! // Walk from (-1, 0.5) m towards +x and stop at the first occupied cell.
//! let walk = LineWalk::new(PixelPoint::new(-100, 50), PixelPoint::new(400, 50));
//! let hit = index.walk_line(walk, |_, cell| match cell.iter().next() {
//!     Some(p) => ControlFlow::Break(p),
//!     None => ControlFlow::Continue(()),
//! });
//! assert_eq!(hit, Some((PixelPoint::new(0, 50), 7)));
//!
//! // Removing the footprint restores the empty grid.
//! index.remove_all(&mut footprint, 7);
//! assert_eq!(index.occupancy(), 0);
//! ```
//!
//! ## Features
//!
//! - `std` *(default)*: use the standard library for float math.
//! - `libm`: float math for `no_std` targets.
//! - `serde`: `Serialize`/`Deserialize` for [`GridConfig`].
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod cell;
mod coords;
mod error;
mod index;
mod line;
mod raster;
mod region;
mod superregion;
mod types;

pub use cell::Cell;
pub use coords::{
    DEFAULT_MAX_POOLED_REGIONS, DEFAULT_REGION_BITS, DEFAULT_RESOLUTION,
    DEFAULT_SUPERREGION_BITS, GridConfig, GridLayout, pixel_to_world, point_to_pixel,
    world_to_pixel,
};
pub use error::Error;
pub use index::{CellMut, Placement, SpatialIndex};
pub use line::{LineWalk, for_each_pixel_in_line};
pub use raster::{rasterize_polygon, signed_area2};
pub use region::Region;
pub use superregion::SuperRegion;
pub use types::{GridOrigin, PixelBounds, PixelPoint};
