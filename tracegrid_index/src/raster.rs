// Copyright 2026 the Tracegrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Polygon rasterization onto the pixel lattice.
//!
//! A polygon covers the union of
//!
//! - its outline: the [line walk](crate::LineWalk) along every edge between
//!   the floored vertices, and
//! - its interior: every pixel whose center lies inside the polygon under the
//!   even-odd rule, sampled one scanline per pixel row.
//!
//! The outline keeps thin features (walls a fraction of a pixel wide) from
//! vanishing; the interior fill makes blocks solid so rays starting inside
//! them hit immediately.

use alloc::vec::Vec;
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::Point;
use smallvec::SmallVec;

use crate::coords::world_to_pixel;
use crate::line::LineWalk;
use crate::types::PixelPoint;

/// Twice the signed area of a polygon (shoelace formula).
pub fn signed_area2(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        acc += a.x * b.y - b.x * a.y;
    }
    acc
}

/// Rasterize a closed polygon given in pixel units (meters × resolution).
///
/// `out` is cleared and filled with the covered pixels, sorted and free of
/// duplicates. Polygons with fewer than three vertices or zero area cover
/// nothing.
///
/// # Panics
///
/// If a vertex lies outside the `i32` pixel lattice.
pub fn rasterize_polygon(points: &[Point], out: &mut Vec<PixelPoint>) {
    out.clear();
    if signed_area2(points) == 0.0 {
        return;
    }

    let n = points.len();
    for i in 0..n {
        let a = lattice(points[i]);
        let b = lattice(points[(i + 1) % n]);
        out.extend(LineWalk::new(a, b));
    }

    let (min_y, max_y) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.y), hi.max(p.y))
        });
    let mut crossings: SmallVec<[f64; 8]> = SmallVec::new();
    for row in world_to_pixel(min_y, 1.0)..=world_to_pixel(max_y, 1.0) {
        let yc = f64::from(row) + 0.5;
        crossings.clear();
        for i in 0..n {
            let a = points[i];
            let b = points[(i + 1) % n];
            // Half-open in y so a vertex on the scanline counts once.
            if (a.y <= yc) != (b.y <= yc) {
                crossings.push(a.x + (yc - a.y) * (b.x - a.x) / (b.y - a.y));
            }
        }
        crossings.sort_unstable_by(f64::total_cmp);
        for span in crossings.chunks_exact(2) {
            // Pixel `i` is inside when its center `i + 0.5` is in [x0, x1).
            let first = world_to_pixel((span[0] - 0.5).ceil(), 1.0);
            let end = world_to_pixel((span[1] - 0.5).ceil(), 1.0);
            out.extend((first..end).map(|x| PixelPoint::new(x, row)));
        }
    }

    out.sort_unstable();
    out.dedup();
}

#[inline]
fn lattice(p: Point) -> PixelPoint {
    PixelPoint::new(world_to_pixel(p.x, 1.0), world_to_pixel(p.y, 1.0))
}
