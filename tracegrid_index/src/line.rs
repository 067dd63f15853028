// Copyright 2026 the Tracegrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Integer line walk over the pixel lattice.
//!
//! The walk moves one pixel at a time along x or y, choosing the axis whose
//! error term is smaller, so it visits every pixel a segment passes through
//! (4-connected) using only integer additions and comparisons. A segment from
//! `a` to `b` visits `|dx| + |dy|` pixels: `a` itself, and every pixel up to
//! but not including `b`. Closed polygons therefore cover every vertex exactly
//! once, as the start of the following edge.

use crate::types::PixelPoint;

/// Incremental walk from a start pixel towards an end pixel.
///
/// Yields the start pixel first. See the [module docs](self) for which
/// pixels are visited.
#[derive(Clone, Debug)]
pub struct LineWalk {
    x: i32,
    y: i32,
    sx: i32,
    sy: i32,
    bx: i64,
    by: i64,
    exy: i64,
    remaining: u64,
    x_major: bool,
}

impl LineWalk {
    /// Start a walk from `start` towards `end`.
    pub fn new(start: PixelPoint, end: PixelPoint) -> Self {
        let dx = i64::from(end.x) - i64::from(start.x);
        let dy = i64::from(end.y) - i64::from(start.y);
        Self::with_delta(start, dx, dy)
    }

    /// Start a walk from `start` covering the offset `(dx, dy)`.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "signum is in [-1, 1]"
    )]
    pub fn with_delta(start: PixelPoint, dx: i64, dy: i64) -> Self {
        let ax = dx.abs();
        let ay = dy.abs();
        Self {
            x: start.x,
            y: start.y,
            sx: dx.signum() as i32,
            sy: dy.signum() as i32,
            bx: 2 * ax,
            by: 2 * ay,
            exy: ay - ax,
            remaining: ax.unsigned_abs() + ay.unsigned_abs(),
            x_major: ax > ay,
        }
    }

    /// The pixel the walk is currently on.
    #[inline]
    pub fn current(&self) -> PixelPoint {
        PixelPoint::new(self.x, self.y)
    }

    /// Pixels left to visit, including the current one.
    #[inline]
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Whether the segment is longer along x than along y.
    #[inline]
    pub fn is_x_major(&self) -> bool {
        self.x_major
    }

    #[inline]
    fn step(&mut self) {
        if self.exy < 0 {
            self.x += self.sx;
            self.exy += self.by;
        } else {
            self.y += self.sy;
            self.exy -= self.bx;
        }
    }
}

impl Iterator for LineWalk {
    type Item = PixelPoint;

    #[inline]
    fn next(&mut self) -> Option<PixelPoint> {
        if self.remaining == 0 {
            return None;
        }
        let p = self.current();
        self.remaining -= 1;
        if self.remaining > 0 {
            self.step();
        }
        Some(p)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (n, usize::try_from(self.remaining).ok())
    }
}

/// Call `f` for every pixel on the segment from `start` towards `end`.
pub fn for_each_pixel_in_line<F: FnMut(PixelPoint)>(start: PixelPoint, end: PixelPoint, f: F) {
    LineWalk::new(start, end).for_each(f);
}
