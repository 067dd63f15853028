// Copyright 2026 the Tracegrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Regions: lazily allocated batches of cells, and the pool that recycles them.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::cell::Cell;
use crate::error::Error;

/// Storage state of a region.
///
/// `Populated` holds exactly when the region's occupancy count is non-zero.
#[derive(Clone)]
pub(crate) enum RegionCells<P> {
    Empty,
    Populated(Box<[Cell<P>]>),
}

impl<P> Default for RegionCells<P> {
    fn default() -> Self {
        Self::Empty
    }
}

/// A fixed-size square batch of cells with an occupancy counter.
#[derive(Clone)]
pub struct Region<P> {
    pub(crate) cells: RegionCells<P>,
    pub(crate) count: usize,
}

impl<P> Default for Region<P> {
    fn default() -> Self {
        Self {
            cells: RegionCells::Empty,
            count: 0,
        }
    }
}

impl<P> Debug for Region<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Region")
            .field("count", &self.count)
            .field("populated", &self.is_populated())
            .finish()
    }
}

impl<P> Region<P> {
    /// Number of payload-to-cell associations inside this region.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Whether cell storage is currently allocated.
    #[inline]
    pub fn is_populated(&self) -> bool {
        matches!(self.cells, RegionCells::Populated(_))
    }

    /// The cell array, row-major, or `None` when the region is empty.
    #[inline]
    pub fn cells(&self) -> Option<&[Cell<P>]> {
        match &self.cells {
            RegionCells::Empty => None,
            RegionCells::Populated(cells) => Some(cells),
        }
    }

    /// Cell storage, taken from the pool or freshly allocated when empty.
    pub(crate) fn cells_mut(&mut self, pool: &mut CellPool<P>) -> Result<&mut [Cell<P>], Error> {
        if let RegionCells::Empty = self.cells {
            self.cells = RegionCells::Populated(pool.acquire()?);
        }
        match &mut self.cells {
            RegionCells::Populated(cells) => Ok(cells),
            RegionCells::Empty => unreachable!("region storage was just populated"),
        }
    }

    /// Hand the storage back to the pool once the region holds nothing.
    pub(crate) fn reclaim(&mut self, pool: &mut CellPool<P>) {
        debug_assert_eq!(self.count, 0, "reclaiming a region that is still occupied");
        if let RegionCells::Populated(cells) = core::mem::take(&mut self.cells) {
            pool.release(cells);
        }
    }
}

/// Free list of reclaimed cell arrays.
///
/// Every region of one index has the same size, so a single size class
/// suffices; `cells_per_region` records it.
pub(crate) struct CellPool<P> {
    free: Vec<Box<[Cell<P>]>>,
    cells_per_region: usize,
    max_pooled: usize,
}

impl<P> Debug for CellPool<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CellPool")
            .field("pooled", &self.free.len())
            .field("cells_per_region", &self.cells_per_region)
            .field("max_pooled", &self.max_pooled)
            .finish()
    }
}

impl<P> CellPool<P> {
    pub(crate) fn new(cells_per_region: usize, max_pooled: usize) -> Self {
        Self {
            free: Vec::new(),
            cells_per_region,
            max_pooled,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.free.len()
    }

    fn acquire(&mut self) -> Result<Box<[Cell<P>]>, Error> {
        if let Some(cells) = self.free.pop() {
            log::trace!("reusing pooled region storage ({} left)", self.free.len());
            return Ok(cells);
        }
        let n = self.cells_per_region;
        let mut cells: Vec<Cell<P>> = Vec::new();
        cells
            .try_reserve_exact(n)
            .map_err(|_| Error::alloc::<Cell<P>>("region cells", n))?;
        cells.resize_with(n, Cell::default);
        Ok(cells.into_boxed_slice())
    }

    fn release(&mut self, mut cells: Box<[Cell<P>]>) {
        debug_assert_eq!(cells.len(), self.cells_per_region, "foreign region buffer");
        if self.free.len() >= self.max_pooled {
            log::trace!("region pool full, freeing storage");
            return;
        }
        // A reused buffer must start empty.
        for cell in cells.iter_mut() {
            cell.clear();
        }
        self.free.push(cells);
    }
}
