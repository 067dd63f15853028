// Copyright 2026 the Tracegrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Super-regions: the coarse unit of spatial hashing.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;

use crate::coords::GridLayout;
use crate::error::Error;
use crate::region::Region;
use crate::types::GridOrigin;

/// A square table of regions, keyed in the index by its [`GridOrigin`].
///
/// Super-regions are created the first time insertion touches them and are
/// never destroyed; only the cell storage of their regions is reclaimed.
pub struct SuperRegion<P> {
    pub(crate) origin: GridOrigin,
    pub(crate) regions: Box<[Region<P>]>,
    pub(crate) count: usize,
}

impl<P> Debug for SuperRegion<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let populated = self.regions.iter().filter(|r| r.is_populated()).count();
        f.debug_struct("SuperRegion")
            .field("origin", &self.origin)
            .field("count", &self.count)
            .field("populated_regions", &populated)
            .finish_non_exhaustive()
    }
}

impl<P> SuperRegion<P> {
    pub(crate) fn new(origin: GridOrigin, layout: &GridLayout) -> Result<Self, Error> {
        let n = layout.regions_per_superregion();
        let mut regions: Vec<Region<P>> = Vec::new();
        regions
            .try_reserve_exact(n)
            .map_err(|_| Error::alloc::<Region<P>>("super-region table", n))?;
        regions.resize_with(n, Region::default);
        Ok(Self {
            origin,
            regions: regions.into_boxed_slice(),
            count: 0,
        })
    }

    /// Key of this super-region.
    #[inline]
    pub fn origin(&self) -> GridOrigin {
        self.origin
    }

    /// Sum of the occupancy counts of all regions.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Region by table index (`x + y * superregion_width`).
    #[inline]
    pub fn region(&self, index: usize) -> Option<&Region<P>> {
        self.regions.get(index)
    }

    /// All regions with their table index, row-major.
    pub fn regions(&self) -> impl Iterator<Item = (usize, &Region<P>)> + '_ {
        self.regions.iter().enumerate()
    }

    /// Regions whose count is non-zero.
    pub fn occupied_regions(&self) -> impl Iterator<Item = (usize, &Region<P>)> + '_ {
        self.regions().filter(|(_, r)| r.count() > 0)
    }
}
