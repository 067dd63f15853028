// Copyright 2026 the Tracegrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The sparse three-level spatial index.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::ops::ControlFlow;

use hashbrown::HashMap;
use kurbo::{Point, Rect};
use smallvec::SmallVec;

use crate::cell::Cell;
use crate::coords::{GridConfig, GridLayout, pixel_to_world, point_to_pixel, world_to_pixel};
use crate::error::Error;
use crate::line::LineWalk;
use crate::raster::rasterize_polygon;
use crate::region::{CellPool, Region, RegionCells};
use crate::superregion::SuperRegion;
use crate::types::{GridOrigin, PixelBounds, PixelPoint};

/// Where one payload was written, returned by every insertion.
///
/// Passing it back to [`SpatialIndex::remove`] removes that exact entry
/// without searching. Placements are only meaningful for the index that
/// produced them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Placement {
    superregion: u32,
    region: u32,
    cell: u32,
    slot: u32,
}

impl Placement {
    /// Dense id of the super-region, in creation order.
    #[inline]
    pub fn superregion(&self) -> u32 {
        self.superregion
    }

    /// Index of the region inside its super-region.
    #[inline]
    pub fn region(&self) -> u32 {
        self.region
    }

    /// Index of the cell inside its region.
    #[inline]
    pub fn cell(&self) -> u32 {
        self.cell
    }
}

/// Sparse map from pixels to the payloads rasterized onto them.
///
/// Storage is organised as super-regions (hashed by [`GridOrigin`], created on
/// first insertion, never destroyed), regions (fixed tables inside a
/// super-region whose cell arrays exist only while occupied) and cells.
/// Super-regions get dense ids in creation order, which stay valid for the
/// life of the index and are what [`Placement`]s refer to.
///
/// Mutation goes through `&mut self` and queries through `&self`, so the
/// borrow checker keeps insertion and queries from overlapping.
pub struct SpatialIndex<P> {
    layout: GridLayout,
    resolution: f64,
    lookup: HashMap<GridOrigin, u32>,
    superregions: Vec<SuperRegion<P>>,
    last: Option<(GridOrigin, u32)>,
    pool: CellPool<P>,
    bounds: Option<PixelBounds>,
}

impl<P> Debug for SpatialIndex<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("layout", &self.layout)
            .field("resolution", &self.resolution)
            .field("superregions", &self.superregions.len())
            .field("pool", &self.pool)
            .field("bounds", &self.bounds)
            .finish_non_exhaustive()
    }
}

/// Mutable handle to one cell, returned by [`SpatialIndex::get_cell`].
///
/// The region behind it gets cell storage only when something is pushed, so
/// looking up a cell never breaks the "storage iff occupied" rule.
pub struct CellMut<'a, P> {
    pixel: PixelPoint,
    superregion_id: u32,
    region_index: usize,
    cell_index: usize,
    superregion_count: &'a mut usize,
    region: &'a mut Region<P>,
    pool: &'a mut CellPool<P>,
}

impl<P> Debug for CellMut<'_, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CellMut")
            .field("pixel", &self.pixel)
            .field("superregion", &self.superregion_id)
            .field("region", &self.region_index)
            .field("cell", &self.cell_index)
            .finish_non_exhaustive()
    }
}

impl<P: Copy + PartialEq> CellMut<'_, P> {
    /// The pixel this cell covers.
    #[inline]
    pub fn pixel(&self) -> PixelPoint {
        self.pixel
    }

    /// Current contents, or `None` while the region has no storage.
    pub fn get(&self) -> Option<&Cell<P>> {
        self.region.cells().map(|cells| &cells[self.cell_index])
    }

    /// Number of payloads currently in the cell.
    pub fn len(&self) -> usize {
        self.get().map_or(0, Cell::len)
    }

    /// Whether the cell holds nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a payload and bump the region and super-region counters.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "table indices are below 2^30 by configuration"
    )]
    pub fn push(&mut self, payload: P) -> Result<Placement, Error> {
        let cells = self.region.cells_mut(self.pool)?;
        let slot = cells[self.cell_index].push(payload);
        self.region.count += 1;
        *self.superregion_count += 1;
        Ok(Placement {
            superregion: self.superregion_id,
            region: self.region_index as u32,
            cell: self.cell_index as u32,
            slot,
        })
    }
}

impl<P: Copy + PartialEq> SpatialIndex<P> {
    /// Create an empty index.
    pub fn new(config: GridConfig) -> Result<Self, Error> {
        let layout = config.validate()?;
        Ok(Self {
            layout,
            resolution: config.resolution,
            lookup: HashMap::new(),
            superregions: Vec::new(),
            last: None,
            pool: CellPool::new(layout.cells_per_region(), config.max_pooled_regions),
            bounds: None,
        })
    }

    /// The validated bit layout.
    #[inline]
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Pixels per meter.
    #[inline]
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// `floor(meters * resolution)`.
    #[inline]
    pub fn world_to_pixel(&self, meters: f64) -> i32 {
        world_to_pixel(meters, self.resolution)
    }

    /// Pixel containing a point given in meters.
    #[inline]
    pub fn point_to_pixel(&self, p: Point) -> PixelPoint {
        point_to_pixel(p, self.resolution)
    }

    fn superregion_id(&mut self, origin: GridOrigin, cached: bool) -> Result<u32, Error> {
        if cached
            && let Some((o, id)) = self.last
            && o == origin
        {
            return Ok(id);
        }
        let id = match self.lookup.get(&origin) {
            Some(&id) => id,
            None => self.create_superregion(origin)?,
        };
        self.last = Some((origin, id));
        Ok(id)
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "super-region count is bounded by the 2^32 lattice"
    )]
    fn create_superregion(&mut self, origin: GridOrigin) -> Result<u32, Error> {
        let sr = SuperRegion::new(origin, &self.layout)?;
        self.superregions
            .try_reserve(1)
            .map_err(|_| Error::alloc::<SuperRegion<P>>("super-region list", 1))?;
        self.lookup
            .try_reserve(1)
            .map_err(|_| Error::alloc::<(GridOrigin, u32)>("super-region map", 1))?;
        let id = self.superregions.len() as u32;
        self.superregions.push(sr);
        self.lookup.insert(origin, id);

        let footprint = self.layout.superregion_bounds(origin);
        let bounds = match self.bounds {
            Some(b) => b.union(footprint),
            None => footprint,
        };
        self.bounds = Some(bounds);
        log::debug!("created super-region {id} at {origin:?}; world bounds now {bounds:?}");
        Ok(id)
    }

    /// The super-region with this origin, created if missing.
    ///
    /// Creating a super-region grows [`bounds`](Self::bounds).
    pub fn get_or_create_superregion(
        &mut self,
        origin: GridOrigin,
    ) -> Result<&mut SuperRegion<P>, Error> {
        let id = self.superregion_id(origin, false)?;
        Ok(&mut self.superregions[id as usize])
    }

    fn cell_mut(&mut self, p: PixelPoint, cached: bool) -> Result<CellMut<'_, P>, Error> {
        let id = self.superregion_id(self.layout.origin_of(p), cached)?;
        let region_index = self.layout.region_index(p);
        let cell_index = self.layout.cell_index(p);
        let SuperRegion { regions, count, .. } = &mut self.superregions[id as usize];
        Ok(CellMut {
            pixel: p,
            superregion_id: id,
            region_index,
            cell_index,
            superregion_count: count,
            region: &mut regions[region_index],
            pool: &mut self.pool,
        })
    }

    /// Mutable access to the cell covering a pixel.
    ///
    /// Creates the super-region on demand. Only fails when that allocation
    /// fails.
    pub fn get_cell(&mut self, p: PixelPoint) -> Result<CellMut<'_, P>, Error> {
        self.cell_mut(p, false)
    }

    /// Same as [`get_cell`](Self::get_cell), but checks the most recently
    /// used super-region before the hash map.
    pub fn get_cell_cached(&mut self, p: PixelPoint) -> Result<CellMut<'_, P>, Error> {
        self.cell_mut(p, true)
    }

    /// Add `payload` to the cell covering `p`.
    pub fn insert(&mut self, p: PixelPoint, payload: P) -> Result<Placement, Error> {
        self.get_cell_cached(p)?.push(payload)
    }

    /// Remove the entry a [`Placement`] refers to.
    ///
    /// When the region's count drops to zero its cell storage goes back to
    /// the reuse pool.
    ///
    /// # Panics
    ///
    /// If the placement does not name an entry holding `payload`.
    pub fn remove(&mut self, placement: Placement, payload: P) {
        let sr = self
            .superregions
            .get_mut(placement.superregion as usize)
            .expect("placement names an unknown super-region");
        let region = &mut sr.regions[placement.region as usize];
        let RegionCells::Populated(cells) = &mut region.cells else {
            panic!("placement names a region without storage");
        };
        assert!(
            cells[placement.cell as usize].remove(placement.slot, payload),
            "payload is not in the cell its placement names"
        );
        region.count -= 1;
        sr.count -= 1;
        if region.count == 0 {
            region.reclaim(&mut self.pool);
            log::trace!(
                "reclaimed region {} of super-region {}",
                placement.region,
                placement.superregion
            );
        }
    }

    /// Insert `payload` into every pixel of `pixels`, appending the
    /// placements to `footprint`.
    ///
    /// Either every pixel is inserted or, when an allocation fails, none is:
    /// the entries added by this call are removed again before the error is
    /// returned.
    pub fn insert_pixels(
        &mut self,
        pixels: &[PixelPoint],
        payload: P,
        footprint: &mut Vec<Placement>,
    ) -> Result<(), Error> {
        let start = footprint.len();
        footprint
            .try_reserve(pixels.len())
            .map_err(|_| Error::alloc::<Placement>("footprint", pixels.len()))?;
        for &p in pixels {
            match self.insert(p, payload) {
                Ok(placement) => footprint.push(placement),
                Err(e) => {
                    for placement in footprint.drain(start..) {
                        self.remove(placement, payload);
                    }
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Rasterize a polygon given in meters and insert `payload` into every
    /// covered pixel.
    ///
    /// `scratch` holds the rasterized pixels; pass the same buffer between
    /// calls to avoid reallocating. See [`insert_pixels`](Self::insert_pixels)
    /// for the failure behavior.
    pub fn insert_polygon(
        &mut self,
        points: &[Point],
        payload: P,
        footprint: &mut Vec<Placement>,
        scratch: &mut Vec<PixelPoint>,
    ) -> Result<(), Error> {
        self.polygon_pixels(points, scratch);
        self.insert_pixels(scratch, payload, footprint)
    }

    /// Remove every placement in `footprint`, leaving it empty with its
    /// capacity intact.
    pub fn remove_all(&mut self, footprint: &mut Vec<Placement>, payload: P) {
        for placement in footprint.drain(..) {
            self.remove(placement, payload);
        }
    }

    /// Rasterize a polygon given in meters into pixels, without touching the
    /// index.
    pub fn polygon_pixels(&self, points: &[Point], out: &mut Vec<PixelPoint>) {
        let scaled: SmallVec<[Point; 8]> = points
            .iter()
            .map(|p| Point::new(p.x * self.resolution, p.y * self.resolution))
            .collect();
        rasterize_polygon(&scaled, out);
    }

    /// Call `visit` once for every cell on the segment between two points in
    /// meters, creating storage on demand.
    ///
    /// The walk covers the start pixel and stops before the end pixel.
    pub fn line_cells<F>(&mut self, a: Point, b: Point, mut visit: F) -> Result<(), Error>
    where
        F: FnMut(CellMut<'_, P>) -> Result<(), Error>,
    {
        for p in LineWalk::new(self.point_to_pixel(a), self.point_to_pixel(b)) {
            visit(self.get_cell_cached(p)?)?;
        }
        Ok(())
    }

    /// Walk `walk` read-only, calling `visit` for every non-empty cell.
    ///
    /// Absent super-regions and regions without storage are skipped, and
    /// nothing is ever created. Returns the pixel and value of the first
    /// `Break`, or `None` if the walk finished.
    pub fn walk_line<B, F>(&self, walk: LineWalk, mut visit: F) -> Option<(PixelPoint, B)>
    where
        F: FnMut(PixelPoint, &Cell<P>) -> ControlFlow<B>,
    {
        let mut current: Option<(GridOrigin, Option<&SuperRegion<P>>)> = None;
        for p in walk {
            let origin = self.layout.origin_of(p);
            let sr = match current {
                Some((o, sr)) if o == origin => sr,
                _ => {
                    let sr = self.superregion(origin);
                    current = Some((origin, sr));
                    sr
                }
            };
            let Some(sr) = sr else { continue };
            if sr.count == 0 {
                continue;
            }
            let region = &sr.regions[self.layout.region_index(p)];
            let Some(cells) = region.cells() else {
                continue;
            };
            let cell = &cells[self.layout.cell_index(p)];
            if cell.is_empty() {
                continue;
            }
            if let ControlFlow::Break(b) = visit(p, cell) {
                return Some((p, b));
            }
        }
        None
    }

    /// The super-region with this origin, if it was ever created.
    pub fn superregion(&self, origin: GridOrigin) -> Option<&SuperRegion<P>> {
        self.lookup
            .get(&origin)
            .map(|&id| &self.superregions[id as usize])
    }

    /// All super-regions, in creation order.
    pub fn superregions(&self) -> impl Iterator<Item = &SuperRegion<P>> + '_ {
        self.superregions.iter()
    }

    /// The region covering a pixel, if its super-region exists.
    pub fn region_at(&self, p: PixelPoint) -> Option<&Region<P>> {
        self.superregion(self.layout.origin_of(p))
            .and_then(|sr| sr.region(self.layout.region_index(p)))
    }

    /// The cell covering a pixel, if its region has storage.
    pub fn cell(&self, p: PixelPoint) -> Option<&Cell<P>> {
        self.region_at(p)?
            .cells()
            .map(|cells| &cells[self.layout.cell_index(p)])
    }

    /// The cell a placement was written to, if it still has storage.
    pub fn placement_cell(&self, placement: Placement) -> Option<&Cell<P>> {
        self.superregions
            .get(placement.superregion as usize)?
            .region(placement.region as usize)?
            .cells()?
            .get(placement.cell as usize)
    }

    /// Every non-empty cell with the pixel it covers.
    ///
    /// Super-regions are visited in creation order, regions and cells
    /// row-major within them.
    pub fn iter(&self) -> impl Iterator<Item = (PixelPoint, &Cell<P>)> + '_ {
        let layout = self.layout;
        self.superregions.iter().flat_map(move |sr| {
            let base = layout.origin_pixel(sr.origin);
            sr.occupied_regions().flat_map(move |(ri, region)| {
                let (rx, ry) = layout.region_coords(ri);
                region
                    .cells()
                    .unwrap_or(&[])
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| !c.is_empty())
                    .map(move |(ci, cell)| {
                        let (cx, cy) = layout.cell_coords(ci);
                        let p = PixelPoint::new(
                            base.x + (rx << layout.region_bits()) + cx,
                            base.y + (ry << layout.region_bits()) + cy,
                        );
                        (p, cell)
                    })
            })
        })
    }

    /// Total number of payload-to-cell associations.
    pub fn occupancy(&self) -> usize {
        self.superregions.iter().map(SuperRegion::count).sum()
    }

    /// Reclaimed cell arrays waiting for reuse.
    pub fn pooled_regions(&self) -> usize {
        self.pool.len()
    }

    /// Pixel extent of all super-regions created so far.
    pub fn bounds(&self) -> Option<PixelBounds> {
        self.bounds
    }

    /// [`bounds`](Self::bounds) in meters.
    pub fn world_bounds(&self) -> Option<Rect> {
        self.bounds.map(|b| {
            Rect::new(
                pixel_to_world(b.min_x, self.resolution),
                pixel_to_world(b.min_y, self.resolution),
                (f64::from(b.max_x) + 1.0) / self.resolution,
                (f64::from(b.max_y) + 1.0) / self.resolution,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    fn small() -> SpatialIndex<u32> {
        SpatialIndex::new(
            GridConfig::new(10.0)
                .with_region_bits(2)
                .with_superregion_bits(2),
        )
        .unwrap()
    }

    #[test]
    fn get_cell_creates_superregion_but_not_storage() {
        let mut idx = small();
        let p = PixelPoint::new(5, -3);
        {
            let c = idx.get_cell(p).unwrap();
            assert!(c.is_empty());
            assert_eq!(c.pixel(), p);
        }
        assert_eq!(idx.superregions().count(), 1);
        assert!(!idx.region_at(p).unwrap().is_populated());
        assert!(idx.cell(p).is_none());
        assert_eq!(idx.occupancy(), 0);
    }

    #[test]
    fn get_or_create_superregion_is_idempotent() {
        let mut idx = small();
        let p = PixelPoint::new(5, -3);
        let origin = idx.layout().origin_of(p);
        assert!(idx.bounds().is_none());

        assert_eq!(idx.get_or_create_superregion(origin).unwrap().origin(), origin);
        let bounds = idx.bounds().unwrap();
        assert!(bounds.contains(p));

        assert_eq!(idx.get_or_create_superregion(origin).unwrap().count(), 0);
        assert_eq!(idx.superregions().count(), 1);
        assert_eq!(idx.bounds(), Some(bounds));

        // Cell access finds the same super-region instead of making another.
        let placement = idx.get_cell_cached(p).unwrap().push(4).unwrap();
        assert_eq!(placement.superregion(), 0);
        assert_eq!(idx.superregions().count(), 1);
        assert_eq!(idx.get_or_create_superregion(origin).unwrap().count(), 1);
    }

    #[test]
    fn insert_and_remove_update_counters() {
        let mut idx = small();
        let a = idx.insert(PixelPoint::new(1, 1), 7).unwrap();
        let b = idx.insert(PixelPoint::new(2, 1), 7).unwrap();
        let c = idx.insert(PixelPoint::new(1, 1), 8).unwrap();
        assert_eq!(idx.occupancy(), 3);
        assert_eq!(idx.region_at(PixelPoint::new(1, 1)).unwrap().count(), 3);
        assert_eq!(
            idx.cell(PixelPoint::new(1, 1)).unwrap().iter().collect::<Vec<_>>(),
            vec![7, 8]
        );

        idx.remove(a, 7);
        idx.remove(c, 8);
        assert_eq!(idx.occupancy(), 1);
        idx.remove(b, 7);
        assert_eq!(idx.occupancy(), 0);
        assert!(!idx.region_at(PixelPoint::new(1, 1)).unwrap().is_populated());
        assert_eq!(idx.pooled_regions(), 1);
        // Super-regions outlive their contents.
        assert_eq!(idx.superregions().count(), 1);
    }

    #[test]
    #[should_panic(expected = "not in the cell")]
    fn removing_twice_panics() {
        let mut idx = small();
        let a = idx.insert(PixelPoint::new(0, 0), 1).unwrap();
        let _b = idx.insert(PixelPoint::new(1, 0), 1).unwrap();
        idx.remove(a, 1);
        idx.remove(a, 1);
    }

    #[test]
    fn cached_and_uncached_lookups_agree() {
        let mut idx = small();
        let pts = [(0, 0), (100, 0), (0, 0), (-1, -1), (100, 0)];
        for (i, &(x, y)) in pts.iter().enumerate() {
            let p = PixelPoint::new(x, y);
            let a = idx.get_cell(p).unwrap().superregion_id;
            let b = idx.get_cell_cached(p).unwrap().superregion_id;
            assert_eq!(a, b, "lookup {i}");
        }
        assert_eq!(idx.superregions().count(), 3);
    }

    #[test]
    fn bounds_grow_with_superregions() {
        let mut idx = small();
        assert!(idx.bounds().is_none());
        let _ = idx.insert(PixelPoint::new(0, 0), 1).unwrap();
        assert_eq!(idx.bounds(), Some(PixelBounds::new(0, 0, 15, 15)));
        let _ = idx.insert(PixelPoint::new(-1, 20), 1).unwrap();
        assert_eq!(idx.bounds(), Some(PixelBounds::new(-16, 0, 15, 31)));
        let r = idx.world_bounds().unwrap();
        assert_eq!(r, Rect::new(-1.6, 0.0, 1.6, 3.2));
    }

    #[test]
    fn iter_reports_pixels() {
        let mut idx = small();
        let pts = [
            PixelPoint::new(3, 2),
            PixelPoint::new(-7, 9),
            PixelPoint::new(40, -41),
        ];
        for (i, &p) in pts.iter().enumerate() {
            let _ = idx.insert(p, i as u32).unwrap();
        }
        let mut seen: Vec<_> = idx
            .iter()
            .map(|(p, c)| (p, c.iter().collect::<Vec<_>>()))
            .collect();
        seen.sort();
        let mut want: Vec<_> = pts
            .iter()
            .enumerate()
            .map(|(i, &p)| (p, vec![i as u32]))
            .collect();
        want.sort();
        assert_eq!(seen, want);
    }

    #[test]
    fn polygon_footprint_round_trip() {
        let mut idx = small();
        let square = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ];
        let mut footprint = Vec::new();
        let mut scratch = Vec::new();
        idx.insert_polygon(&square, 9, &mut footprint, &mut scratch)
            .unwrap();
        assert_eq!(footprint.len(), 121);
        assert_eq!(idx.occupancy(), 121);
        assert!(idx.cell(PixelPoint::new(5, 5)).unwrap().contains(9));
        assert!(
            footprint
                .iter()
                .all(|&p| idx.placement_cell(p).is_some_and(|c| c.contains(9)))
        );

        idx.remove_all(&mut footprint, 9);
        assert!(footprint.is_empty());
        assert_eq!(idx.occupancy(), 0);
        assert!(idx.iter().next().is_none());
    }

    #[test]
    fn line_cells_visits_walk() {
        let mut idx = small();
        let mut n = 0;
        idx.line_cells(Point::new(0.0, 0.0), Point::new(2.0, 0.0), |mut c| {
            n += 1;
            c.push(1).map(|_| ())
        })
        .unwrap();
        assert_eq!(n, 20);
        assert_eq!(idx.occupancy(), 20);
    }

    #[test]
    fn walk_line_stops_at_first_break() {
        let mut idx = small();
        let _ = idx.insert(PixelPoint::new(30, 0), 3).unwrap();
        let _ = idx.insert(PixelPoint::new(50, 0), 5).unwrap();
        let walk = LineWalk::new(PixelPoint::new(-20, 0), PixelPoint::new(100, 0));
        let hit = idx.walk_line(walk, |_, cell| match cell.iter().next() {
            Some(v) => ControlFlow::Break(v),
            None => ControlFlow::Continue(()),
        });
        assert_eq!(hit, Some((PixelPoint::new(30, 0), 3)));
        // Walking never creates storage.
        assert_eq!(idx.superregions().count(), 2);
    }
}
