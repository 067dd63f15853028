// Copyright 2026 the Tracegrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property tests for the spatial index.

use kurbo::Point;
use proptest::prelude::*;
use tracegrid_index::{
    Cell, GridConfig, GridLayout, PixelPoint, Placement, SpatialIndex, rasterize_polygon,
};

fn layout() -> impl Strategy<Value = GridLayout> {
    (1u32..=8, 1u32..=8).prop_map(|(r, s)| {
        GridConfig::default()
            .with_region_bits(r)
            .with_superregion_bits(s)
            .validate()
            .unwrap()
    })
}

fn small_index() -> SpatialIndex<u32> {
    SpatialIndex::new(
        GridConfig::new(10.0)
            .with_region_bits(2)
            .with_superregion_bits(2)
            .with_max_pooled_regions(4),
    )
    .unwrap()
}

fn coord() -> impl Strategy<Value = f64> {
    -4.0f64..4.0
}

fn triangle() -> impl Strategy<Value = [Point; 3]> {
    ((coord(), coord()), (coord(), coord()), (coord(), coord())).prop_map(|(a, b, c)| {
        [
            Point::new(a.0, a.1),
            Point::new(b.0, b.1),
            Point::new(c.0, c.1),
        ]
    })
}

fn snapshot(idx: &SpatialIndex<u32>) -> Vec<(PixelPoint, Vec<u32>)> {
    let mut v: Vec<_> = idx
        .iter()
        .map(|(p, c)| (p, c.iter().collect::<Vec<_>>()))
        .collect();
    v.sort();
    v
}

fn check_accounting(idx: &SpatialIndex<u32>) -> Result<(), TestCaseError> {
    let mut total = 0;
    for sr in idx.superregions() {
        let sum: usize = sr.regions().map(|(_, r)| r.count()).sum();
        prop_assert_eq!(sum, sr.count());
        for (_, r) in sr.regions() {
            let cells: usize = r.cells().map_or(0, |c| c.iter().map(Cell::len).sum());
            prop_assert_eq!(cells, r.count());
            prop_assert_eq!(r.is_populated(), r.count() > 0);
        }
        total += sr.count();
    }
    prop_assert_eq!(total, idx.occupancy());
    Ok(())
}

proptest! {
    // Splitting a coordinate into its three fields and joining them is lossless.
    #[test]
    fn decompose_recompose_is_lossless(l in layout(), px in any::<i32>(), py in any::<i32>()) {
        let s = l.pixel_to_superregion(px);
        let r = l.pixel_to_region(px);
        let c = l.pixel_to_cell(px);
        prop_assert_eq!(l.compose(s, r, c), px);
        prop_assert!((0..l.superregion_width()).contains(&r));
        prop_assert!((0..l.region_width()).contains(&c));

        let p = PixelPoint::new(px, py);
        prop_assert!(l.region_index(p) < l.regions_per_superregion());
        prop_assert!(l.cell_index(p) < l.cells_per_region());
        prop_assert!(l.superregion_bounds(l.origin_of(p)).contains(p));
    }

    // Inserting and then removing a footprint leaves the grid bit-identical.
    #[test]
    fn map_unmap_round_trip(background in triangle(), shape in triangle()) {
        let mut idx = small_index();
        let mut scratch = Vec::new();
        let mut bg = Vec::new();
        idx.insert_polygon(&background, 1, &mut bg, &mut scratch).unwrap();
        let before = snapshot(&idx);
        let occupancy = idx.occupancy();

        let mut fp = Vec::new();
        idx.insert_polygon(&shape, 2, &mut fp, &mut scratch).unwrap();
        check_accounting(&idx)?;
        for p in &scratch {
            let cell = idx.cell(*p).unwrap();
            prop_assert_eq!(cell.iter().filter(|&v| v == 2).count(), 1);
        }

        idx.remove_all(&mut fp, 2);
        prop_assert_eq!(snapshot(&idx), before);
        prop_assert_eq!(idx.occupancy(), occupancy);
        check_accounting(&idx)?;
    }

    // Counters agree at every level after arbitrary insert/remove interleavings.
    #[test]
    fn occupancy_accounting_holds(
        ops in prop::collection::vec((any::<bool>(), -60i32..60, -60i32..60), 1..200)
    ) {
        let mut idx = small_index();
        let mut live: Vec<(Placement, u32)> = Vec::new();
        for (i, (insert, x, y)) in ops.into_iter().enumerate() {
            if insert || live.is_empty() {
                let v = i as u32;
                live.push((idx.insert(PixelPoint::new(x, y), v).unwrap(), v));
            } else {
                let k = (x.unsigned_abs() as usize) % live.len();
                let (placement, v) = live.swap_remove(k);
                idx.remove(placement, v);
            }
            check_accounting(&idx)?;
        }
        prop_assert_eq!(idx.occupancy(), live.len());
    }

    // Co-located entries always iterate in insertion order.
    #[test]
    fn cell_order_is_insertion_order(
        n in 1usize..24,
        remove in prop::collection::vec(any::<bool>(), 24)
    ) {
        let mut idx = small_index();
        let p = PixelPoint::new(3, -2);
        let placements: Vec<_> = (0..n as u32).map(|v| idx.insert(p, v).unwrap()).collect();
        let mut kept = Vec::new();
        for (v, placement) in placements.into_iter().enumerate() {
            if remove[v] {
                idx.remove(placement, v as u32);
            } else {
                kept.push(v as u32);
            }
        }
        let got: Vec<u32> = idx.cell(p).map_or_else(Vec::new, |c| c.iter().collect());
        prop_assert_eq!(got, kept);
    }

    // Storage reused after a region empties never carries stale entries.
    #[test]
    fn reclaimed_storage_starts_empty(
        first in prop::collection::vec((0i32..4, 0i32..4), 1..16),
        second in (0i32..4, 0i32..4)
    ) {
        let mut idx = small_index();
        let mut placements = Vec::new();
        for &(x, y) in &first {
            placements.push(idx.insert(PixelPoint::new(x, y), 1).unwrap());
        }
        for placement in placements {
            idx.remove(placement, 1);
        }
        let p = PixelPoint::new(0, 0);
        prop_assert!(!idx.region_at(p).unwrap().is_populated());
        prop_assert_eq!(idx.pooled_regions(), 1);

        let q = PixelPoint::new(second.0, second.1);
        let _ = idx.insert(q, 2).unwrap();
        prop_assert_eq!(idx.pooled_regions(), 0);
        prop_assert_eq!(snapshot(&idx), vec![(q, vec![2])]);
    }

    // Every pixel whose center is inside a rectangle is covered, and nothing
    // outside its floored bounds is.
    #[test]
    fn rectangle_footprint_is_complete(
        x0 in -50.0f64..50.0, y0 in -50.0f64..50.0,
        w in 0.1f64..30.0, h in 0.1f64..30.0
    ) {
        let (x1, y1) = (x0 + w, y0 + h);
        let rect = [
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ];
        let mut out = Vec::new();
        rasterize_polygon(&rect, &mut out);

        let (fx0, fy0) = (x0.floor() as i32, y0.floor() as i32);
        let (fx1, fy1) = (x1.floor() as i32, y1.floor() as i32);
        for y in fy0..=fy1 {
            for x in fx0..=fx1 {
                let (cx, cy) = (f64::from(x) + 0.5, f64::from(y) + 0.5);
                if cx > x0 && cx < x1 && cy > y0 && cy < y1 {
                    prop_assert!(out.binary_search(&PixelPoint::new(x, y)).is_ok());
                }
            }
        }
        for p in &out {
            prop_assert!((fx0..=fx1).contains(&p.x) && (fy0..=fy1).contains(&p.y));
        }
    }
}
