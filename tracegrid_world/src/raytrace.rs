// Copyright 2026 the Tracegrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raytracing against mapped blocks.
//!
//! A ray is walked pixel by pixel through the index with [`LineWalk`],
//! nearest pixel first. Cells are only read: a ray through space no block was
//! ever mapped into touches no storage at all. Within a cell, blocks are
//! tested in insertion order and the first one the [`RayPredicate`] accepts
//! ends the walk.

use alloc::vec;
use alloc::vec::Vec;
use core::ops::ControlFlow;
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::Point;
use tracegrid_index::{LineWalk, PixelPoint};

use crate::model::Model;
use crate::types::{BlockId, Color, ModelId, Pose};
use crate::world::World;

/// Decides whether a candidate model stops a ray.
///
/// Predicates are called from inside the walk, possibly from several threads
/// at once when a fan is evaluated in parallel; they must not have side
/// effects. Closures `Fn(&Model, Option<&Model>) -> bool` implement this
/// trait, see [`predicates`](crate::predicates) for the stock ones.
pub trait RayPredicate: Sync {
    /// Whether `candidate` stops a ray cast by `finder` (if any).
    fn accepts(&self, candidate: &Model, finder: Option<&Model>) -> bool;
}

impl<F> RayPredicate for F
where
    F: Fn(&Model, Option<&Model>) -> bool + Sync,
{
    #[inline]
    fn accepts(&self, candidate: &Model, finder: Option<&Model>) -> bool {
        self(candidate, finder)
    }
}

/// A ray query.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    /// Origin in world coordinates; `a` is the direction.
    pub origin: Pose,
    /// Maximum range in meters.
    pub range: f64,
    /// The model casting the ray, passed to the predicate.
    pub finder: Option<ModelId>,
    /// Skip blocks whose height range does not contain `origin.z`.
    pub ztest: bool,
}

impl Ray {
    /// A ray with no finder and height testing enabled.
    pub const fn new(origin: Pose, range: f64) -> Self {
        Self {
            origin,
            range,
            finder: None,
            ztest: true,
        }
    }

    /// Set the model casting the ray.
    pub const fn with_finder(mut self, finder: ModelId) -> Self {
        self.finder = Some(finder);
        self
    }

    /// Enable or disable height testing.
    pub const fn with_ztest(mut self, ztest: bool) -> Self {
        self.ztest = ztest;
        self
    }

    /// The same ray pointing at `heading`.
    pub const fn with_heading(mut self, heading: f64) -> Self {
        self.origin.a = heading;
        self
    }
}

/// What a ray hit.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RayHit {
    /// Owner of the block that was hit.
    pub model: ModelId,
    /// The block that was hit.
    pub block: BlockId,
    /// The block's effective color.
    pub color: Color,
}

/// Outcome of a ray query.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RaytraceResult {
    /// The ray's origin and direction.
    pub pose: Pose,
    /// Distance to the hit, or exactly the ray's range on a miss.
    pub range: f64,
    /// The hit, if any.
    pub hit: Option<RayHit>,
}

impl RaytraceResult {
    fn miss(ray: &Ray) -> Self {
        Self {
            pose: ray.origin,
            range: ray.range,
            hit: None,
        }
    }

    /// Whether the ray hit something.
    #[inline]
    pub fn is_hit(&self) -> bool {
        self.hit.is_some()
    }

    /// The model that was hit.
    #[inline]
    pub fn model(&self) -> Option<ModelId> {
        self.hit.map(|h| h.model)
    }
}

impl World {
    /// Cast a single ray and return the nearest block the predicate accepts.
    ///
    /// "Nearest" means first along the pixel walk; two blocks sharing the hit
    /// pixel resolve in insertion order. The range of a hit is measured in
    /// whole pixels along the ray's major axis, so it is accurate to about
    /// one pixel. A ray starting inside an accepted block has range zero,
    /// however short the ray.
    ///
    /// # Panics
    ///
    /// If `ray.range` is negative or not finite, or the ray leaves the
    /// representable pixel lattice.
    pub fn raytrace<P>(&self, ray: &Ray, predicate: &P) -> RaytraceResult
    where
        P: RayPredicate + ?Sized,
    {
        assert!(
            ray.range.is_finite() && ray.range >= 0.0,
            "ray range must be finite and non-negative, got {}",
            ray.range
        );
        let finder = ray.finder.and_then(|id| self.model(id));
        let (sin, cos) = ray.origin.a.sin_cos();
        let start = self.index.point_to_pixel(ray.origin.position());
        let end = self.index.point_to_pixel(Point::new(
            ray.origin.x + ray.range * cos,
            ray.origin.y + ray.range * sin,
        ));
        // A walk excludes its end pixel; a ray ending in its own start pixel
        // still tests that pixel.
        let walk = if start == end {
            LineWalk::with_delta(start, 1, 0)
        } else {
            LineWalk::new(start, end)
        };
        let x_major = walk.is_x_major();

        let found = self.index.walk_line(walk, |_, cell| {
            for bid in cell.iter() {
                let block = self.block_ref(bid);
                if ray.ztest && !block.global_z().contains(ray.origin.z) {
                    continue;
                }
                let owner = self.model_ref(block.model());
                if predicate.accepts(owner, finder) {
                    return ControlFlow::Break(RayHit {
                        model: owner.id(),
                        block: bid,
                        color: block.color(owner.color()),
                    });
                }
            }
            ControlFlow::Continue(())
        });

        match found {
            Some((pixel, hit)) => RaytraceResult {
                pose: ray.origin,
                range: self.pixel_range(start, pixel, x_major, sin, cos).min(ray.range),
                hit: Some(hit),
            },
            None => RaytraceResult::miss(ray),
        }
    }

    /// Cast `samples` rays spread evenly over `fov` radians centered on the
    /// ray's heading.
    ///
    /// Sample `i` points at `heading - fov/2 + i * fov/(samples - 1)`; a
    /// single sample points at the heading itself.
    pub fn raytrace_fan<P>(
        &self,
        ray: &Ray,
        fov: f64,
        samples: usize,
        predicate: &P,
    ) -> Vec<RaytraceResult>
    where
        P: RayPredicate + ?Sized,
    {
        let mut out = vec![RaytraceResult::miss(ray); samples];
        self.raytrace_fan_into(ray, fov, predicate, &mut out);
        out
    }

    /// [`raytrace_fan`](Self::raytrace_fan) writing one result per element of
    /// `out`.
    ///
    /// With the `rayon` feature the samples are evaluated in parallel. The
    /// results do not depend on it.
    pub fn raytrace_fan_into<P>(
        &self,
        ray: &Ray,
        fov: f64,
        predicate: &P,
        out: &mut [RaytraceResult],
    ) where
        P: RayPredicate + ?Sized,
    {
        let samples = out.len();
        let sample = |i: usize| {
            let heading = fan_heading(ray.origin.a, fov, i, samples);
            self.raytrace(&ray.with_heading(heading), predicate)
        };
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            out.par_iter_mut()
                .enumerate()
                .for_each(|(i, r)| *r = sample(i));
        }
        #[cfg(not(feature = "rayon"))]
        for (i, r) in out.iter_mut().enumerate() {
            *r = sample(i);
        }
    }

    fn pixel_range(
        &self,
        start: PixelPoint,
        hit: PixelPoint,
        x_major: bool,
        sin: f64,
        cos: f64,
    ) -> f64 {
        let dx = f64::from(hit.x) - f64::from(start.x);
        let dy = f64::from(hit.y) - f64::from(start.y);
        if dx == 0.0 && dy == 0.0 {
            return 0.0;
        }
        let pixels = if x_major { dx / cos } else { dy / sin };
        pixels.abs() / self.resolution()
    }
}

#[allow(
    clippy::cast_precision_loss,
    reason = "sample counts are far below 2^52"
)]
fn fan_heading(heading: f64, fov: f64, i: usize, samples: usize) -> f64 {
    if samples <= 1 {
        return heading;
    }
    heading - fov / 2.0 + i as f64 * fov / (samples - 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicates;
    use crate::types::{LocalBlock, LocalModel, ZRange};
    use core::f64::consts::{FRAC_PI_2, FRAC_PI_4};
    use tracegrid_index::GridConfig;

    fn square_world() -> (World, ModelId) {
        let mut w = World::new(GridConfig::new(100.0)).unwrap();
        let m = w.add_model(None, LocalModel::default());
        w.add_block(m, LocalBlock::rect(0.0, 0.0, 1.0, 1.0)).unwrap();
        (w, m)
    }

    fn accept_all(_: &Model, _: Option<&Model>) -> bool {
        true
    }

    #[test]
    fn hits_the_square_at_one_meter() {
        let (w, m) = square_world();
        let ray = Ray::new(Pose::new(-1.0, 0.5, 0.5, 0.0), 5.0);
        let r = w.raytrace(&ray, &accept_all);
        assert_eq!(r.model(), Some(m));
        assert!((r.range - 1.0).abs() <= 0.01, "range {}", r.range);
        assert_eq!(r.pose, ray.origin);
        assert_eq!(r.hit.unwrap().color, Color::default());
    }

    #[test]
    fn short_ray_misses_at_exactly_its_range() {
        let (w, _) = square_world();
        let r = w.raytrace(&Ray::new(Pose::new(-1.0, 0.5, 0.5, 0.0), 0.5), &accept_all);
        assert!(!r.is_hit());
        assert_eq!(r.range, 0.5);
    }

    #[test]
    fn rejecting_predicate_sees_through() {
        let (w, m) = square_world();
        let ray = Ray::new(Pose::new(-1.0, 0.5, 0.5, 0.0), 5.0);
        let r = w.raytrace(&ray, &|c: &Model, _: Option<&Model>| c.id() != m);
        assert!(!r.is_hit());
        assert_eq!(r.range, 5.0);

        // The stock predicate never returns the finder.
        let r = w.raytrace(&ray.with_finder(m), &predicates::any_other());
        assert!(!r.is_hit());
    }

    #[test]
    fn origin_inside_a_block_hits_at_zero() {
        let (w, m) = square_world();
        let r = w.raytrace(&Ray::new(Pose::new(0.5, 0.5, 0.5, 1.0), 5.0), &accept_all);
        assert_eq!(r.model(), Some(m));
        assert_eq!(r.range, 0.0);
    }

    #[test]
    fn short_ray_inside_a_block_hits_at_zero() {
        let (w, m) = square_world();
        for range in [0.0, 0.001] {
            let r = w.raytrace(&Ray::new(Pose::new(0.5, 0.5, 0.5, 0.3), range), &accept_all);
            assert_eq!(r.model(), Some(m));
            assert_eq!(r.range, 0.0);
        }
        // Straight up, where the major-axis divisor vanishes.
        let r = w.raytrace(&Ray::new(Pose::new(0.5, 0.5, 0.5, FRAC_PI_2), 0.001), &accept_all);
        assert_eq!(r.range, 0.0);
        // Still a miss from empty space.
        let r = w.raytrace(&Ray::new(Pose::new(-1.0, 0.5, 0.5, 0.0), 0.001), &accept_all);
        assert!(!r.is_hit());
        assert_eq!(r.range, 0.001);
    }

    #[test]
    fn ztest_gates_on_origin_height() {
        let mut w = World::new(GridConfig::new(100.0)).unwrap();
        let m = w.add_model(None, LocalModel::default());
        w.add_block(m, LocalBlock::rect(0.0, 0.0, 1.0, 1.0).with_z(ZRange::new(0.0, 0.5)))
            .unwrap();
        let ray = Ray::new(Pose::new(-1.0, 0.5, 0.8, 0.0), 5.0);
        assert!(!w.raytrace(&ray, &accept_all).is_hit());
        assert!(w.raytrace(&ray.with_ztest(false), &accept_all).is_hit());
    }

    #[test]
    fn vertical_rays_use_the_y_axis() {
        let (w, m) = square_world();
        let r = w.raytrace(&Ray::new(Pose::new(0.5, -2.0, 0.5, FRAC_PI_2), 5.0), &accept_all);
        assert_eq!(r.model(), Some(m));
        assert!((r.range - 2.0).abs() <= 0.01, "range {}", r.range);
    }

    #[test]
    fn fan_headings_and_ranges() {
        let mut w = World::new(GridConfig::new(100.0)).unwrap();
        let wall = w.add_model(None, LocalModel::default());
        w.add_block(wall, LocalBlock::rect(1.0, -5.0, 2.0, 5.0)).unwrap();

        let ray = Ray::new(Pose::new(0.0, 0.0, 0.5, 0.0), 5.0);
        let fan = w.raytrace_fan(&ray, FRAC_PI_2, 3, &accept_all);
        assert_eq!(fan.len(), 3);
        let headings: Vec<f64> = fan.iter().map(|r| r.pose.a).collect();
        assert_eq!(headings, [-FRAC_PI_4, 0.0, FRAC_PI_4]);
        assert!((fan[1].range - 1.0).abs() <= 0.01);
        for r in [fan[0], fan[2]] {
            assert_eq!(r.model(), Some(wall));
            assert!((r.range - 2.0_f64.sqrt()).abs() <= 0.03, "range {}", r.range);
        }

        let single = w.raytrace_fan(&ray, FRAC_PI_2, 1, &accept_all);
        assert_eq!(single[0].pose.a, 0.0);
        assert!(w.raytrace_fan(&ray, FRAC_PI_2, 0, &accept_all).is_empty());
    }

    #[test]
    fn rays_do_not_create_storage() {
        let (w, _) = square_world();
        let before = w.index().superregions().count();
        let r = w.raytrace(&Ray::new(Pose::new(-50.0, -50.0, 0.5, 0.3), 40.0), &accept_all);
        assert!(!r.is_hit());
        assert_eq!(w.index().superregions().count(), before);
    }
}
