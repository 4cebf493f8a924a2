//! Visibility between a receiving sample and a photon.
//!
//! Occluders keep their own copy of every plate's corners, taken once before propagation
//! starts. Plate geometry never changes during a bake, so the solver can hand each parallel
//! task `&mut` access to its own plate while the occluder answers queries about the rest.

use crate::math::*;
use crate::scene::Plate;

/// Answers whether the segment `from → to` is blocked by any plate other than `skip`.
pub trait Occluder: Send + Sync {
    fn blocked(&self, from: Point3, to: Point3, skip: usize) -> bool;

    fn plate_count(&self) -> usize;
}

/// Which occluder a bake uses. Both give identical answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OcclusionStrategy {
    /// Test every plate's two triangles.
    #[default]
    BruteForce,
    /// Skip plates whose bounding box the segment misses.
    BoundsCulled,
}

impl OcclusionStrategy {
    pub fn build(self, plates: &[Plate]) -> Box<dyn Occluder> {
        match self {
            OcclusionStrategy::BruteForce => Box::new(BruteForce::new(plates)),
            OcclusionStrategy::BoundsCulled => Box::new(BoundsCulled::new(plates)),
        }
    }
}

fn quads_of(plates: &[Plate]) -> Vec<[Point3; 4]> {
    plates.iter().map(|p| p.corners).collect()
}

/// Exhaustive pairwise test against every other plate.
#[derive(Debug, Clone)]
pub struct BruteForce {
    quads: Vec<[Point3; 4]>,
}

impl BruteForce {
    pub fn new(plates: &[Plate]) -> Self {
        Self {
            quads: quads_of(plates),
        }
    }
}

impl Occluder for BruteForce {
    fn blocked(&self, from: Point3, to: Point3, skip: usize) -> bool {
        self.quads
            .iter()
            .enumerate()
            .any(|(i, quad)| i != skip && segment_intersects_quad(from, to, quad))
    }

    fn plate_count(&self) -> usize {
        self.quads.len()
    }
}

/// Box padding for flat plates; far larger than any reported crossing's overshoot.
const BOUNDS_PAD: f64 = 1e-4;

/// Brute force with a per-plate bounding-box rejection in front of the triangle test.
#[derive(Debug, Clone)]
pub struct BoundsCulled {
    quads: Vec<[Point3; 4]>,
    bounds: Vec<Aabb>,
}

impl BoundsCulled {
    pub fn new(plates: &[Plate]) -> Self {
        let quads = quads_of(plates);
        let bounds = quads.iter().map(|q| Aabb::enclosing(q, BOUNDS_PAD)).collect();
        Self { quads, bounds }
    }
}

impl Occluder for BoundsCulled {
    fn blocked(&self, from: Point3, to: Point3, skip: usize) -> bool {
        let segment = Ray::through(from, to);
        self.quads
            .iter()
            .zip(&self.bounds)
            .enumerate()
            .any(|(i, (quad, bounds))| {
                i != skip && bounds.hit(&segment, 0.0, 1.0) && segment_intersects_quad(from, to, quad)
            })
    }

    fn plate_count(&self) -> usize {
        self.quads.len()
    }
}
