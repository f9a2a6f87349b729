//! Collision queries for axis-aligned track geometry
//!
//! Everything collidable in the runner is an axis-aligned box: platforms,
//! spikes, the ceiling slab and coin triggers. Queries filter by layer mask
//! and answer with a typed entity reference, so callers never need a second
//! lookup to find out what they hit.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::polarity::Layers;

/// Stable id of a spawned entity (allocated in spawn order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// What a query hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityRef {
    Platform(EntityId),
    Obstacle(EntityId),
    Collectible(EntityId),
    Ceiling,
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.min.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.max.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.max.y
    }

    /// Boxes that only touch along an edge do not overlap
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
}

/// A box registered for queries
#[derive(Debug, Clone, Copy)]
pub struct Collider {
    pub entity: EntityRef,
    pub layer: Layers,
    pub bounds: Aabb,
}

/// Nearest blocking surface along a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub entity: EntityRef,
    /// Where the ray entered the box (the origin if it started inside)
    pub point: Vec2,
    /// Distance from the origin to `point`
    pub distance: f32,
    /// Bounds of the hit collider
    pub bounds: Aabb,
}

/// Distance along `dir` at which the ray enters `aabb`.
///
/// Rays that start inside the box hit at distance 0. `dir` should be
/// normalized; axis-parallel rays are handled exactly.
pub fn ray_aabb(origin: Vec2, dir: Vec2, max_distance: f32, aabb: &Aabb) -> Option<f32> {
    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;

    for axis in 0..2 {
        let o = origin[axis];
        let d = dir[axis];
        let (lo, hi) = (aabb.min[axis], aabb.max[axis]);

        if d.abs() < 1e-8 {
            // Parallel to this slab: must already be inside it
            if o < lo || o > hi {
                return None;
            }
        } else {
            let t1 = (lo - o) / d;
            let t2 = (hi - o) / d;
            t_near = t_near.max(t1.min(t2));
            t_far = t_far.min(t1.max(t2));
        }
    }

    if t_near > t_far || t_far < 0.0 {
        return None;
    }
    let t = t_near.max(0.0);
    (t <= max_distance).then_some(t)
}

/// Collision query service used by the player controller and generator
pub trait CollisionQuery {
    /// Nearest collider on `mask` hit by the ray, or `None`.
    ///
    /// A non-positive `max_distance` never hits.
    fn raycast(&self, origin: Vec2, dir: Vec2, max_distance: f32, mask: Layers)
    -> Option<RayHit>;

    /// Every collider on `mask` overlapping `bounds`
    fn overlapping(&self, bounds: &Aabb, mask: Layers) -> Vec<EntityRef>;
}

/// Nearest hit among `colliders`; ties go to the first in iteration order
pub fn nearest_hit(
    colliders: impl Iterator<Item = Collider>,
    origin: Vec2,
    dir: Vec2,
    max_distance: f32,
    mask: Layers,
) -> Option<RayHit> {
    if max_distance <= 0.0 {
        return None;
    }
    let mut best: Option<RayHit> = None;
    for collider in colliders {
        if !mask.intersects(collider.layer) {
            continue;
        }
        let Some(distance) = ray_aabb(origin, dir, max_distance, &collider.bounds) else {
            continue;
        };
        if best.is_none_or(|b| distance < b.distance) {
            best = Some(RayHit {
                entity: collider.entity,
                point: origin + dir * distance,
                distance,
                bounds: collider.bounds,
            });
        }
    }
    best
}

/// A flat list of colliders (handy for fixed scenes and tests)
#[derive(Debug, Clone, Default)]
pub struct ColliderSet {
    pub colliders: Vec<Collider>,
}

impl ColliderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entity: EntityRef, layer: Layers, bounds: Aabb) {
        self.colliders.push(Collider {
            entity,
            layer,
            bounds,
        });
    }
}

impl CollisionQuery for ColliderSet {
    fn raycast(
        &self,
        origin: Vec2,
        dir: Vec2,
        max_distance: f32,
        mask: Layers,
    ) -> Option<RayHit> {
        nearest_hit(
            self.colliders.iter().copied(),
            origin,
            dir,
            max_distance,
            mask,
        )
    }

    fn overlapping(&self, bounds: &Aabb, mask: Layers) -> Vec<EntityRef> {
        self.colliders
            .iter()
            .filter(|c| mask.intersects(c.layer) && c.bounds.overlaps(bounds))
            .map(|c| c.entity)
            .collect()
    }
}
