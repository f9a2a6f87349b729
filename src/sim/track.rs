//! Track entities: platforms, spikes and coins
//!
//! The world scrolls toward the player: every tick each entity moves left by
//! the player's horizontal travel. Entities are stored flat and sorted by id;
//! cross references (segment <-> obstacle, segment <-> standing player) are
//! ids that are cleared at both ends when either side is removed.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Aabb, Collider, CollisionQuery, EntityId, EntityRef, RayHit, nearest_hit};
use super::polarity::{Layers, Polarity};
use crate::config::WorldConfig;
use crate::consts::*;

/// Sinking behaviour attached to some platforms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallBehavior {
    /// Units per second the platform sinks once triggered
    pub fall_speed: f32,
    /// Whether the player is currently standing on this platform
    pub player_attached: bool,
    /// Latched on first attach; the platform keeps sinking afterwards
    pub falling: bool,
}

impl FallBehavior {
    pub fn new(fall_speed: f32) -> Self {
        Self {
            fall_speed,
            player_attached: false,
            falling: false,
        }
    }

    pub fn attach(&mut self) {
        self.player_attached = true;
        self.falling = true;
    }

    pub fn detach(&mut self) {
        self.player_attached = false;
    }
}

/// One generated platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub id: EntityId,
    /// Horizontal center
    pub center_x: f32,
    pub half_width: f32,
    /// Height of the walkable surface
    pub top: f32,
    pub polarity: Polarity,
    /// Set once this segment has spawned its successor
    pub generated_next: bool,
    pub is_initial: bool,
    pub fall: Option<FallBehavior>,
    /// Spikes spawned on this segment (weak; may already be gone)
    pub obstacles: Vec<EntityId>,
    /// Coins spawned over this segment (weak; may already be gone)
    pub coins: Vec<EntityId>,
}

impl Segment {
    #[inline]
    pub fn left(&self) -> f32 {
        self.center_x - self.half_width
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.center_x + self.half_width
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.half_width * 2.0
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(
            Vec2::new(self.left(), self.top - PLATFORM_DEPTH),
            Vec2::new(self.right(), self.top),
        )
    }

    pub fn layer(&self) -> Layers {
        self.polarity.platform_layer()
    }
}

/// A spike resting on a platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: EntityId,
    pub center: Vec2,
    /// Always the polarity of the segment it was spawned on
    pub polarity: Polarity,
    /// Segment it was spawned on (weak)
    pub segment: Option<EntityId>,
}

impl Obstacle {
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(
            self.center,
            Vec2::new(OBSTACLE_HALF_WIDTH, OBSTACLE_HALF_HEIGHT),
        )
    }

    pub fn layer(&self) -> Layers {
        self.polarity.obstacle_layer()
    }
}

/// A collectible coin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coin {
    pub id: EntityId,
    pub center: Vec2,
    pub value: u32,
    /// Seconds left on the collect animation; `Some` once collected
    pub collect_timer: Option<f32>,
    /// Segment it was spawned over (weak)
    pub segment: Option<EntityId>,
}

impl Coin {
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.center, Vec2::splat(COIN_RADIUS))
    }

    #[inline]
    pub fn is_collected(&self) -> bool {
        self.collect_timer.is_some()
    }
}

/// Ids removed by a recycling pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recycled {
    pub segments: Vec<EntityId>,
    pub obstacles: Vec<EntityId>,
    pub coins: Vec<EntityId>,
}

impl Recycled {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.obstacles.is_empty() && self.coins.is_empty()
    }
}

/// All live track geometry; answers collision queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Sorted by id
    pub segments: Vec<Segment>,
    /// Sorted by id
    pub obstacles: Vec<Obstacle>,
    /// Sorted by id
    pub coins: Vec<Coin>,
    /// Polarity-independent slab above the play area
    pub ceiling: Aabb,
    next_id: u32,
}

impl Track {
    /// Empty track with a ceiling slab spanning the view around the player
    pub fn new(world: &WorldConfig) -> Self {
        let ceiling = Aabb::new(
            Vec2::new(world.player_x - world.ceiling_half_width, world.ceiling_y),
            Vec2::new(
                world.player_x + world.ceiling_half_width,
                world.ceiling_y + CEILING_THICKNESS,
            ),
        );
        Self {
            segments: Vec::new(),
            obstacles: Vec::new(),
            coins: Vec::new(),
            ceiling,
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn segment(&self, id: EntityId) -> Option<&Segment> {
        self.segments
            .binary_search_by_key(&id, |s| s.id)
            .ok()
            .map(|i| &self.segments[i])
    }

    pub fn segment_mut(&mut self, id: EntityId) -> Option<&mut Segment> {
        self.segments
            .binary_search_by_key(&id, |s| s.id)
            .ok()
            .map(|i| &mut self.segments[i])
    }

    pub fn obstacle(&self, id: EntityId) -> Option<&Obstacle> {
        self.obstacles
            .binary_search_by_key(&id, |o| o.id)
            .ok()
            .map(|i| &self.obstacles[i])
    }

    pub fn coin_mut(&mut self, id: EntityId) -> Option<&mut Coin> {
        self.coins
            .binary_search_by_key(&id, |c| c.id)
            .ok()
            .map(|i| &mut self.coins[i])
    }

    /// Rightmost generated platform edge
    pub fn frontier(&self) -> Option<f32> {
        self.segments.iter().map(Segment::right).reduce(f32::max)
    }

    /// Segment whose horizontal span contains `x`, if any
    pub fn segment_at(&self, x: f32) -> Option<&Segment> {
        self.segments
            .iter()
            .find(|s| s.left() <= x && x <= s.right())
    }

    /// First segment starting to the right of `x`
    pub fn next_segment_after(&self, x: f32) -> Option<&Segment> {
        self.segments
            .iter()
            .filter(|s| s.left() > x)
            .min_by(|a, b| a.left().total_cmp(&b.left()))
    }

    /// Move everything left by `dx`
    pub fn scroll(&mut self, dx: f32) {
        if dx == 0.0 {
            return;
        }
        for segment in &mut self.segments {
            segment.center_x -= dx;
        }
        for obstacle in &mut self.obstacles {
            obstacle.center.x -= dx;
        }
        for coin in &mut self.coins {
            coin.center.x -= dx;
        }
    }

    /// Sink triggered falling platforms along with their spikes
    pub fn update_falls(&mut self, dt: f32) {
        let mut sinking: Vec<(EntityId, f32)> = Vec::new();
        for segment in &mut self.segments {
            let Some(fall) = &segment.fall else { continue };
            if !fall.falling {
                continue;
            }
            let dy = fall.fall_speed * dt;
            segment.top -= dy;
            sinking.extend(segment.obstacles.iter().map(|&id| (id, dy)));
        }
        for (id, dy) in sinking {
            if let Ok(i) = self.obstacles.binary_search_by_key(&id, |o| o.id) {
                self.obstacles[i].center.y -= dy;
            }
        }
    }

    /// Tick collect animations; finished coins are removed
    pub fn update_coins(&mut self, dt: f32) -> Vec<EntityId> {
        let mut finished = Vec::new();
        for coin in &mut self.coins {
            if let Some(timer) = coin.collect_timer.as_mut() {
                *timer -= dt;
                if *timer <= 0.0 {
                    finished.push(coin.id);
                }
            }
        }
        for &id in &finished {
            self.remove_coin(id);
        }
        finished
    }

    /// Remove everything that scrolled past its trailing cutoff, plus
    /// falling platforms that sank below the death floor.
    ///
    /// Each entity checks only its own bounds; removing a segment does not
    /// remove its spikes or coins.
    pub fn recycle(&mut self, world: &WorldConfig) -> Recycled {
        let out = Recycled {
            segments: self
                .segments
                .iter()
                .filter(|s| s.right() < world.segment_cutoff || s.top < world.death_floor)
                .map(|s| s.id)
                .collect(),
            obstacles: self
                .obstacles
                .iter()
                .filter(|o| o.bounds().right() < world.obstacle_cutoff)
                .map(|o| o.id)
                .collect(),
            coins: self
                .coins
                .iter()
                .filter(|c| c.bounds().right() < world.coin_cutoff)
                .map(|c| c.id)
                .collect(),
        };
        for &id in &out.segments {
            self.remove_segment(id);
        }
        for &id in &out.obstacles {
            self.remove_obstacle(id);
        }
        for &id in &out.coins {
            self.remove_coin(id);
        }
        out
    }

    /// Remove a segment and clear back-references to it
    pub fn remove_segment(&mut self, id: EntityId) -> bool {
        let Ok(i) = self.segments.binary_search_by_key(&id, |s| s.id) else {
            return false;
        };
        self.segments.remove(i);
        for obstacle in &mut self.obstacles {
            if obstacle.segment == Some(id) {
                obstacle.segment = None;
            }
        }
        for coin in &mut self.coins {
            if coin.segment == Some(id) {
                coin.segment = None;
            }
        }
        true
    }

    /// Remove a spike and drop it from its segment's list
    pub fn remove_obstacle(&mut self, id: EntityId) -> bool {
        let Ok(i) = self.obstacles.binary_search_by_key(&id, |o| o.id) else {
            return false;
        };
        let obstacle = self.obstacles.remove(i);
        if let Some(segment) = obstacle.segment.and_then(|s| self.segment_mut(s)) {
            segment.obstacles.retain(|&o| o != id);
        }
        true
    }

    /// Remove a coin and drop it from its segment's list
    pub fn remove_coin(&mut self, id: EntityId) -> bool {
        let Ok(i) = self.coins.binary_search_by_key(&id, |c| c.id) else {
            return false;
        };
        let coin = self.coins.remove(i);
        if let Some(segment) = coin.segment.and_then(|s| self.segment_mut(s)) {
            segment.coins.retain(|&c| c != id);
        }
        true
    }

    /// Clear every platform's attached-player flag
    pub fn detach_all(&mut self) {
        for fall in self.segments.iter_mut().filter_map(|s| s.fall.as_mut()) {
            fall.detach();
        }
    }

    fn colliders(&self) -> impl Iterator<Item = Collider> + '_ {
        let ceiling = std::iter::once(Collider {
            entity: EntityRef::Ceiling,
            layer: Layers::CEILING,
            bounds: self.ceiling,
        });
        let segments = self.segments.iter().map(|s| Collider {
            entity: EntityRef::Platform(s.id),
            layer: s.layer(),
            bounds: s.bounds(),
        });
        let obstacles = self.obstacles.iter().map(|o| Collider {
            entity: EntityRef::Obstacle(o.id),
            layer: o.layer(),
            bounds: o.bounds(),
        });
        let coins = self
            .coins
            .iter()
            .filter(|c| !c.is_collected())
            .map(|c| Collider {
                entity: EntityRef::Collectible(c.id),
                layer: Layers::COLLECTIBLE,
                bounds: c.bounds(),
            });
        ceiling.chain(segments).chain(obstacles).chain(coins)
    }
}

impl CollisionQuery for Track {
    fn raycast(
        &self,
        origin: Vec2,
        dir: Vec2,
        max_distance: f32,
        mask: Layers,
    ) -> Option<RayHit> {
        nearest_hit(self.colliders(), origin, dir, max_distance, mask)
    }

    fn overlapping(&self, bounds: &Aabb, mask: Layers) -> Vec<EntityRef> {
        self.colliders()
            .filter(|c| mask.intersects(c.layer) && c.bounds.overlaps(bounds))
            .map(|c| c.entity)
            .collect()
    }
}
