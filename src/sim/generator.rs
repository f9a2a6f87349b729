//! Procedural track generation
//!
//! Each segment spawns exactly one successor once its right edge scrolls into
//! the generation band ahead of the screen. Successors inherit nothing but a
//! height anchor from their predecessor; polarity, falling behaviour, spikes
//! and coins are rolled fresh from the seeded RNG.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::collision::EntityId;
use super::polarity::Polarity;
use super::track::{Coin, FallBehavior, Obstacle, Segment, Track};
use crate::config::{TrackConfig, WorldConfig};
use crate::consts::*;

/// Layout used for the coins over one platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoinPattern {
    /// Evenly spaced at a constant height
    Line,
    /// Evenly spaced, highest over the middle of the platform
    Arc,
    /// Random x within the padded span, random extra height
    Scatter,
}

impl CoinPattern {
    pub const ALL: [CoinPattern; 3] = [CoinPattern::Line, CoinPattern::Arc, CoinPattern::Scatter];
}

/// Place the fixed starting platform (always polarity A, never falls)
pub fn spawn_initial(track: &mut Track, world: &WorldConfig) -> EntityId {
    let id = track.next_entity_id();
    let half_width = world.initial_platform_length * 0.5;
    track.segments.push(Segment {
        id,
        center_x: world.initial_platform_left + half_width,
        half_width,
        top: world.initial_platform_height,
        polarity: Polarity::A,
        generated_next: false,
        is_initial: true,
        fall: None,
        obstacles: Vec::new(),
        coins: Vec::new(),
    });
    id
}

/// Whether a right edge sits inside the generation band
fn in_generation_band(right: f32, cfg: &TrackConfig, world: &WorldConfig) -> bool {
    right < world.screen_right + cfg.generation_threshold
        && right > world.screen_right - cfg.generation_band_inside
}

/// Spawn successors for every segment that has entered the generation band.
///
/// Newly spawned segments are checked too, so the track is filled out to the
/// horizon within a single call. Returns the ids of the new segments.
pub fn generate(
    track: &mut Track,
    rng: &mut Pcg32,
    cfg: &TrackConfig,
    world: &WorldConfig,
) -> Vec<EntityId> {
    let mut spawned = Vec::new();
    loop {
        let ready: Vec<EntityId> = track
            .segments
            .iter()
            .filter(|s| !s.generated_next && in_generation_band(s.right(), cfg, world))
            .map(|s| s.id)
            .collect();
        if ready.is_empty() {
            break;
        }
        for id in ready {
            if let Some(new_id) = spawn_successor(track, rng, cfg, world, id) {
                spawned.push(new_id);
            }
        }
    }
    spawned
}

/// Spawn the segment following `predecessor`.
///
/// Returns `None` if the predecessor is gone or has already spawned its
/// successor.
pub fn spawn_successor(
    track: &mut Track,
    rng: &mut Pcg32,
    cfg: &TrackConfig,
    world: &WorldConfig,
    predecessor: EntityId,
) -> Option<EntityId> {
    let pred = track.segment_mut(predecessor)?;
    if pred.generated_next {
        return None;
    }
    pred.generated_next = true;
    let (pred_right, pred_top) = (pred.right(), pred.top);

    let width = rng.random_range(cfg.min_platform_length..=cfg.max_platform_length);
    let gap = rng.random_range(cfg.min_gap..=cfg.max_gap);
    let left = pred_right.max(world.screen_right) + gap;

    let delta = rng.random_range(-cfg.max_height_change..=cfg.max_height_change);
    let top = (pred_top + delta).clamp(cfg.min_allowed_height, cfg.max_allowed_height);

    let polarity = if rng.random_bool(0.5) {
        Polarity::A
    } else {
        Polarity::B
    };

    let fall = rng
        .random_bool(cfg.fall_chance)
        .then(|| FallBehavior::new(rng.random_range(cfg.min_fall_speed..=cfg.max_fall_speed)));

    let id = track.next_entity_id();
    log::debug!(
        "Segment {:?}: x {:.1}..{:.1}, top {:.2}, {}{}",
        id,
        left,
        left + width,
        top,
        polarity.as_str(),
        if fall.is_some() { ", falling" } else { "" }
    );
    track.segments.push(Segment {
        id,
        center_x: left + width * 0.5,
        half_width: width * 0.5,
        top,
        polarity,
        generated_next: false,
        is_initial: false,
        fall,
        obstacles: Vec::new(),
        coins: Vec::new(),
    });

    place_obstacles(track, rng, cfg, id);
    place_coins(track, rng, cfg, id);
    Some(id)
}

/// Rest 0..=max_obstacles spikes on the segment's surface
pub fn place_obstacles(track: &mut Track, rng: &mut Pcg32, cfg: &TrackConfig, segment: EntityId) {
    let Some(seg) = track.segment(segment) else {
        return;
    };
    let (left, right, top, polarity) = (seg.left(), seg.right(), seg.top, seg.polarity);
    let (lo, hi) = (left + cfg.obstacle_edge_inset, right - cfg.obstacle_edge_inset);
    if lo > hi {
        return;
    }

    let count = rng.random_range(0..=cfg.max_obstacles);
    let mut ids = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let id = track.next_entity_id();
        let x = rng.random_range(lo..=hi);
        track.obstacles.push(Obstacle {
            id,
            center: Vec2::new(x, top + OBSTACLE_HALF_HEIGHT - OBSTACLE_SINK),
            polarity,
            segment: Some(segment),
        });
        ids.push(id);
    }
    if let Some(seg) = track.segment_mut(segment) {
        seg.obstacles.extend(ids);
    }
}

/// How many coins fit on a span: `floor(available / spacing) + 1`, or a
/// single coin when the span is narrower than one spacing
pub fn coin_capacity(available: f32, spacing: f32) -> u32 {
    if available < spacing {
        1
    } else {
        (available / spacing).floor() as u32 + 1
    }
}

/// Roll whether the segment gets coins, how many, and in which pattern
pub fn place_coins(track: &mut Track, rng: &mut Pcg32, cfg: &TrackConfig, segment: EntityId) {
    let Some(seg) = track.segment(segment) else {
        return;
    };
    let (left, right, top) = (seg.left(), seg.right(), seg.top);

    if !rng.random_bool(cfg.coin_spawn_chance) {
        return;
    }
    let requested = rng.random_range(cfg.min_coins..=cfg.max_coins);
    if requested == 0 {
        return;
    }
    let available = (right - left) - 2.0 * cfg.coin_edge_padding;
    let count = requested.min(coin_capacity(available, cfg.coin_spacing));

    let pattern = CoinPattern::ALL[rng.random_range(0..CoinPattern::ALL.len())];
    let positions = coin_positions(pattern, left, right, top, count, cfg, rng);

    let mut ids = Vec::with_capacity(positions.len());
    for center in positions {
        let id = track.next_entity_id();
        track.coins.push(Coin {
            id,
            center,
            value: cfg.coin_value,
            collect_timer: None,
            segment: Some(segment),
        });
        ids.push(id);
    }
    if let Some(seg) = track.segment_mut(segment) {
        seg.coins.extend(ids);
    }
}

/// Coin centres for `count` coins over a platform spanning `left..right`
pub fn coin_positions(
    pattern: CoinPattern,
    left: f32,
    right: f32,
    top: f32,
    count: u32,
    cfg: &TrackConfig,
    rng: &mut Pcg32,
) -> Vec<Vec2> {
    let start = left + cfg.coin_edge_padding;
    let end = right - cfg.coin_edge_padding;
    let base_y = top + cfg.coin_height;

    let evenly = |i: u32| -> (f32, f32) {
        if count > 1 {
            let t = i as f32 / (count - 1) as f32;
            (start + (end - start) * t, t)
        } else {
            ((start + end) * 0.5, 0.5)
        }
    };

    (0..count)
        .map(|i| match pattern {
            CoinPattern::Line => Vec2::new(evenly(i).0, base_y),
            CoinPattern::Arc => {
                let (x, t) = evenly(i);
                let lift = (t * std::f32::consts::PI).sin() * cfg.coin_arc_height;
                Vec2::new(x, base_y + lift)
            }
            CoinPattern::Scatter => {
                let x = if start < end {
                    rng.random_range(start..=end)
                } else {
                    (start + end) * 0.5
                };
                let lift = rng.random_range(0.0..=cfg.coin_scatter_height);
                Vec2::new(x, base_y + lift)
            }
        })
        .collect()
}
