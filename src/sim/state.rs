//! Game state definitions
//!
//! All state here is deterministic and serializable.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{CollisionQuery, EntityId};
use super::generator;
use super::player::Player;
use super::polarity::{Layers, Polarity};
use super::track::Track;
use crate::config::SimConfig;
use crate::error::StartupError;

/// Undrained events kept at most; the oldest are dropped past this
pub const MAX_QUEUED_EVENTS: usize = 256;

/// Something that happened during a tick, for presentation to react to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A jump fired; `count` is the position in the chain (1 = first)
    Jumped { count: u32 },
    Landed,
    DashStarted,
    DashEnded,
    PolaritySwitched(Polarity),
    CoinCollected { id: EntityId, value: u32 },
    /// The player stepped onto a falling platform
    FallAttached(EntityId),
    FallDetached(EntityId),
    SegmentSpawned(EntityId),
    HitObstacle(EntityId),
    Died { distance: f32 },
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Tunables this run was started with (already validated)
    pub config: SimConfig,
    /// Generation RNG
    pub rng: Pcg32,
    pub player: Player,
    pub track: Track,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Events since the last drain, capped at [`MAX_QUEUED_EVENTS`].
    /// Hosts may ignore them; nothing in the simulation reads them back.
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Validate `config`, lay the starting platform and drop the player onto it.
    ///
    /// Fails if the config is inconsistent or the startup ground probe finds
    /// no platform under the spawn point.
    pub fn new(config: SimConfig, seed: u64) -> Result<Self, StartupError> {
        config.validate()?;

        let mut track = Track::new(&config.world);
        generator::spawn_initial(&mut track, &config.world);

        let ground_top = probe_ground(&track, &config)?;
        let player = Player::new(config.world.player_x, ground_top);

        let mut state = Self {
            seed,
            config,
            rng: Pcg32::seed_from_u64(seed),
            player,
            track,
            time_ticks: 0,
            events: Vec::new(),
        };
        let spawned = generator::generate(
            &mut state.track,
            &mut state.rng,
            &state.config.track,
            &state.config.world,
        );
        state
            .events
            .extend(spawned.into_iter().map(GameEvent::SegmentSpawned));

        log::info!(
            "Run started (seed {}, {} segments ahead)",
            seed,
            state.track.segments.len()
        );
        Ok(state)
    }

    /// Take all events recorded since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drop the oldest events beyond [`MAX_QUEUED_EVENTS`]
    pub fn trim_events(&mut self) {
        if let Some(excess) = self.events.len().checked_sub(MAX_QUEUED_EVENTS) {
            self.events.drain(..excess);
        }
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.track.segments.sort_by_key(|s| s.id);
        self.track.obstacles.sort_by_key(|o| o.id);
        self.track.coins.sort_by_key(|c| c.id);
    }
}

/// Cast straight down through both polarities from the ceiling to the death
/// floor at the player's column; returns the top of the first platform hit.
fn probe_ground(track: &Track, config: &SimConfig) -> Result<f32, StartupError> {
    let world = &config.world;
    let origin = Vec2::new(world.player_x, world.ceiling_y);
    track
        .raycast(
            origin,
            Vec2::NEG_Y,
            world.ceiling_y - world.death_floor,
            Layers::ALL_PLATFORMS,
        )
        .map(|hit| hit.bounds.top())
        .ok_or(StartupError::NoGroundUnderPlayer {
            x: origin.x,
            y: origin.y,
        })
}
