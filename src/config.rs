//! Simulation tunables
//!
//! Loaded from JSON (any missing field falls back to its default) and
//! validated once, before a simulation is built from them.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::PLAYER_HALF_HEIGHT;
use crate::error::ConfigError;

/// Player movement tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Vertical acceleration while not holding a jump (negative = down)
    pub gravity: f32,
    /// Horizontal speed cap outside of a dash
    pub max_horizontal_velocity: f32,
    /// Ground acceleration at zero speed; tapers to 0 at the cap
    pub max_acceleration: f32,
    /// Initial vertical speed of every jump
    pub jump_velocity: f32,
    /// Longest a first jump can suppress gravity while held
    pub max_hold_jump_time: f32,
    /// How far above the last ground height a first jump is still allowed
    pub jump_ground_threshold: f32,
    /// Length of the downward ground probe when not falling
    pub ground_check_distance: f32,
    /// Extra length of the upward ceiling probe
    pub ceiling_check_distance: f32,
    /// Jumps per chain (1 = no double jump)
    pub max_jumps: u32,
    /// Whether jumps after the first are allowed at all
    pub can_double_jump: bool,
    /// Horizontal speed forced while dashing
    pub dash_boost_speed: f32,
    /// Seconds a dash lasts
    pub dash_duration: f32,
    /// Seconds between dash starts
    pub dash_cooldown: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            gravity: -60.0,
            max_horizontal_velocity: 100.0,
            max_acceleration: 10.0,
            jump_velocity: 20.0,
            max_hold_jump_time: 0.4,
            jump_ground_threshold: 1.0,
            ground_check_distance: 0.1,
            ceiling_check_distance: 0.2,
            max_jumps: 2,
            can_double_jump: true,
            dash_boost_speed: 250.0,
            dash_duration: 0.15,
            dash_cooldown: 0.8,
        }
    }
}

/// Track generator tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    pub min_platform_length: f32,
    pub max_platform_length: f32,
    pub min_gap: f32,
    pub max_gap: f32,
    /// Largest height difference between consecutive platform tops
    pub max_height_change: f32,
    pub min_allowed_height: f32,
    pub max_allowed_height: f32,
    /// How far past the screen edge a platform's right edge may be when it spawns its successor
    pub generation_threshold: f32,
    /// How far inside the screen edge the spawn band reaches
    pub generation_band_inside: f32,
    /// Chance that a spawned platform falls once stood on
    pub fall_chance: f64,
    pub min_fall_speed: f32,
    pub max_fall_speed: f32,
    /// Obstacles per platform are drawn from `0..=max_obstacles`
    pub max_obstacles: u32,
    /// Obstacles keep this far from either platform edge
    pub obstacle_edge_inset: f32,
    /// Chance that a platform carries any coins
    pub coin_spawn_chance: f64,
    pub min_coins: u32,
    pub max_coins: u32,
    /// Coin baseline above the platform top
    pub coin_height: f32,
    /// Minimum horizontal distance between coins
    pub coin_spacing: f32,
    /// Coins keep this far from either platform edge
    pub coin_edge_padding: f32,
    /// Peak extra height of the arc pattern
    pub coin_arc_height: f32,
    /// Height jitter of the scatter pattern
    pub coin_scatter_height: f32,
    pub coin_value: u32,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            min_platform_length: 10.0,
            max_platform_length: 15.0,
            min_gap: 2.0,
            max_gap: 5.0,
            max_height_change: 2.0,
            min_allowed_height: -3.0,
            max_allowed_height: 8.0,
            generation_threshold: 30.0,
            generation_band_inside: 5.0,
            fall_chance: 0.2,
            min_fall_speed: 1.0,
            max_fall_speed: 3.0,
            max_obstacles: 2,
            obstacle_edge_inset: 1.0,
            coin_spawn_chance: 0.7,
            min_coins: 0,
            max_coins: 5,
            coin_height: 1.5,
            coin_spacing: 1.0,
            coin_edge_padding: 1.0,
            coin_arc_height: 2.0,
            coin_scatter_height: 2.0,
            coin_value: 1,
        }
    }
}

/// Fixed world geometry: view bounds, cutoffs and the starting platform
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Right edge of the visible area
    pub screen_right: f32,
    /// Fixed horizontal position of the player (the world scrolls past it)
    pub player_x: f32,
    /// Falling below this height is fatal
    pub death_floor: f32,
    /// Platforms whose right edge passes this x are recycled
    pub segment_cutoff: f32,
    pub obstacle_cutoff: f32,
    pub coin_cutoff: f32,
    /// Bottom face of the ceiling slab
    pub ceiling_y: f32,
    /// Half-width of the ceiling slab around the player
    pub ceiling_half_width: f32,
    pub initial_platform_left: f32,
    pub initial_platform_length: f32,
    pub initial_platform_height: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            screen_right: 17.8,
            player_x: -10.0,
            death_floor: -20.0,
            segment_cutoff: -25.0,
            obstacle_cutoff: -20.0,
            coin_cutoff: -30.0,
            ceiling_y: 10.0,
            ceiling_half_width: 40.0,
            initial_platform_left: -25.0,
            initial_platform_length: 40.0,
            initial_platform_height: 0.0,
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub player: PlayerConfig,
    pub track: TrackConfig,
    pub world: WorldConfig,
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn ordered(field: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    if min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvertedRange { field, min, max })
    }
}

fn probability(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::NotAProbability { field, value })
    }
}

impl PlayerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_jumps == 0 {
            return Err(ConfigError::NoJumps);
        }
        positive("max_horizontal_velocity", self.max_horizontal_velocity)?;
        non_negative("max_acceleration", self.max_acceleration)?;
        positive("jump_velocity", self.jump_velocity)?;
        non_negative("max_hold_jump_time", self.max_hold_jump_time)?;
        non_negative("jump_ground_threshold", self.jump_ground_threshold)?;
        positive("ground_check_distance", self.ground_check_distance)?;
        non_negative("ceiling_check_distance", self.ceiling_check_distance)?;
        positive("dash_boost_speed", self.dash_boost_speed)?;
        positive("dash_duration", self.dash_duration)?;
        non_negative("dash_cooldown", self.dash_cooldown)?;
        Ok(())
    }
}

impl TrackConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("min_platform_length", self.min_platform_length)?;
        ordered(
            "platform_length",
            self.min_platform_length,
            self.max_platform_length,
        )?;
        non_negative("min_gap", self.min_gap)?;
        ordered("gap", self.min_gap, self.max_gap)?;
        non_negative("max_height_change", self.max_height_change)?;
        ordered(
            "allowed_height",
            self.min_allowed_height,
            self.max_allowed_height,
        )?;
        non_negative("generation_threshold", self.generation_threshold)?;
        non_negative("generation_band_inside", self.generation_band_inside)?;
        probability("fall_chance", self.fall_chance)?;
        non_negative("min_fall_speed", self.min_fall_speed)?;
        ordered("fall_speed", self.min_fall_speed, self.max_fall_speed)?;
        non_negative("obstacle_edge_inset", self.obstacle_edge_inset)?;
        probability("coin_spawn_chance", self.coin_spawn_chance)?;
        ordered("coins", self.min_coins as f32, self.max_coins as f32)?;
        positive("coin_spacing", self.coin_spacing)?;
        non_negative("coin_edge_padding", self.coin_edge_padding)?;
        non_negative("coin_scatter_height", self.coin_scatter_height)?;

        let inset = self.obstacle_edge_inset.max(self.coin_edge_padding);
        if self.min_platform_length <= 2.0 * inset {
            return Err(ConfigError::PlatformTooShort {
                length: self.min_platform_length,
                padding: inset,
            });
        }
        Ok(())
    }
}

impl WorldConfig {
    pub fn validate(&self, track: &TrackConfig) -> Result<(), ConfigError> {
        ordered("segment_cutoff", self.segment_cutoff, self.screen_right)?;
        ordered("death_floor", self.death_floor, self.ceiling_y)?;
        positive("ceiling_half_width", self.ceiling_half_width)?;
        positive("initial_platform_length", self.initial_platform_length)?;

        let height = self.initial_platform_height;
        if height < track.min_allowed_height || height > track.max_allowed_height {
            return Err(ConfigError::InitialHeightOutOfRange {
                height,
                min: track.min_allowed_height,
                max: track.max_allowed_height,
            });
        }
        // The player spawns standing on the initial platform
        if height + 2.0 * PLAYER_HALF_HEIGHT > self.ceiling_y {
            return Err(ConfigError::InitialPlatformAboveCeiling {
                height,
                ceiling: self.ceiling_y,
            });
        }
        Ok(())
    }
}

impl SimConfig {
    /// Check every section; the first problem found is reported
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.player.validate()?;
        self.track.validate()?;
        self.world.validate(&self.track)?;
        Ok(())
    }

    /// Parse a JSON document and validate it
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }
}
