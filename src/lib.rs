//! Neon Dash - An endless side-scrolling polarity runner
//!
//! Core modules:
//! - `sim`: Deterministic simulation (player physics, track generation, collision queries)
//! - `config`: Data-driven tunables with load-time validation
//! - `persistence`: Save data and the stores that hold it
//! - `session`: Fixed-step driver that wires the simulation to a save store

pub mod config;
pub mod error;
pub mod persistence;
pub mod session;
pub mod sim;

pub use config::{PlayerConfig, SimConfig, TrackConfig, WorldConfig};
pub use error::{ConfigError, PersistenceError, StartupError};
pub use session::{Hud, Session};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (50 Hz)
    pub const SIM_DT: f32 = 1.0 / 50.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame time the driver will try to catch up on
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Player collision box (world units)
    pub const PLAYER_HALF_WIDTH: f32 = 0.5;
    pub const PLAYER_HALF_HEIGHT: f32 = 0.5;

    /// Obstacle (spike) collision box
    pub const OBSTACLE_HALF_WIDTH: f32 = 0.3;
    pub const OBSTACLE_HALF_HEIGHT: f32 = 0.5;
    /// Spikes sit slightly sunk into the platform surface
    pub const OBSTACLE_SINK: f32 = 0.2;

    /// Coin trigger radius
    pub const COIN_RADIUS: f32 = 0.5;
    /// Seconds a collected coin lingers before removal
    pub const COIN_COLLECT_DURATION: f32 = 0.2;

    /// Platforms are solid blocks this deep below their top surface
    pub const PLATFORM_DEPTH: f32 = 10.0;

    /// Ceiling slab thickness
    pub const CEILING_THICKNESS: f32 = 1.0;

    /// Extra gap kept between the player and the ceiling after a bump
    pub const CEILING_SKIN: f32 = 0.01;
}
