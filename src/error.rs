//! Error types
//!
//! Simulation misses (no raycast hit, polarity mismatch) are plain `Option`s.
//! These errors only cover configuration, startup and persistence.

use thiserror::Error;

/// A tunable was out of range or inconsistent with another tunable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: f32 },

    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f32 },

    #[error("{field}: min {min} is greater than max {max}")]
    InvertedRange {
        field: &'static str,
        min: f32,
        max: f32,
    },

    #[error("{field} must be within [0, 1] (got {value})")]
    NotAProbability { field: &'static str, value: f64 },

    #[error("max_jumps must be at least 1")]
    NoJumps,

    #[error(
        "min_platform_length {length} leaves no room inside edge padding {padding} on each side"
    )]
    PlatformTooShort { length: f32, padding: f32 },

    #[error("initial platform height {height} is outside the allowed range [{min}, {max}]")]
    InitialHeightOutOfRange { height: f32, min: f32, max: f32 },

    #[error("initial platform height {height} leaves no room for the player below the ceiling at {ceiling}")]
    InitialPlatformAboveCeiling { height: f32, ceiling: f32 },

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The simulation refused to enter its running state.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("no platform found below the player spawn point ({x}, {y})")]
    NoGroundUnderPlayer { x: f32, y: f32 },
}

/// Save data could not be read or written.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("save store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("save data is malformed: {0}")]
    Format(#[from] serde_json::Error),

    #[error("save store unavailable: {0}")]
    Unavailable(String),
}
