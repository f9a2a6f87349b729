//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod autopilot;
pub mod collision;
pub mod dash;
pub mod generator;
pub mod player;
pub mod polarity;
pub mod state;
pub mod tick;
pub mod track;

pub use autopilot::autopilot_input;
pub use collision::{Aabb, ColliderSet, CollisionQuery, EntityId, EntityRef, RayHit, ray_aabb};
pub use dash::{DashPhase, DashState};
pub use generator::{CoinPattern, coin_capacity, coin_positions};
pub use player::{FallLink, MAX_SCORE_MULTIPLIER_LEVEL, Player, StepReport};
pub use polarity::{Layers, Polarity};
pub use state::{GameEvent, GameState};
pub use tick::{TickInput, tick};
pub use track::{Coin, FallBehavior, Obstacle, Recycled, Segment, Track};
