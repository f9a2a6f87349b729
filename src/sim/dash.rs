//! Dash state machine.
//!
//! A dash pins horizontal speed to a fixed boost for a fixed duration and
//! then hands back exactly the speed the player had when it started. A press
//! made while the cooldown is running stays queued until the dash can fire.

use serde::{Deserialize, Serialize};

/// What happened to the dash this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashPhase {
    /// Not dashing and nothing changed
    Idle,
    /// A dash began this tick
    Started,
    /// Mid-dash
    Active,
    /// The dash ran out this tick; speed has been restored
    Ended,
    /// Started and ran out within this tick (duration shorter than a tick)
    StartedAndEnded,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashState {
    pub active: bool,
    /// Seconds left on the running dash
    pub remaining: f32,
    /// Seconds until another dash may start
    pub cooldown_remaining: f32,
    /// Horizontal speed captured when the dash started
    pub pre_dash_velocity_x: f32,
    /// A press waiting for the cooldown to elapse
    pub queued: bool,
}

impl DashState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a dash press (consumed when the dash can start)
    pub fn press(&mut self) {
        self.queued = true;
    }

    /// Advance one fixed tick and drive `velocity_x`.
    ///
    /// Decays the cooldown, starts a queued dash if allowed, and while
    /// active forces `velocity_x` to `boost_speed`. On expiry `velocity_x`
    /// is set back to the captured pre-dash value.
    pub fn update(
        &mut self,
        velocity_x: &mut f32,
        boost_speed: f32,
        duration: f32,
        cooldown: f32,
        dt: f32,
    ) -> DashPhase {
        self.cooldown_remaining = (self.cooldown_remaining - dt).max(0.0);

        let mut started = false;
        if self.queued && self.cooldown_remaining <= 0.0 && !self.active {
            self.queued = false;
            self.pre_dash_velocity_x = *velocity_x;
            self.active = true;
            self.remaining = duration;
            self.cooldown_remaining = cooldown;
            started = true;
        }

        if !self.active {
            return DashPhase::Idle;
        }

        *velocity_x = boost_speed;
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.active = false;
            self.remaining = 0.0;
            *velocity_x = self.pre_dash_velocity_x;
            return if started {
                DashPhase::StartedAndEnded
            } else {
                DashPhase::Ended
            };
        }

        if started {
            DashPhase::Started
        } else {
            DashPhase::Active
        }
    }

    /// Drop any running or queued dash without restoring speed (used on death)
    pub fn cancel(&mut self) {
        self.active = false;
        self.remaining = 0.0;
        self.queued = false;
    }
}
