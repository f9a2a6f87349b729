//! Player controller
//!
//! A fixed-step state machine over orthogonal flags (grounded/airborne,
//! holding a first jump, dashing, alive/dead). Every tick resolves the
//! player against the collision service using the mask of its current
//! polarity, so geometry of the other polarity never blocks or kills it.
//!
//! The player never moves horizontally in world space: its `velocity.x` is
//! the speed at which the track scrolls past it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Aabb, CollisionQuery, EntityId, EntityRef};
use super::dash::{DashPhase, DashState};
use super::polarity::{Layers, Polarity};
use super::state::GameEvent;
use super::tick::TickInput;
use crate::config::PlayerConfig;
use crate::consts::*;

/// Highest purchasable score multiplier level
pub const MAX_SCORE_MULTIPLIER_LEVEL: u32 = 10;

/// Change in which platform the player is standing on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallLink {
    Attached(EntityId),
    Detached(EntityId),
}

/// Side effects of one step that the owner of the track must apply
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    /// Standing-on transitions, in order
    pub fall_links: Vec<FallLink>,
    /// Spike that killed the player this step
    pub obstacle_hit: Option<EntityId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub position: Vec2,
    /// x = scroll speed, y = vertical speed
    pub velocity: Vec2,
    pub is_grounded: bool,
    pub is_dead: bool,
    pub polarity: Polarity,
    /// Jumps used in the current chain
    pub jump_count: u32,
    /// Gravity is suppressed while the first jump of a chain is held
    pub holding_jump: bool,
    pub hold_timer: f32,
    /// Top of the last platform the ground probe saw
    pub ground_height: f32,
    pub dash: DashState,
    pub distance_traveled: f32,
    pub session_coins: u32,
    pub total_coins: u32,
    score_multiplier_level: u32,
    /// Platform currently stood on (weak; cleared when it is recycled)
    pub standing_on: Option<EntityId>,
}

impl Player {
    /// A player standing on a surface at height `ground_top`
    pub fn new(x: f32, ground_top: f32) -> Self {
        Self {
            position: Vec2::new(x, ground_top + PLAYER_HALF_HEIGHT),
            velocity: Vec2::ZERO,
            is_grounded: true,
            is_dead: false,
            polarity: Polarity::A,
            jump_count: 0,
            holding_jump: false,
            hold_timer: 0.0,
            ground_height: ground_top,
            dash: DashState::new(),
            distance_traveled: 0.0,
            session_coins: 0,
            total_coins: 0,
            score_multiplier_level: 0,
            standing_on: None,
        }
    }

    pub fn bounds(&self) -> Aabb {
        bounds_at(self.position)
    }

    pub fn score_multiplier_level(&self) -> u32 {
        self.score_multiplier_level
    }

    /// Clamped to `0..=MAX_SCORE_MULTIPLIER_LEVEL`
    pub fn set_score_multiplier_level(&mut self, level: u32) {
        self.score_multiplier_level = level.min(MAX_SCORE_MULTIPLIER_LEVEL);
    }

    /// +10% per level
    pub fn score_multiplier(&self) -> f32 {
        1.0 + self.score_multiplier_level as f32 * 0.1
    }

    /// Whole units travelled
    pub fn distance(&self) -> u64 {
        self.distance_traveled.max(0.0).floor() as u64
    }

    /// Whole units travelled, scaled by the score multiplier
    pub fn multiplied_distance(&self) -> u64 {
        (self.distance_traveled.max(0.0) * self.score_multiplier()).floor() as u64
    }

    /// Both counters saturate at `u32::MAX`
    pub fn add_coins(&mut self, amount: u32) {
        self.session_coins = self.session_coins.saturating_add(amount);
        self.total_coins = self.total_coins.saturating_add(amount);
    }

    /// Forget the platform being stood on, returning it if there was one
    pub fn detach_fall(&mut self) -> Option<EntityId> {
        self.standing_on.take()
    }

    fn rebind_fall(&mut self, platform: Option<EntityId>, links: &mut Vec<FallLink>) {
        if platform == self.standing_on {
            return;
        }
        if let Some(old) = self.standing_on.take() {
            links.push(FallLink::Detached(old));
        }
        if let Some(new) = platform {
            self.standing_on = Some(new);
            links.push(FallLink::Attached(new));
        }
    }

    /// Advance one fixed timestep.
    ///
    /// Does nothing once dead. The track is not touched; standing-on changes
    /// and the killing spike are returned for the caller to apply.
    pub fn step(
        &mut self,
        input: &TickInput,
        world: &impl CollisionQuery,
        cfg: &PlayerConfig,
        death_floor: f32,
        dt: f32,
        events: &mut Vec<GameEvent>,
    ) -> StepReport {
        let mut report = StepReport::default();
        if self.is_dead {
            return report;
        }

        if input.switch_polarity {
            self.polarity = self.polarity.flipped();
            log::debug!("Polarity -> {}", self.polarity.as_str());
            events.push(GameEvent::PolaritySwitched(self.polarity));
        }
        if input.dash_pressed {
            self.dash.press();
        }
        let mask = self.polarity.mask();

        // Dash drives velocity.x; the cap only applies outside a dash
        match self.dash.update(
            &mut self.velocity.x,
            cfg.dash_boost_speed,
            cfg.dash_duration,
            cfg.dash_cooldown,
            dt,
        ) {
            DashPhase::Idle => {
                self.velocity.x = self.velocity.x.min(cfg.max_horizontal_velocity);
            }
            DashPhase::Started => events.push(GameEvent::DashStarted),
            DashPhase::Ended => events.push(GameEvent::DashEnded),
            DashPhase::StartedAndEnded => {
                events.push(GameEvent::DashStarted);
                events.push(GameEvent::DashEnded);
            }
            DashPhase::Active => {}
        }

        let mut pos = self.position;
        let was_grounded = self.is_grounded;

        if !self.is_grounded {
            self.integrate_vertical(&mut pos, world, cfg, dt);
        }

        self.resolve_ground(&mut pos, world, cfg, mask, dt, &mut report.fall_links);

        if self.is_grounded && !was_grounded {
            self.jump_count = 0;
            events.push(GameEvent::Landed);
        }

        if input.jump_pressed && self.try_jump(pos, cfg) {
            self.rebind_fall(None, &mut report.fall_links);
            events.push(GameEvent::Jumped {
                count: self.jump_count,
            });
        }
        if input.jump_released {
            self.holding_jump = false;
        }

        // Side collision with a platform face while airborne
        if !self.is_grounded {
            let reach = self.velocity.x * dt;
            if let Some(hit) = world.raycast(pos, Vec2::X, reach, mask)
                && matches!(hit.entity, EntityRef::Platform(_))
                && pos.y < hit.bounds.top()
            {
                self.velocity.x = 0.0;
            }
        }

        if self.is_grounded && !self.dash.active {
            let ratio = self.velocity.x / cfg.max_horizontal_velocity;
            let acceleration = cfg.max_acceleration * (1.0 - ratio);
            self.velocity.x += acceleration * dt;
            if self.velocity.x >= cfg.max_horizontal_velocity {
                self.velocity.x = cfg.max_horizontal_velocity;
            }

            // Probe where the feet will be once the track has scrolled this tick
            let feet = Vec2::new(pos.x + self.velocity.x * dt, pos.y - PLAYER_HALF_HEIGHT);
            let still_grounded = world
                .raycast(feet, Vec2::NEG_Y, cfg.ground_check_distance, mask)
                .is_some_and(|hit| matches!(hit.entity, EntityRef::Platform(_)));
            if !still_grounded {
                self.is_grounded = false;
                self.rebind_fall(None, &mut report.fall_links);
            }
        }

        if let Some(id) = self.obstacle_contact(pos, world, mask, dt) {
            self.is_dead = true;
            report.obstacle_hit = Some(id);
            events.push(GameEvent::HitObstacle(id));
        }

        if pos.y < death_floor {
            self.is_dead = true;
        }

        self.distance_traveled += self.velocity.x * dt;
        self.position = pos;

        if self.is_dead {
            log::debug!(
                "Player died at distance {} (coins this run: {})",
                self.distance(),
                self.session_coins
            );
            events.push(GameEvent::Died {
                distance: self.distance_traveled,
            });
        }

        report
    }

    /// Hold-jump timer, gravity, ceiling clamp and vertical motion
    fn integrate_vertical(
        &mut self,
        pos: &mut Vec2,
        world: &impl CollisionQuery,
        cfg: &PlayerConfig,
        dt: f32,
    ) {
        if self.holding_jump {
            self.hold_timer += dt;
            if self.hold_timer >= cfg.max_hold_jump_time {
                self.hold_timer = cfg.max_hold_jump_time;
                self.holding_jump = false;
            }
        }
        if !self.holding_jump {
            self.velocity.y += cfg.gravity * dt;
        }

        if self.velocity.y > 0.0 {
            let reach = (self.velocity.y * dt).abs() + cfg.ceiling_check_distance;
            let head = Vec2::new(pos.x, pos.y + PLAYER_HALF_HEIGHT);
            if let Some(hit) = world.raycast(head, Vec2::Y, reach, Layers::CEILING) {
                pos.y = hit.point.y - PLAYER_HALF_HEIGHT - CEILING_SKIN;
                self.velocity.y = 0.0;
                self.holding_jump = false;
            }
        }

        pos.y += self.velocity.y * dt;
    }

    /// Downward probe from the feet; snaps onto the surface on a landing
    fn resolve_ground(
        &mut self,
        pos: &mut Vec2,
        world: &impl CollisionQuery,
        cfg: &PlayerConfig,
        mask: Layers,
        dt: f32,
        links: &mut Vec<FallLink>,
    ) {
        let mut reach = cfg.ground_check_distance;
        if self.velocity.y < 0.0 {
            reach += (self.velocity.y * dt).abs();
        }
        let feet = Vec2::new(pos.x, pos.y - PLAYER_HALF_HEIGHT);

        let Some(hit) = world.raycast(feet, Vec2::NEG_Y, reach, mask) else {
            self.is_grounded = false;
            self.rebind_fall(None, links);
            return;
        };

        let EntityRef::Platform(id) = hit.entity else {
            self.is_grounded = false;
            return;
        };

        self.ground_height = hit.bounds.top();
        if feet.y <= self.ground_height + cfg.ground_check_distance && self.velocity.y <= 0.0 {
            pos.y = self.ground_height + PLAYER_HALF_HEIGHT;
            self.velocity.y = 0.0;
            self.is_grounded = true;
            self.rebind_fall(Some(id), links);
        } else {
            self.is_grounded = false;
        }
    }

    /// Apply a jump if the chain allows it
    fn try_jump(&mut self, pos: Vec2, cfg: &PlayerConfig) -> bool {
        if self.jump_count >= cfg.max_jumps {
            return false;
        }

        let allowed = if self.jump_count == 0 {
            let ground_distance = (pos.y - PLAYER_HALF_HEIGHT - self.ground_height).abs();
            self.is_grounded || ground_distance <= cfg.jump_ground_threshold
        } else {
            cfg.can_double_jump && !self.is_grounded
        };
        if !allowed {
            return false;
        }

        self.is_grounded = false;
        self.velocity.y = cfg.jump_velocity;
        // Only the first jump of a chain can be held for extra height
        self.holding_jump = self.jump_count == 0;
        self.hold_timer = 0.0;
        self.jump_count += 1;
        true
    }

    /// Spike hit along this tick's motion, or overlapping the player box
    fn obstacle_contact(
        &self,
        pos: Vec2,
        world: &impl CollisionQuery,
        mask: Layers,
        dt: f32,
    ) -> Option<EntityId> {
        let as_obstacle = |entity: EntityRef| match entity {
            EntityRef::Obstacle(id) => Some(id),
            _ => None,
        };

        let ahead = world
            .raycast(pos, Vec2::X, self.velocity.x * dt, mask)
            .and_then(|hit| as_obstacle(hit.entity));
        if ahead.is_some() {
            return ahead;
        }

        if self.velocity.y != 0.0 {
            let dir = if self.velocity.y > 0.0 {
                Vec2::Y
            } else {
                Vec2::NEG_Y
            };
            let vertical = world
                .raycast(pos, dir, (self.velocity.y * dt).abs(), mask)
                .and_then(|hit| as_obstacle(hit.entity));
            if vertical.is_some() {
                return vertical;
            }
        }

        world
            .overlapping(&bounds_at(pos), self.polarity.obstacle_layer())
            .into_iter()
            .find_map(as_obstacle)
    }
}

/// Player collision box centred at `pos`
pub fn bounds_at(pos: Vec2) -> Aabb {
    Aabb::from_center(pos, Vec2::new(PLAYER_HALF_WIDTH, PLAYER_HALF_HEIGHT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::collision::ColliderSet;
    use proptest::prelude::*;

    const FLOOR: f32 = -20.0;

    fn platform(set: &mut ColliderSet, id: u32, polarity: Polarity, left: f32, right: f32, top: f32) {
        set.add(
            EntityRef::Platform(EntityId(id)),
            polarity.platform_layer(),
            Aabb::new(Vec2::new(left, top - PLATFORM_DEPTH), Vec2::new(right, top)),
        );
    }

    fn spike(set: &mut ColliderSet, id: u32, polarity: Polarity, x: f32, top: f32) {
        set.add(
            EntityRef::Obstacle(EntityId(id)),
            polarity.obstacle_layer(),
            Aabb::from_center(
                Vec2::new(x, top + OBSTACLE_HALF_HEIGHT - OBSTACLE_SINK),
                Vec2::new(OBSTACLE_HALF_WIDTH, OBSTACLE_HALF_HEIGHT),
            ),
        );
    }

    fn flat_world() -> ColliderSet {
        let mut set = ColliderSet::new();
        platform(&mut set, 1, Polarity::A, -50.0, 50.0, 0.0);
        set
    }

    fn step(player: &mut Player, input: &TickInput, world: &ColliderSet) -> Vec<GameEvent> {
        let mut events = Vec::new();
        player.step(input, world, &PlayerConfig::default(), FLOOR, SIM_DT, &mut events);
        events
    }

    fn press_jump() -> TickInput {
        TickInput {
            jump_pressed: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_grounded_jump_starts_held_chain() {
        let world = flat_world();
        let mut player = Player::new(0.0, 0.0);

        step(&mut player, &press_jump(), &world);

        assert_eq!(player.velocity.y, 20.0);
        assert!(!player.is_grounded);
        assert_eq!(player.jump_count, 1);
        assert!(player.holding_jump);
    }

    #[test]
    fn test_double_jump_is_never_held() {
        let world = ColliderSet::new();
        let mut player = Player::new(0.0, 5.0);
        player.is_grounded = false;
        player.jump_count = 1;

        step(&mut player, &press_jump(), &world);

        assert_eq!(player.jump_count, 2);
        assert!(!player.holding_jump);
        assert_eq!(player.velocity.y, 20.0);
    }

    #[test]
    fn test_jump_limit_reached() {
        let world = ColliderSet::new();
        let mut player = Player::new(0.0, 5.0);
        player.is_grounded = false;
        player.jump_count = 2;
        player.velocity.y = -3.0;

        step(&mut player, &press_jump(), &world);
        assert_eq!(player.jump_count, 2);
        assert!(player.velocity.y < 0.0);
    }

    #[test]
    fn test_double_jump_disabled() {
        let world = ColliderSet::new();
        let mut player = Player::new(0.0, 5.0);
        player.is_grounded = false;
        player.jump_count = 1;
        let cfg = PlayerConfig {
            can_double_jump: false,
            ..Default::default()
        };

        let mut events = Vec::new();
        player.step(&press_jump(), &world, &cfg, FLOOR, SIM_DT, &mut events);
        assert_eq!(player.jump_count, 1);
    }

    #[test]
    fn test_coyote_first_jump_near_ground() {
        let world = ColliderSet::new();
        let mut player = Player::new(0.0, 0.0);
        player.is_grounded = false;
        player.position.y += 0.5;

        step(&mut player, &press_jump(), &world);
        assert_eq!(player.jump_count, 1);
        assert!(player.holding_jump);
    }

    #[test]
    fn test_no_first_jump_far_from_ground() {
        let world = ColliderSet::new();
        let mut player = Player::new(0.0, 0.0);
        player.is_grounded = false;
        player.position.y += 5.0;

        step(&mut player, &press_jump(), &world);
        assert_eq!(player.jump_count, 0);
    }

    #[test]
    fn test_release_cuts_hold_and_gravity_resumes() {
        let world = flat_world();
        let mut player = Player::new(0.0, 0.0);
        step(&mut player, &press_jump(), &world);

        // Held: no gravity
        step(&mut player, &TickInput::default(), &world);
        assert_eq!(player.velocity.y, 20.0);

        let release = TickInput {
            jump_released: true,
            ..Default::default()
        };
        step(&mut player, &release, &world);
        assert!(!player.holding_jump);
        step(&mut player, &TickInput::default(), &world);
        assert!(player.velocity.y < 20.0);
    }

    #[test]
    fn test_hold_auto_releases_at_max_time() {
        let world = flat_world();
        let mut player = Player::new(0.0, 0.0);
        step(&mut player, &press_jump(), &world);

        for _ in 0..30 {
            step(&mut player, &TickInput::default(), &world);
        }
        assert!(!player.holding_jump);
        assert!(player.hold_timer <= PlayerConfig::default().max_hold_jump_time);
        assert!(player.velocity.y < 20.0);
    }

    #[test]
    fn test_landing_resets_jump_count() {
        let world = flat_world();
        let mut player = Player::new(0.0, 0.0);
        player.is_grounded = false;
        player.position.y = 0.55;
        player.velocity.y = -5.0;
        player.jump_count = 2;

        let events = step(&mut player, &TickInput::default(), &world);
        assert!(player.is_grounded);
        assert_eq!(player.jump_count, 0);
        assert_eq!(player.position.y, PLAYER_HALF_HEIGHT);
        assert!(events.contains(&GameEvent::Landed));
    }

    #[test]
    fn test_dash_scenario_restores_zero_speed() {
        let world = ColliderSet::new();
        let mut player = Player::new(0.0, 5.0);
        player.is_grounded = false;
        let cfg = PlayerConfig::default();

        let dash = TickInput {
            dash_pressed: true,
            ..Default::default()
        };
        let mut events = Vec::new();
        player.step(&dash, &world, &cfg, FLOOR, SIM_DT, &mut events);
        assert!(events.contains(&GameEvent::DashStarted));

        while player.dash.active {
            assert_eq!(player.velocity.x, cfg.dash_boost_speed);
            events.clear();
            player.step(&TickInput::default(), &world, &cfg, FLOOR, SIM_DT, &mut events);
        }
        assert!(events.contains(&GameEvent::DashEnded));
        assert_eq!(player.velocity.x, 0.0);
    }

    #[test]
    fn test_sub_tick_dash_reports_both_edges() {
        let world = ColliderSet::new();
        let mut player = Player::new(0.0, 5.0);
        player.is_grounded = false;
        player.velocity.x = 8.0;
        let cfg = PlayerConfig {
            dash_duration: SIM_DT * 0.5,
            ..Default::default()
        };

        let mut events = Vec::new();
        let dash = TickInput {
            dash_pressed: true,
            ..Default::default()
        };
        player.step(&dash, &world, &cfg, FLOOR, SIM_DT, &mut events);
        let started = events.iter().position(|e| *e == GameEvent::DashStarted);
        let ended = events.iter().position(|e| *e == GameEvent::DashEnded);
        assert!(matches!((started, ended), (Some(a), Some(b)) if a < b));
        assert_eq!(player.velocity.x, 8.0);
    }

    #[test]
    fn test_speed_capped_outside_dash() {
        let world = ColliderSet::new();
        let mut player = Player::new(0.0, 5.0);
        player.is_grounded = false;
        player.velocity.x = 500.0;
        step(&mut player, &TickInput::default(), &world);
        assert_eq!(player.velocity.x, 100.0);
    }

    #[test]
    fn test_ground_acceleration_approaches_cap() {
        let world = flat_world();
        let mut player = Player::new(0.0, 0.0);
        let mut last = player.velocity.x;
        for _ in 0..200 {
            step(&mut player, &TickInput::default(), &world);
            assert!(player.velocity.x > last);
            assert!(player.velocity.x <= 100.0);
            last = player.velocity.x;
        }
        assert!(player.distance_traveled > 0.0);
    }

    #[test]
    fn test_opposite_polarity_platform_is_pass_through() {
        let mut world = ColliderSet::new();
        platform(&mut world, 1, Polarity::B, -50.0, 50.0, 0.0);
        let mut player = Player::new(0.0, 0.0);

        step(&mut player, &TickInput::default(), &world);
        assert!(!player.is_grounded);

        // Switching back onto the platform's polarity makes it solid again
        let switch = TickInput {
            switch_polarity: true,
            ..Default::default()
        };
        let events = step(&mut player, &switch, &world);
        assert_eq!(player.polarity, Polarity::B);
        assert!(events.contains(&GameEvent::PolaritySwitched(Polarity::B)));
        assert!(player.is_grounded);
    }

    #[test]
    fn test_walk_off_edge_ungrounds() {
        let mut world = ColliderSet::new();
        platform(&mut world, 1, Polarity::A, -50.0, 0.05, 0.0);
        let mut player = Player::new(0.0, 0.0);
        player.velocity.x = 10.0;
        player.standing_on = Some(EntityId(1));

        let mut events = Vec::new();
        let report = player.step(
            &TickInput::default(),
            &world,
            &PlayerConfig::default(),
            FLOOR,
            SIM_DT,
            &mut events,
        );
        assert!(!player.is_grounded);
        assert_eq!(report.fall_links, vec![FallLink::Detached(EntityId(1))]);
        assert_eq!(player.standing_on, None);
    }

    #[test]
    fn test_landing_binds_platform() {
        let world = flat_world();
        let mut player = Player::new(0.0, 0.0);
        let mut events = Vec::new();
        let report = player.step(
            &TickInput::default(),
            &world,
            &PlayerConfig::default(),
            FLOOR,
            SIM_DT,
            &mut events,
        );
        assert_eq!(report.fall_links, vec![FallLink::Attached(EntityId(1))]);

        // Jumping detaches again
        let report = player.step(
            &press_jump(),
            &world,
            &PlayerConfig::default(),
            FLOOR,
            SIM_DT,
            &mut events,
        );
        assert_eq!(report.fall_links, vec![FallLink::Detached(EntityId(1))]);
    }

    #[test]
    fn test_wall_below_top_stops_player() {
        let mut world = ColliderSet::new();
        platform(&mut world, 1, Polarity::A, 0.3, 20.0, 3.0);
        let mut player = Player::new(0.0, 0.0);
        player.is_grounded = false;
        player.velocity.x = 20.0;

        step(&mut player, &TickInput::default(), &world);
        assert_eq!(player.velocity.x, 0.0);
    }

    #[test]
    fn test_wall_of_other_polarity_is_ignored() {
        let mut world = ColliderSet::new();
        platform(&mut world, 1, Polarity::B, 0.3, 20.0, 3.0);
        let mut player = Player::new(0.0, 0.0);
        player.is_grounded = false;
        player.velocity.x = 20.0;

        step(&mut player, &TickInput::default(), &world);
        assert_eq!(player.velocity.x, 20.0);
    }

    #[test]
    fn test_running_into_spike_kills() {
        let mut world = flat_world();
        spike(&mut world, 9, Polarity::A, 0.7, 0.0);
        let mut player = Player::new(0.0, 0.0);
        player.velocity.x = 20.0;

        let mut events = Vec::new();
        let report = player.step(
            &TickInput::default(),
            &world,
            &PlayerConfig::default(),
            FLOOR,
            SIM_DT,
            &mut events,
        );
        assert!(player.is_dead);
        assert_eq!(report.obstacle_hit, Some(EntityId(9)));
        assert!(events.contains(&GameEvent::HitObstacle(EntityId(9))));
    }

    #[test]
    fn test_spike_of_other_polarity_is_harmless() {
        let mut world = flat_world();
        spike(&mut world, 9, Polarity::B, 0.7, 0.0);
        spike(&mut world, 10, Polarity::B, 0.0, 0.0);
        let mut player = Player::new(0.0, 0.0);
        player.velocity.x = 20.0;

        step(&mut player, &TickInput::default(), &world);
        assert!(!player.is_dead);
    }

    #[test]
    fn test_ceiling_stops_ascent() {
        let mut world = ColliderSet::new();
        world.add(
            EntityRef::Ceiling,
            Layers::CEILING,
            Aabb::new(Vec2::new(-50.0, 2.0), Vec2::new(50.0, 3.0)),
        );
        let mut player = Player::new(0.0, 0.0);
        player.is_grounded = false;
        player.position.y = 1.4;
        player.velocity.y = 20.0;
        player.holding_jump = true;

        step(&mut player, &TickInput::default(), &world);
        assert_eq!(player.velocity.y, 0.0);
        assert!(!player.holding_jump);
        assert!(player.position.y + PLAYER_HALF_HEIGHT < 2.0);
    }

    #[test]
    fn test_fall_below_floor_is_terminal() {
        let world = ColliderSet::new();
        let mut player = Player::new(0.0, FLOOR);
        player.is_grounded = false;
        player.position.y = FLOOR + 0.05;
        player.velocity = Vec2::new(3.0, -10.0);

        let events = step(&mut player, &TickInput::default(), &world);
        assert!(player.is_dead);
        assert!(matches!(events.last(), Some(GameEvent::Died { .. })));

        let snapshot = (player.position, player.velocity, player.distance_traveled);
        let events = step(&mut player, &press_jump(), &world);
        assert!(events.is_empty());
        assert_eq!(
            snapshot,
            (player.position, player.velocity, player.distance_traveled)
        );
    }

    #[test]
    fn test_score_multiplier_clamped() {
        let mut player = Player::new(0.0, 0.0);
        player.set_score_multiplier_level(25);
        assert_eq!(player.score_multiplier_level(), MAX_SCORE_MULTIPLIER_LEVEL);
        assert!((player.score_multiplier() - 2.0).abs() < 1e-6);

        player.distance_traveled = 10.5;
        assert_eq!(player.distance(), 10);
        assert_eq!(player.multiplied_distance(), 21);
    }

    #[test]
    fn test_coin_totals_saturate() {
        let mut player = Player::new(0.0, 0.0);
        player.total_coins = u32::MAX - 1;
        player.add_coins(5);
        assert_eq!(player.total_coins, u32::MAX);
        assert_eq!(player.session_coins, 5);

        player.session_coins = u32::MAX;
        player.add_coins(1);
        assert_eq!(player.session_coins, u32::MAX);
        assert_eq!(player.total_coins, u32::MAX);
    }

    fn arb_input() -> impl Strategy<Value = TickInput> {
        (any::<bool>(), any::<bool>(), any::<bool>(), prop::bool::weighted(0.05)).prop_map(
            |(jump_pressed, jump_released, dash_pressed, switch_polarity)| TickInput {
                jump_pressed,
                jump_released,
                dash_pressed,
                switch_polarity,
            },
        )
    }

    proptest! {
        #[test]
        fn prop_jump_count_bounded_and_resets_only_on_landing(
            inputs in prop::collection::vec(arb_input(), 1..300)
        ) {
            let mut world = flat_world();
            platform(&mut world, 2, Polarity::B, -50.0, 50.0, 4.0);
            let cfg = PlayerConfig::default();
            let mut player = Player::new(0.0, 0.0);

            for input in &inputs {
                let before = player.jump_count;
                let mut events = Vec::new();
                player.step(input, &world, &cfg, FLOOR, SIM_DT, &mut events);

                prop_assert!(player.jump_count <= cfg.max_jumps);
                if player.jump_count < before {
                    prop_assert!(events.contains(&GameEvent::Landed));
                }
            }
        }

        #[test]
        fn prop_dash_restores_speed(speed in 0.0f32..100.0, boost in 1.0f32..400.0) {
            let world = ColliderSet::new();
            let cfg = PlayerConfig { dash_boost_speed: boost, ..Default::default() };
            let mut player = Player::new(0.0, 5.0);
            player.is_grounded = false;
            player.velocity.x = speed;

            let dash = TickInput { dash_pressed: true, ..Default::default() };
            let mut events = Vec::new();
            player.step(&dash, &world, &cfg, FLOOR, SIM_DT, &mut events);
            while player.dash.active {
                player.step(&TickInput::default(), &world, &cfg, FLOOR, SIM_DT, &mut events);
            }
            prop_assert_eq!(player.velocity.x, speed);
        }

        #[test]
        fn prop_other_polarity_never_collides(x in -10.0f32..10.0, height in 0.5f32..8.0) {
            let mut world = ColliderSet::new();
            platform(&mut world, 1, Polarity::B, -50.0, 50.0, 0.0);
            spike(&mut world, 2, Polarity::B, x, 0.0);
            let point = Vec2::new(x, height);
            let mask = Polarity::A.mask();

            for dir in [Vec2::X, Vec2::NEG_X, Vec2::Y, Vec2::NEG_Y] {
                prop_assert!(world.raycast(point, dir, 100.0, mask).is_none());
            }
            prop_assert!(world.overlapping(&bounds_at(point), mask).is_empty());
        }
    }
}
