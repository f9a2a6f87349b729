//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically.

use super::collision::{CollisionQuery, EntityRef};
use super::generator;
use super::player::{FallLink, Player};
use super::polarity::Layers;
use super::state::{GameEvent, GameState};
use super::track::Track;
use crate::consts::COIN_COLLECT_DURATION;

/// Input commands for a single tick (deterministic, edge-triggered)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub jump_pressed: bool,
    pub jump_released: bool,
    pub dash_pressed: bool,
    /// Toggle between polarity A and B
    pub switch_polarity: bool,
}

impl TickInput {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Combine two sets of edges (used when several frames feed one tick)
    pub fn merge(&mut self, other: &TickInput) {
        self.jump_pressed |= other.jump_pressed;
        self.jump_released |= other.jump_released;
        self.dash_pressed |= other.dash_pressed;
        // Two toggles cancel out
        self.switch_polarity ^= other.switch_polarity;
    }
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    // Dead is terminal until the state is rebuilt
    if state.player.is_dead {
        return;
    }
    state.time_ticks += 1;

    let GameState {
        config,
        rng,
        player,
        track,
        events,
        ..
    } = state;

    let report = player.step(
        input,
        &*track,
        &config.player,
        config.world.death_floor,
        dt,
        events,
    );
    apply_fall_links(track, &report.fall_links, events);
    if let Some(id) = report.obstacle_hit {
        track.remove_obstacle(id);
    }
    if player.is_dead {
        // A dead player no longer holds any platform
        player.detach_fall();
        player.dash.cancel();
        track.detach_all();
    } else {
        // The world moves, not the player
        track.scroll(player.velocity.x * dt);
        track.update_falls(dt);

        let spawned = generator::generate(track, rng, &config.track, &config.world);
        events.extend(spawned.into_iter().map(GameEvent::SegmentSpawned));

        collect_coins(player, track, events);
        track.update_coins(dt);

        let recycled = track.recycle(&config.world);
        if let Some(standing) = player.standing_on
            && recycled.segments.contains(&standing)
        {
            player.detach_fall();
        }
        if !recycled.is_empty() {
            log::trace!(
                "Recycled {} segments, {} spikes, {} coins",
                recycled.segments.len(),
                recycled.obstacles.len(),
                recycled.coins.len()
            );
        }
    }

    state.normalize_order();
    state.trim_events();
}

/// Forward standing-on changes to the platforms' fall behaviour
fn apply_fall_links(track: &mut Track, links: &[FallLink], events: &mut Vec<GameEvent>) {
    for link in links {
        match *link {
            FallLink::Attached(id) => {
                if let Some(fall) = track.segment_mut(id).and_then(|s| s.fall.as_mut()) {
                    if !fall.falling {
                        log::debug!("Platform {:?} starts falling at {}", id, fall.fall_speed);
                    }
                    fall.attach();
                    events.push(GameEvent::FallAttached(id));
                }
            }
            FallLink::Detached(id) => {
                if let Some(fall) = track.segment_mut(id).and_then(|s| s.fall.as_mut()) {
                    fall.detach();
                    events.push(GameEvent::FallDetached(id));
                }
            }
        }
    }
}

/// Collect every live coin the player box overlaps
fn collect_coins(player: &mut Player, track: &mut Track, events: &mut Vec<GameEvent>) {
    for entity in track.overlapping(&player.bounds(), Layers::COLLECTIBLE) {
        let EntityRef::Collectible(id) = entity else {
            continue;
        };
        let Some(coin) = track.coin_mut(id) else {
            continue;
        };
        if coin.is_collected() {
            continue;
        }
        coin.collect_timer = Some(COIN_COLLECT_DURATION);
        let value = coin.value;
        player.add_coins(value);
        events.push(GameEvent::CoinCollected { id, value });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::consts::*;
    use crate::sim::collision::EntityId;
    use crate::sim::polarity::Polarity;
    use crate::sim::track::{Coin, FallBehavior, Obstacle};
    use glam::Vec2;

    fn new_state(seed: u64) -> GameState {
        let mut state = GameState::new(SimConfig::default(), seed).unwrap();
        state.drain_events();
        state
    }

    fn run(state: &mut GameState, ticks: usize) {
        for _ in 0..ticks {
            tick(state, &TickInput::default(), SIM_DT);
        }
    }

    #[test]
    fn test_player_auto_runs_and_world_scrolls() {
        let mut state = new_state(12345);
        let first_right = state.track.segments[0].right();
        run(&mut state, 100);

        let player = &state.player;
        assert!(!player.is_dead);
        assert!(player.velocity.x > 0.0);
        assert!(player.distance_traveled > 0.0);
        assert_eq!(player.position.x, state.config.world.player_x);

        let moved = first_right - state.track.segments[0].right();
        assert!((moved - player.distance_traveled).abs() < 1e-3);
        assert_eq!(state.time_ticks, 100);
    }

    #[test]
    fn test_dead_state_is_frozen() {
        let mut state = new_state(1);
        state.player.is_dead = true;
        let segments = state.track.segments.len();
        let x = state.track.segments[0].center_x;

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.time_ticks, 0);
        assert_eq!(state.track.segments.len(), segments);
        assert_eq!(state.track.segments[0].center_x, x);
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_running_off_the_end_dies() {
        let mut state = new_state(8);
        // Nothing after the initial platform
        state.track.segments.truncate(1);
        state.track.obstacles.clear();
        state.track.coins.clear();
        state.track.segments[0].generated_next = true;

        for _ in 0..5000 {
            tick(&mut state, &TickInput::default(), SIM_DT);
            if state.player.is_dead {
                break;
            }
        }
        assert!(state.player.is_dead);
        assert!(state.player.position.y < state.config.world.death_floor);
        assert!(
            state
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::Died { .. }))
        );
    }

    #[test]
    fn test_coin_collected_once_then_removed() {
        let mut state = new_state(2);
        let id = state.track.next_entity_id();
        let center = state.player.position;
        state.track.coins.push(Coin {
            id,
            center,
            value: 3,
            collect_timer: None,
            segment: None,
        });

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.player.session_coins, 3);
        assert_eq!(state.player.total_coins, 3);
        assert!(
            state
                .drain_events()
                .contains(&GameEvent::CoinCollected { id, value: 3 })
        );

        run(&mut state, 5);
        assert_eq!(state.player.session_coins, 3);

        run(&mut state, 20);
        assert!(state.track.coins.iter().all(|c| c.id != id));
    }

    #[test]
    fn test_spike_contact_kills_and_removes_spike() {
        let mut state = new_state(4);
        let id = state.track.next_entity_id();
        let first = state.track.segments[0].id;
        state.track.obstacles.push(Obstacle {
            id,
            center: Vec2::new(
                state.player.position.x + 0.4,
                OBSTACLE_HALF_HEIGHT - OBSTACLE_SINK,
            ),
            polarity: Polarity::A,
            segment: Some(first),
        });
        state.track.segments[0].obstacles.push(id);
        let x_before = state.track.segments[0].center_x;

        let dash = TickInput {
            dash_pressed: true,
            ..Default::default()
        };
        tick(&mut state, &dash, SIM_DT);
        assert!(state.player.is_dead);
        assert_eq!(state.player.standing_on, None);
        assert!(!state.player.dash.active && !state.player.dash.queued);
        assert!(state.track.obstacle(id).is_none());
        assert!(state.track.segments[0].obstacles.is_empty());
        // No scroll on the tick of death
        assert_eq!(state.track.segments[0].center_x, x_before);
    }

    #[test]
    fn test_spike_of_other_polarity_is_harmless() {
        let mut state = new_state(4);
        let id = state.track.next_entity_id();
        state.track.obstacles.push(Obstacle {
            id,
            center: Vec2::new(
                state.player.position.x + 0.4,
                OBSTACLE_HALF_HEIGHT - OBSTACLE_SINK,
            ),
            polarity: Polarity::B,
            segment: None,
        });

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(!state.player.is_dead);
    }

    #[test]
    fn test_falling_platform_latches_and_carries_player() {
        let mut state = new_state(6);
        let first = state.track.segments[0].id;
        state.track.segments[0].fall = Some(FallBehavior::new(2.0));

        tick(&mut state, &TickInput::default(), SIM_DT);
        assert_eq!(state.player.standing_on, Some(first));
        assert!(state.drain_events().contains(&GameEvent::FallAttached(first)));
        let fall = state.track.segments[0].fall.as_ref().unwrap();
        assert!(fall.falling && fall.player_attached);

        let top_before = state.track.segments[0].top;
        run(&mut state, 10);
        let top_after = state.track.segments[0].top;
        assert!(top_after < top_before);
        assert!(state.player.is_grounded);
        assert!((state.player.bounds().min.y - top_after).abs() < 0.1);

        // Jumping off detaches but the platform keeps sinking
        tick(
            &mut state,
            &TickInput {
                jump_pressed: true,
                ..Default::default()
            },
            SIM_DT,
        );
        assert_eq!(state.player.standing_on, None);
        assert!(state.drain_events().contains(&GameEvent::FallDetached(first)));
        let fall = state.track.segments[0].fall.as_ref().unwrap();
        assert!(fall.falling && !fall.player_attached);
    }

    #[test]
    fn test_recycled_platform_clears_standing_reference() {
        let mut state = new_state(6);
        run(&mut state, 1);
        let first = state.track.segments[0].id;
        assert_eq!(state.player.standing_on, Some(first));

        // Sink the platform out of the world under the player
        state.track.segments[0].top = state.config.world.death_floor - 1.0;
        state.player.standing_on = Some(first);
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(state.track.segment(first).is_none());
        assert_eq!(state.player.standing_on, None);
    }

    #[test]
    fn test_same_seed_same_run() {
        let inputs: Vec<TickInput> = (0..400)
            .map(|i| TickInput {
                jump_pressed: i % 37 == 0,
                jump_released: i % 37 == 9,
                dash_pressed: i % 101 == 0,
                switch_polarity: i % 53 == 0,
            })
            .collect();

        let mut a = new_state(777);
        let mut b = new_state(777);
        for input in &inputs {
            tick(&mut a, input, SIM_DT);
            tick(&mut b, input, SIM_DT);
        }
        assert_eq!(a.player.position, b.player.position);
        assert_eq!(a.player.distance_traveled, b.player.distance_traveled);
        assert_eq!(a.track.segments.len(), b.track.segments.len());
        let ids_a: Vec<EntityId> = a.track.segments.iter().map(|s| s.id).collect();
        let ids_b: Vec<EntityId> = b.track.segments.iter().map(|s| s.id).collect();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn test_entities_stay_sorted() {
        let mut state = new_state(31);
        run(&mut state, 300);
        assert!(state.track.segments.windows(2).all(|w| w[0].id < w[1].id));
        assert!(state.track.obstacles.windows(2).all(|w| w[0].id < w[1].id));
        assert!(state.track.coins.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[test]
    fn test_undrained_events_are_capped() {
        use crate::sim::state::MAX_QUEUED_EVENTS;

        let mut state = new_state(5);
        state
            .events
            .extend(std::iter::repeat_n(GameEvent::Landed, MAX_QUEUED_EVENTS + 40));
        let jump = TickInput {
            jump_pressed: true,
            ..Default::default()
        };
        tick(&mut state, &jump, SIM_DT);

        assert_eq!(state.events.len(), MAX_QUEUED_EVENTS);
        // The newest event survives the trim
        assert_eq!(state.events.last(), Some(&GameEvent::Jumped { count: 1 }));
    }

    #[test]
    fn test_merge_input() {
        let mut input = TickInput {
            switch_polarity: true,
            ..Default::default()
        };
        input.merge(&TickInput {
            jump_pressed: true,
            switch_polarity: true,
            ..Default::default()
        });
        assert!(input.jump_pressed);
        assert!(!input.switch_polarity);
        assert!(!input.is_empty());
    }
}
