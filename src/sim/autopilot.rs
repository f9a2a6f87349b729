//! Demo-mode player
//!
//! A reactive rule proposes the input edges for the next tick. When following
//! it would get the player killed within the planning horizon, a handful of
//! alternative inputs are played out on copies of the state and the one that
//! keeps the player alive longest wins. Deterministic: the same state always
//! yields the same input, so autopilot runs replay exactly from a seed.

use super::state::GameState;
use super::tick::{TickInput, tick};
use super::track::Segment;
use crate::consts::*;

/// Seconds of travel to look ahead for platform edges
const LEAD_TIME: f32 = 0.12;
/// Seconds of travel to look ahead for spikes; a jump needs a couple of
/// ticks of climb before the feet clear one
const SPIKE_LEAD_TIME: f32 = 0.2;
/// Release a held jump once this far above the landing surface
const RELEASE_CLEARANCE: f32 = 3.0;
/// Ticks played out when checking an input
const HORIZON_TICKS: u32 = 50;

const fn edges(jump: bool, release: bool, dash: bool, switch: bool) -> TickInput {
    TickInput {
        jump_pressed: jump,
        jump_released: release,
        dash_pressed: dash,
        switch_polarity: switch,
    }
}

/// Inputs tried when the reactive rule leads to a death, in order of preference
const ALTERNATIVES: [TickInput; 7] = [
    edges(false, false, false, false),
    // Cut a held jump short
    edges(false, true, false, false),
    // Short hop: the hold ends on the tick it starts
    edges(true, true, false, false),
    edges(true, false, false, false),
    edges(false, false, false, true),
    edges(true, false, false, true),
    edges(false, false, true, false),
];

/// Input the autopilot would send for the next tick
pub fn autopilot_input(state: &GameState) -> TickInput {
    if state.player.is_dead {
        return TickInput::default();
    }

    let preferred = reactive_input(state);
    let mut best = preferred;
    let mut best_ticks = survival_ticks(state, &preferred);
    if best_ticks >= HORIZON_TICKS {
        return preferred;
    }

    for candidate in ALTERNATIVES {
        if candidate == preferred {
            continue;
        }
        let ticks = survival_ticks(state, &candidate);
        if ticks > best_ticks {
            best = candidate;
            best_ticks = ticks;
            if ticks >= HORIZON_TICKS {
                break;
            }
        }
    }
    log::trace!("Autopilot override {:?} ({} ticks)", best, best_ticks);
    best
}

/// Ticks a copy of `state` stays alive after `first`, following the
/// reactive rule afterwards (capped at the horizon)
fn survival_ticks(state: &GameState, first: &TickInput) -> u32 {
    let mut sim = state.clone();
    sim.events.clear();
    let mut input = *first;
    for survived in 0..HORIZON_TICKS {
        tick(&mut sim, &input, SIM_DT);
        sim.events.clear();
        if doomed(&sim) {
            return survived;
        }
        input = reactive_input(&sim);
    }
    HORIZON_TICKS
}

/// Dead, or falling below every surface that exists or can still spawn
fn doomed(state: &GameState) -> bool {
    let player = &state.player;
    if player.is_dead {
        return true;
    }
    if player.is_grounded || player.velocity.y >= 0.0 {
        return false;
    }
    let lowest = state
        .track
        .segments
        .iter()
        .map(|s| s.top)
        .fold(state.config.track.min_allowed_height, f32::min);
    player.position.y - PLAYER_HALF_HEIGHT < lowest - 1.0
}

/// Rule-of-thumb input from the immediate surroundings
fn reactive_input(state: &GameState) -> TickInput {
    let mut input = TickInput::default();
    let player = &state.player;
    if player.is_dead {
        return input;
    }

    let x = player.position.x;
    let feet = player.position.y - PLAYER_HALF_HEIGHT;
    let speed = player.velocity.x.max(1.0);
    let lead = speed * LEAD_TIME + PLAYER_HALF_WIDTH;
    let spike_lead = speed * SPIKE_LEAD_TIME + PLAYER_HALF_WIDTH + OBSTACLE_HALF_WIDTH;

    let under = state.track.segment_at(x);
    let ahead = state.track.next_segment_after(x);

    // Where the player will come down: the platform below if we are still
    // above its surface, otherwise the next one
    let landing: Option<&Segment> = match under {
        Some(seg) if feet >= seg.top - 0.05 => Some(seg),
        _ => ahead,
    };

    if player.is_grounded {
        let edge_close = under.is_some_and(|seg| seg.right() - x < lead);
        let spike_close = state.track.obstacles.iter().any(|o| {
            let dx = o.center.x - x;
            o.polarity == player.polarity && dx > 0.0 && dx < spike_lead
        });
        let wall_close = ahead.is_some_and(|seg| {
            seg.polarity == player.polarity && seg.top > feet + 0.5 && seg.left() - x < lead
        });
        input.jump_pressed = edge_close || spike_close || wall_close;
        return input;
    }

    if let Some(seg) = landing
        && seg.polarity != player.polarity
    {
        input.switch_polarity = true;
    }

    // Falling into a gap short of the next platform
    if under.is_none()
        && player.velocity.y < 0.0
        && let Some(seg) = ahead
        && feet < seg.top + 1.0
    {
        if player.jump_count < state.config.player.max_jumps {
            input.jump_pressed = true;
        } else if player.dash.cooldown_remaining <= 0.0 && !player.dash.active {
            input.dash_pressed = true;
        }
    }

    if player.holding_jump
        && let Some(seg) = landing
        && feet > seg.top + RELEASE_CLEARANCE
    {
        input.jump_released = true;
    }

    input
}
