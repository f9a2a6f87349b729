//! Run session
//!
//! Owns one [`GameState`] plus the injected save store, and drives the
//! simulation at a fixed timestep from variable frame times. Save data is
//! read once at construction and written on death or on request.

use crate::config::SimConfig;
use crate::consts::*;
use crate::error::{PersistenceError, StartupError};
use crate::persistence::{self, SaveData, SaveStore};
use crate::sim::{GameEvent, GameState, Polarity, TickInput, autopilot_input, tick};

/// Read-only snapshot for presentation, polled once per frame
#[derive(Debug, Clone, PartialEq)]
pub struct Hud {
    /// Whole units travelled
    pub distance: u64,
    /// Distance with the score multiplier applied
    pub score: u64,
    pub session_coins: u32,
    pub total_coins: u32,
    pub high_score: u64,
    pub is_dead: bool,
    pub polarity: Polarity,
    pub dash_ready: bool,
}

pub struct Session<S: SaveStore> {
    base_config: SimConfig,
    state: GameState,
    store: S,
    save: SaveData,
    /// Edges waiting for the next tick
    pending: TickInput,
    accumulator: f32,
    /// Death already folded into the save data
    death_recorded: bool,
    /// Let the autopilot add its input to every tick
    pub autopilot: bool,
}

impl<S: SaveStore> Session<S> {
    /// Load save data from `store` and start a run
    pub fn new(config: SimConfig, seed: u64, store: S) -> Result<Self, StartupError> {
        let save = persistence::load_or_default(&store);
        let state = start_run(&config, &save, seed)?;
        Ok(Self {
            base_config: config,
            state,
            store,
            save,
            pending: TickInput::default(),
            accumulator: 0.0,
            death_recorded: false,
            autopilot: false,
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn save_data(&self) -> &SaveData {
        &self.save
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Queue input edges for the next tick
    pub fn queue_input(&mut self, input: &TickInput) {
        self.pending.merge(input);
    }

    /// Advance by a frame's worth of wall time.
    ///
    /// Frame time is clamped (non-finite counts as zero) and at most
    /// `MAX_SUBSTEPS` ticks run; queued edges are consumed by the first of
    /// them. Returns the ticks run.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        if frame_dt.is_finite() {
            self.accumulator += frame_dt.clamp(0.0, MAX_FRAME_DT);
        }

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.step();
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        substeps
    }

    /// Run exactly one tick with whatever input is queued
    pub fn step(&mut self) {
        let mut input = std::mem::take(&mut self.pending);
        if self.autopilot {
            input.merge(&autopilot_input(&self.state));
        }
        tick(&mut self.state, &input, SIM_DT);

        if self.state.player.is_dead && !self.death_recorded {
            self.death_recorded = true;
            self.record_death();
        }
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.state.drain_events()
    }

    pub fn hud(&self) -> Hud {
        let player = &self.state.player;
        Hud {
            distance: player.distance(),
            score: player.multiplied_distance(),
            session_coins: player.session_coins,
            total_coins: player.total_coins,
            high_score: self.save.high_score.max(player.multiplied_distance()),
            is_dead: player.is_dead,
            polarity: player.polarity,
            dash_ready: !player.dash.active && player.dash.cooldown_remaining <= 0.0,
        }
    }

    /// Fold the live run's coins and best score into the save and write it
    pub fn checkpoint(&mut self) -> Result<(), PersistenceError> {
        if !self.death_recorded {
            self.save.checkpoint(&self.state.player);
        }
        self.store.save(&self.save)
    }

    /// Throw away the current run and start a new one with `seed`.
    ///
    /// Coins from an unfinished run are kept.
    pub fn restart(&mut self, seed: u64) -> Result<(), StartupError> {
        if !self.death_recorded {
            self.save.checkpoint(&self.state.player);
        }
        self.state = start_run(&self.base_config, &self.save, seed)?;
        self.pending = TickInput::default();
        self.accumulator = 0.0;
        self.death_recorded = false;
        Ok(())
    }

    fn record_death(&mut self) {
        let new_best = self.save.record_run(&self.state.player);
        log::info!(
            "Run {} over: distance {}, score {}{}",
            self.save.total_runs,
            self.state.player.distance(),
            self.state.player.multiplied_distance(),
            if new_best { " (new high score)" } else { "" }
        );
        if let Err(e) = self.store.save(&self.save) {
            log::error!("Failed to write save after death: {}", e);
        }
    }
}

/// Fresh state with purchased upgrades and saved totals applied
fn start_run(base: &SimConfig, save: &SaveData, seed: u64) -> Result<GameState, StartupError> {
    let mut config = base.clone();
    config.player = save.upgraded(&base.player);
    let mut state = GameState::new(config, seed)?;
    save.prime(&mut state.player);
    Ok(state)
}
