//! Save data and the stores that hold it
//!
//! The simulation never touches storage directly. A [`SaveStore`] is handed
//! to the session at construction; reads fall back to defaults and write
//! failures are reported without stopping the run.

mod store;

#[cfg(target_arch = "wasm32")]
pub use store::LocalStorageStore;
pub use store::{JsonFileStore, MemoryStore};

use serde::{Deserialize, Serialize};

use crate::config::PlayerConfig;
use crate::error::PersistenceError;
use crate::sim::player::{MAX_SCORE_MULTIPLIER_LEVEL, Player};

/// Highest purchasable dash upgrade
pub const MAX_DASH_UPGRADE_LEVEL: u32 = 5;
/// Cooldown removed per dash upgrade level (seconds)
pub const DASH_COOLDOWN_PER_LEVEL: f32 = 0.2;
/// Upgrades never push the dash cooldown below this
pub const MIN_DASH_COOLDOWN: f32 = 0.2;

/// Everything that survives between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveData {
    /// Best multiplier-adjusted distance
    pub high_score: u64,
    pub total_coins: u32,
    pub total_runs: u32,
    pub total_distance: f64,
    pub score_multiplier_level: u32,
    pub selected_skin: String,
    pub dash_upgrade_level: u32,
    pub unlocked_skins: Vec<String>,
    pub double_jump_unlocked: bool,
    pub speed_boost_unlocked: bool,
}

impl Default for SaveData {
    fn default() -> Self {
        Self {
            high_score: 0,
            total_coins: 0,
            total_runs: 0,
            total_distance: 0.0,
            score_multiplier_level: 0,
            selected_skin: "Punk".to_string(),
            dash_upgrade_level: 0,
            unlocked_skins: vec!["Punk".to_string()],
            double_jump_unlocked: false,
            speed_boost_unlocked: false,
        }
    }
}

impl SaveData {
    /// Clamp upgrade levels into their purchasable ranges
    pub fn sanitize(&mut self) {
        self.score_multiplier_level = self.score_multiplier_level.min(MAX_SCORE_MULTIPLIER_LEVEL);
        self.dash_upgrade_level = self.dash_upgrade_level.min(MAX_DASH_UPGRADE_LEVEL);
    }

    /// Player tunables with purchased upgrades applied
    pub fn upgraded(&self, base: &PlayerConfig) -> PlayerConfig {
        let level = self.dash_upgrade_level.min(MAX_DASH_UPGRADE_LEVEL);
        let floor = MIN_DASH_COOLDOWN.min(base.dash_cooldown);
        let mut config = PlayerConfig {
            dash_cooldown: (base.dash_cooldown - DASH_COOLDOWN_PER_LEVEL * level as f32).max(floor),
            ..base.clone()
        };
        if self.double_jump_unlocked {
            config.can_double_jump = true;
            config.max_jumps = base.max_jumps.max(2);
        }
        config
    }

    /// Carry saved totals and upgrades onto a fresh player
    pub fn prime(&self, player: &mut Player) {
        player.total_coins = self.total_coins;
        player.set_score_multiplier_level(self.score_multiplier_level);
    }

    /// Fold a live run into the totals without counting it as finished
    pub fn checkpoint(&mut self, player: &Player) {
        self.total_coins = player.total_coins;
        self.high_score = self.high_score.max(player.multiplied_distance());
    }

    /// Fold a finished run into the totals. Returns true on a new high score.
    pub fn record_run(&mut self, player: &Player) -> bool {
        let score = player.multiplied_distance();
        let new_best = score > self.high_score;
        self.checkpoint(player);
        self.total_runs += 1;
        self.total_distance += player.distance_traveled.max(0.0) as f64;
        new_best
    }
}

/// Somewhere save data can be read from and written to
pub trait SaveStore {
    /// `Ok(None)` when nothing has been saved yet
    fn load(&self) -> Result<Option<SaveData>, PersistenceError>;

    fn save(&mut self, data: &SaveData) -> Result<(), PersistenceError>;
}

/// Load from `store`, falling back to defaults on a missing or unreadable save
pub fn load_or_default(store: &impl SaveStore) -> SaveData {
    match store.load() {
        Ok(Some(mut data)) => {
            data.sanitize();
            log::info!(
                "Loaded save: {} coins, best {}, {} runs",
                data.total_coins,
                data.high_score,
                data.total_runs
            );
            data
        }
        Ok(None) => {
            log::info!("No save found, starting fresh");
            SaveData::default()
        }
        Err(e) => {
            log::warn!("Could not read save ({}), starting fresh", e);
            SaveData::default()
        }
    }
}
