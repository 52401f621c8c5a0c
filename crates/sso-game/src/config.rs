//! Configuration for a game session.

use serde::{Deserialize, Serialize};
use sso_core::Coord;

use crate::error::{GameError, GameResult};

/// Tunables for a session. Missing fields in a config file take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    /// RNG seed for world generation and interrupt rolls.
    pub seed: u64,
    /// Grid width in sectors.
    pub grid_width: i32,
    /// Grid height in sectors.
    pub grid_height: i32,
    /// Where a new ship starts.
    pub start: Coord,
    /// Travel time for one sector of distance, before the engine multiplier.
    pub travel_ms_per_square: u64,
    /// How often a traveling ship rolls for an interactive event.
    pub interrupt_interval_ms: u64,
    /// Probability (0.0 to 1.0) that a roll interrupts travel.
    pub interrupt_chance: f64,
    /// XP for arriving in a sector.
    pub exploration_xp: u64,
    /// XP for a completed scan.
    pub scan_xp: u64,
    /// Idle time after the last state change before autosaving.
    pub autosave_delay_ms: u64,
    /// Lifetime of a notification.
    pub notification_ttl_ms: u64,
    /// Log entries kept in memory. Oldest are dropped first.
    pub max_log_entries: usize,
    /// Log entries written to a snapshot.
    pub persisted_log_entries: usize,
    /// Store key the snapshot is written under.
    pub save_key: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            grid_width: 10,
            grid_height: 10,
            start: Coord::new(5, 5),
            travel_ms_per_square: 30_000,
            interrupt_interval_ms: 30_000,
            interrupt_chance: 0.25,
            exploration_xp: 10,
            scan_xp: 5,
            autosave_delay_ms: 60_000,
            notification_ttl_ms: 5_000,
            max_log_entries: 100,
            persisted_log_entries: 20,
            save_key: "soul-ship-odyssey".to_string(),
        }
    }
}

impl GameConfig {
    /// Parse a JSON config.
    pub fn from_json(json: &str) -> GameResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| GameError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the values can drive a session.
    pub fn validate(&self) -> GameResult<()> {
        if self.grid_width <= 0 || self.grid_height <= 0 {
            return Err(GameError::InvalidConfig(format!(
                "grid must be at least 1x1, got {}x{}",
                self.grid_width, self.grid_height
            )));
        }
        let sectors = self.grid_width.checked_mul(self.grid_height);
        if sectors.is_none_or(|n| n as usize > sso_core::grid::MAX_SECTORS) {
            return Err(GameError::InvalidConfig(format!(
                "grid {}x{} exceeds {} sectors",
                self.grid_width,
                self.grid_height,
                sso_core::grid::MAX_SECTORS
            )));
        }
        if !(0..self.grid_width).contains(&self.start.x)
            || !(0..self.grid_height).contains(&self.start.y)
        {
            return Err(GameError::InvalidConfig(format!(
                "start {} is outside the grid",
                self.start
            )));
        }
        if self.travel_ms_per_square == 0 || self.interrupt_interval_ms == 0 {
            return Err(GameError::InvalidConfig(
                "travel and interrupt timings must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.interrupt_chance) {
            return Err(GameError::InvalidConfig(format!(
                "interrupt_chance {} is not a probability",
                self.interrupt_chance
            )));
        }
        if self.save_key.trim().is_empty() {
            return Err(GameError::InvalidConfig("save_key is empty".to_string()));
        }
        Ok(())
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the grid dimensions.
    pub fn with_grid_size(mut self, width: i32, height: i32) -> Self {
        self.grid_width = width;
        self.grid_height = height;
        self
    }

    /// Set the starting sector.
    pub fn with_start(mut self, start: Coord) -> Self {
        self.start = start;
        self
    }

    /// Set the interrupt probability (clamped to 0.0-1.0).
    pub fn with_interrupt_chance(mut self, chance: f64) -> Self {
        self.interrupt_chance = chance.clamp(0.0, 1.0);
        self
    }

    /// Set the per-sector travel time.
    pub fn with_travel_ms_per_square(mut self, ms: u64) -> Self {
        self.travel_ms_per_square = ms;
        self
    }

    /// Set the interrupt roll interval.
    pub fn with_interrupt_interval_ms(mut self, ms: u64) -> Self {
        self.interrupt_interval_ms = ms;
        self
    }

    /// Set the autosave idle delay.
    pub fn with_autosave_delay_ms(mut self, ms: u64) -> Self {
        self.autosave_delay_ms = ms;
        self
    }

    /// Set the store key.
    pub fn with_save_key(mut self, key: impl Into<String>) -> Self {
        self.save_key = key.into();
        self
    }
}
