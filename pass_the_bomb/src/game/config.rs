//! Game configuration models.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::constants::{
    DEFAULT_BAN_SECS, DEFAULT_DEFUSE_CHANCE, DEFAULT_FAKE_CHANCE,
    DEFAULT_FUSE_CHECK_INTERVAL_SECS, DEFAULT_JOIN_WINDOW_SECS, DEFAULT_MAX_FUSE_SECS,
    DEFAULT_MAX_WIRES, DEFAULT_MIN_FUSE_SECS, DEFAULT_MIN_PLAYERS, DEFAULT_MIN_WIRES,
    EXPLAIN_TICKS,
};

/// Tunables for a single round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Length of the warm-up (join) window in seconds
    pub join_window_secs: u64,

    /// Shortest initial fuse in seconds
    pub min_fuse_secs: u64,

    /// Longest initial fuse in seconds
    pub max_fuse_secs: u64,

    /// Whether the wire-cutting minigame is available at all
    pub defuse_enabled: bool,

    /// Percent chance (0-100) that a bomb is defusable
    pub defuse_chance: u8,

    /// Fewest wires a defusable bomb can have
    pub min_wires: usize,

    /// Most wires a defusable bomb can have
    pub max_wires: usize,

    /// Whether fake bombs can be dealt
    pub fake_enabled: bool,

    /// Percent chance (0-100) that a bomb is fake
    pub fake_chance: u8,

    /// Players needed when the join window closes
    pub min_players: usize,

    /// Kick the holder when a real bomb detonates
    pub kick_on_explode: bool,

    /// Ban the holder before kicking, so they can't rejoin straight away
    pub ban_on_explode: bool,

    /// Ban duration in seconds
    pub ban_secs: u64,

    /// Watchdog wake-up period in seconds
    pub fuse_check_interval_secs: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            join_window_secs: DEFAULT_JOIN_WINDOW_SECS,
            min_fuse_secs: DEFAULT_MIN_FUSE_SECS,
            max_fuse_secs: DEFAULT_MAX_FUSE_SECS,
            defuse_enabled: true,
            defuse_chance: DEFAULT_DEFUSE_CHANCE,
            min_wires: DEFAULT_MIN_WIRES,
            max_wires: DEFAULT_MAX_WIRES,
            fake_enabled: true,
            fake_chance: DEFAULT_FAKE_CHANCE,
            min_players: DEFAULT_MIN_PLAYERS,
            kick_on_explode: true,
            ban_on_explode: true,
            ban_secs: DEFAULT_BAN_SECS,
            fuse_check_interval_secs: DEFAULT_FUSE_CHECK_INTERVAL_SECS,
        }
    }
}

impl GameConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.join_window_secs == 0 {
            return Err("Join window must be at least 1 second".to_string());
        }

        if self.max_fuse_secs < self.min_fuse_secs {
            return Err("Max fuse must not be shorter than min fuse".to_string());
        }

        if self.min_fuse_secs == 0 {
            return Err("Min fuse must be at least 1 second".to_string());
        }

        if self.defuse_chance > 100 || self.fake_chance > 100 {
            return Err("Chances are percentages and must be between 0 and 100".to_string());
        }

        if self.defuse_enabled && (self.min_wires == 0 || self.max_wires < self.min_wires) {
            return Err("Wire bounds must satisfy 1 <= min_wires <= max_wires".to_string());
        }

        // Wire numbers travel as u8 on the command surface.
        if self.max_wires > u8::MAX as usize {
            return Err(format!("Max wires must be at most {}", u8::MAX));
        }

        if self.min_players < 2 {
            return Err("Min players must be at least 2".to_string());
        }

        if self.fuse_check_interval_secs == 0 {
            return Err("Fuse check interval must be at least 1 second".to_string());
        }

        Ok(())
    }

    pub fn join_window(&self) -> Duration {
        Duration::from_secs(self.join_window_secs)
    }

    /// Gap between two consecutive warm-up broadcasts
    pub fn explain_interval(&self) -> Duration {
        self.join_window() / (u32::from(EXPLAIN_TICKS) + 1)
    }

    pub fn min_fuse(&self) -> Duration {
        Duration::from_secs(self.min_fuse_secs)
    }

    pub fn max_fuse(&self) -> Duration {
        Duration::from_secs(self.max_fuse_secs)
    }

    pub fn ban_duration(&self) -> Duration {
        Duration::from_secs(self.ban_secs)
    }

    pub fn fuse_check_interval(&self) -> Duration {
        Duration::from_secs(self.fuse_check_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_explain_interval_is_six_seconds() {
        let config = GameConfig::default();
        assert_eq!(config.explain_interval(), Duration::from_secs(6));
    }

    #[test]
    fn test_inverted_fuse_rejected() {
        let config = GameConfig {
            min_fuse_secs: 100,
            max_fuse_secs: 50,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_chance_over_hundred_rejected() {
        let config = GameConfig {
            fake_chance: 101,
            ..GameConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_wire_bounds_ignored_when_defuse_disabled() {
        let config = GameConfig {
            defuse_enabled: false,
            min_wires: 0,
            max_wires: 0,
            ..GameConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: GameConfig = serde_json::from_str(r#"{"min_players": 2}"#).unwrap();
        assert_eq!(config.min_players, 2);
        assert_eq!(config.max_fuse_secs, DEFAULT_MAX_FUSE_SECS);
    }
}
