//! Bot configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use pass_the_bomb::{GameConfig, ScoreMode};
use std::path::PathBuf;

/// Complete bot configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Game tunables
    pub game: GameConfig,
    /// Whether the bot may kick and ban
    pub operator: bool,
    /// Scoring used for the post-game leaderboard
    pub score_mode: ScoreMode,
    /// Where finished games are exported, if anywhere
    pub export_dir: Option<PathBuf>,
}

/// Values given on the command line, which beat the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub operator: Option<bool>,
    pub score_mode: Option<ScoreMode>,
    pub export_dir: Option<PathBuf>,
}

impl BotConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set to something unparsable
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        Self::from_lookup(overrides, |key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup(
        overrides: Overrides,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let env = Env(lookup);
        let defaults = GameConfig::default();

        let game = GameConfig {
            join_window_secs: env.parse_or("PTB_JOIN_WINDOW_SECS", defaults.join_window_secs)?,
            min_fuse_secs: env.parse_or("PTB_MIN_FUSE_SECS", defaults.min_fuse_secs)?,
            max_fuse_secs: env.parse_or("PTB_MAX_FUSE_SECS", defaults.max_fuse_secs)?,
            defuse_enabled: env.parse_or("PTB_DEFUSE_ENABLED", defaults.defuse_enabled)?,
            defuse_chance: env.parse_or("PTB_DEFUSE_CHANCE", defaults.defuse_chance)?,
            min_wires: env.parse_or("PTB_MIN_WIRES", defaults.min_wires)?,
            max_wires: env.parse_or("PTB_MAX_WIRES", defaults.max_wires)?,
            fake_enabled: env.parse_or("PTB_FAKE_ENABLED", defaults.fake_enabled)?,
            fake_chance: env.parse_or("PTB_FAKE_CHANCE", defaults.fake_chance)?,
            min_players: env.parse_or("PTB_MIN_PLAYERS", defaults.min_players)?,
            kick_on_explode: env.parse_or("PTB_KICK_ON_EXPLODE", defaults.kick_on_explode)?,
            ban_on_explode: env.parse_or("PTB_BAN_ON_EXPLODE", defaults.ban_on_explode)?,
            ban_secs: env.parse_or("PTB_BAN_SECS", defaults.ban_secs)?,
            fuse_check_interval_secs: env.parse_or(
                "PTB_FUSE_CHECK_INTERVAL_SECS",
                defaults.fuse_check_interval_secs,
            )?,
        };

        let operator = match overrides.operator {
            Some(operator) => operator,
            None => env.parse_or("PTB_OPERATOR", true)?,
        };

        let score_mode = match overrides.score_mode {
            Some(mode) => mode,
            None => env.parse_or("PTB_SCORE_MODE", ScoreMode::default())?,
        };

        let export_dir = overrides
            .export_dir
            .or_else(|| env.get("PTB_EXPORT_DIR").map(PathBuf::from));

        Ok(Self {
            game,
            operator,
            score_mode,
            export_dir,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.game.validate().map_err(|reason| ConfigError::Invalid {
            var: "PTB_*".to_string(),
            reason,
        })?;

        if let Some(dir) = &self.export_dir
            && dir.exists()
            && !dir.is_dir()
        {
            return Err(ConfigError::Invalid {
                var: "PTB_EXPORT_DIR".to_string(),
                reason: format!("{} is not a directory", dir.display()),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Parses `key` if set. Unset falls back to `default`; set but
    /// unparsable is an error rather than a silent default.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
    {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                var: key.to_string(),
                reason: format!("cannot parse {value:?}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)], overrides: Overrides) -> Result<BotConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BotConfig::from_lookup(overrides, |key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = load(&[], Overrides::default()).unwrap();
        assert_eq!(config.game, GameConfig::default());
        assert!(config.operator);
        assert_eq!(config.score_mode, ScoreMode::Complex);
        assert!(config.export_dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_environment_is_read() {
        let config = load(
            &[
                ("PTB_MIN_PLAYERS", "2"),
                ("PTB_FAKE_ENABLED", "false"),
                ("PTB_SCORE_MODE", "mean"),
                ("PTB_EXPORT_DIR", "/tmp/ptb"),
            ],
            Overrides::default(),
        )
        .unwrap();

        assert_eq!(config.game.min_players, 2);
        assert!(!config.game.fake_enabled);
        assert_eq!(config.score_mode, ScoreMode::Mean);
        assert_eq!(config.export_dir, Some(PathBuf::from("/tmp/ptb")));
    }

    #[test]
    fn test_overrides_beat_environment() {
        let overrides = Overrides {
            operator: Some(false),
            score_mode: Some(ScoreMode::Duration),
            export_dir: None,
        };
        let config = load(
            &[("PTB_OPERATOR", "true"), ("PTB_SCORE_MODE", "defuse")],
            overrides,
        )
        .unwrap();

        assert!(!config.operator);
        assert_eq!(config.score_mode, ScoreMode::Duration);
    }

    #[test]
    fn test_unparsable_value_is_an_error() {
        let err = load(&[("PTB_BAN_SECS", "ten")], Overrides::default()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("PTB_BAN_SECS"));
        assert!(msg.contains("ten"));
    }

    #[test]
    fn test_blank_value_falls_back_to_default() {
        let config = load(&[("PTB_MIN_WIRES", "  ")], Overrides::default()).unwrap();
        assert_eq!(config.game.min_wires, GameConfig::default().min_wires);
    }

    #[test]
    fn test_config_validation_inverted_fuse() {
        let config = load(
            &[("PTB_MIN_FUSE_SECS", "60"), ("PTB_MAX_FUSE_SECS", "30")],
            Overrides::default(),
        )
        .unwrap();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}
