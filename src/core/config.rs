//! Battle configuration with documented constants
//!
//! All scheduler and reward tunables live here. A TOML file may override
//! any subset of them.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::ConfigError;

/// Configuration for battle scheduling and rewards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    // === SCHEDULER ===
    /// Hard turn cap. A battle reaching this turn is finished without a winner.
    pub max_turns: u32,

    /// Decision seconds a human participant starts the battle with
    pub initial_decision_seconds: i32,

    /// Decision seconds granted again after a human submits a move
    pub decision_seconds: i32,

    /// Seconds removed from the decision budget when a human times out
    pub timeout_penalty_seconds: i32,

    /// The timeout penalty only applies while the budget is at least this
    pub timeout_penalty_floor: i32,

    /// Wall-clock length of one countdown step (milliseconds)
    pub countdown_interval_ms: u64,

    // === EXPERIENCE ===
    /// Levels above a loser's level past which that loser grants nothing
    pub level_advantage_cutoff: u32,

    /// Fraction of experience removed per level of winner advantage
    ///
    /// At 0.04, winners averaging 10 levels above a monster get 60%.
    pub level_advantage_reduction: f64,

    /// Health percent the winners must lose to earn one bonus step
    pub health_loss_step_percent: i64,

    /// Bonus fraction per health-loss step
    pub health_loss_bonus: f64,

    /// Multiplier for `Elite2` monsters
    pub elite2_multiplier: i64,

    /// Multiplier for `Hero` monsters
    pub hero_multiplier: i64,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            max_turns: 1000,
            initial_decision_seconds: 15,
            decision_seconds: 15,
            timeout_penalty_seconds: 5,
            timeout_penalty_floor: 10,
            countdown_interval_ms: 1000,

            level_advantage_cutoff: 25,
            level_advantage_reduction: 0.04,
            health_loss_step_percent: 15,
            health_loss_bonus: 0.10,
            elite2_multiplier: 2,
            hero_multiplier: 15,
        }
    }
}

impl BattleConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from a TOML file
    pub fn load_from_toml(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse config from a TOML string; missing keys keep their defaults
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config: BattleConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_turns == 0 {
            return Err(ConfigError::Invalid("max_turns must be positive".into()));
        }

        if self.countdown_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "countdown_interval_ms must be positive".into(),
            ));
        }

        if self.elite2_multiplier < 1 || self.hero_multiplier < 1 {
            return Err(ConfigError::Invalid(format!(
                "subtype multipliers must be >= 1 (elite2 {}, hero {})",
                self.elite2_multiplier, self.hero_multiplier
            )));
        }

        if self.health_loss_step_percent <= 0 {
            return Err(ConfigError::Invalid(
                "health_loss_step_percent must be positive".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(BattleConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = BattleConfig::parse_toml("max_turns = 50\nhero_multiplier = 10\n").unwrap();
        assert_eq!(config.max_turns, 50);
        assert_eq!(config.hero_multiplier, 10);
        assert_eq!(config.decision_seconds, 15);
        assert_eq!(config.level_advantage_cutoff, 25);
    }

    #[test]
    fn test_zero_turn_cap_rejected() {
        let err = BattleConfig::parse_toml("max_turns = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let err = BattleConfig::parse_toml("max_turns = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
