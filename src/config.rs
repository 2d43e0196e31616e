use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::game::constants::{bot, sim};

/// Configuration validation failures
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be > 0, got {value}")]
    NonPositive { field: &'static str, value: f32 },

    #[error("{field} must be within {min}..={max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("arena must be at least 5x5 cells, got {width}x{height}")]
    ArenaTooSmall { width: u32, height: u32 },

    #[error("bot count must be 1-{max}, got {bots}")]
    BotCount { bots: usize, max: usize },
}

/// Read and parse an env var, warning and returning `None` on a bad value
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!("Invalid {} '{}', using default", key, raw);
            None
        }
    }
}

/// Decision-core tuning. Defaults are the contract values in
/// [`crate::game::constants::bot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    /// Seconds each chosen direction is held
    pub move_duration: f32,
    /// Perk detection radius
    pub perk_detection_radius: f32,
    /// Rival detection radius
    pub player_detection_radius: f32,
    /// Margin added to the own blast radius for threat detection
    pub threat_safety_margin: f32,
    /// Random draw above which a bomb attempt triggers
    pub bomb_trigger_threshold: f32,
    /// Delay between committing to and requesting a bomb
    pub bomb_commit_delay: f32,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            move_duration: bot::MOVE_DURATION,
            perk_detection_radius: bot::PERK_DETECTION_RADIUS,
            player_detection_radius: bot::PLAYER_DETECTION_RADIUS,
            threat_safety_margin: bot::THREAT_SAFETY_MARGIN,
            bomb_trigger_threshold: bot::BOMB_TRIGGER_THRESHOLD,
            bomb_commit_delay: bot::BOMB_COMMIT_DELAY,
        }
    }
}

impl BotConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Some(v) = env_parse::<f32>("BOT_MOVE_DURATION") {
            if v > 0.0 {
                config.move_duration = v;
            } else {
                tracing::warn!("BOT_MOVE_DURATION must be > 0, using default");
            }
        }

        if let Some(v) = env_parse::<f32>("BOT_PERK_RADIUS") {
            config.perk_detection_radius = v;
        }

        if let Some(v) = env_parse::<f32>("BOT_PLAYER_RADIUS") {
            config.player_detection_radius = v;
        }

        if let Some(v) = env_parse::<f32>("BOT_THREAT_MARGIN") {
            config.threat_safety_margin = v;
        }

        if let Some(v) = env_parse::<f32>("BOT_BOMB_TRIGGER") {
            if (0.0..=1.0).contains(&v) {
                config.bomb_trigger_threshold = v;
            } else {
                tracing::warn!("BOT_BOMB_TRIGGER must be 0-1, using default");
            }
        }

        if let Some(v) = env_parse::<f32>("BOT_COMMIT_DELAY") {
            config.bomb_commit_delay = v;
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.move_duration <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "move_duration",
                value: self.move_duration,
            });
        }
        if self.perk_detection_radius <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "perk_detection_radius",
                value: self.perk_detection_radius,
            });
        }
        if self.player_detection_radius <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "player_detection_radius",
                value: self.player_detection_radius,
            });
        }
        if self.threat_safety_margin < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "threat_safety_margin",
                value: self.threat_safety_margin,
                min: 0.0,
                max: f32::MAX,
            });
        }
        if !(0.0..=1.0).contains(&self.bomb_trigger_threshold) {
            return Err(ConfigError::OutOfRange {
                field: "bomb_trigger_threshold",
                value: self.bomb_trigger_threshold,
                min: 0.0,
                max: 1.0,
            });
        }
        if self.bomb_commit_delay < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "bomb_commit_delay",
                value: self.bomb_commit_delay,
                min: 0.0,
                max: f32::MAX,
            });
        }
        Ok(())
    }
}

/// Maximum bots the headless arena will spawn (one per corner)
pub const MAX_SIM_BOTS: usize = 4;

/// Headless simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Arena width in cells
    pub width: u32,
    /// Arena height in cells
    pub height: u32,
    /// Number of bots
    pub bots: usize,
    /// Simulated seconds
    pub seconds: f32,
    /// RNG seed for the map and every bot
    pub seed: u64,
    /// Fraction of free cells filled with crates
    pub crate_density: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: sim::DEFAULT_WIDTH,
            height: sim::DEFAULT_HEIGHT,
            bots: sim::DEFAULT_BOTS,
            seconds: sim::DEFAULT_SECONDS,
            seed: 0x5EED,
            crate_density: sim::DEFAULT_CRATE_DENSITY,
        }
    }
}

impl SimConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Some(v) = env_parse::<u32>("SIM_WIDTH") {
            config.width = v;
        }

        if let Some(v) = env_parse::<u32>("SIM_HEIGHT") {
            config.height = v;
        }

        if let Some(v) = env_parse::<usize>("SIM_BOTS") {
            if v > 0 && v <= MAX_SIM_BOTS {
                config.bots = v;
            } else {
                tracing::warn!("SIM_BOTS must be 1-{}, using default", MAX_SIM_BOTS);
            }
        }

        if let Some(v) = env_parse::<f32>("SIM_SECONDS") {
            config.seconds = v;
        }

        if let Some(v) = env_parse::<u64>("SIM_SEED") {
            config.seed = v;
        }

        if let Some(v) = env_parse::<f32>("SIM_CRATE_DENSITY") {
            config.crate_density = v;
        }

        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < 5 || self.height < 5 {
            return Err(ConfigError::ArenaTooSmall {
                width: self.width,
                height: self.height,
            });
        }
        if self.bots == 0 || self.bots > MAX_SIM_BOTS {
            return Err(ConfigError::BotCount {
                bots: self.bots,
                max: MAX_SIM_BOTS,
            });
        }
        if self.seconds <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "seconds",
                value: self.seconds,
            });
        }
        if !(0.0..=1.0).contains(&self.crate_density) {
            return Err(ConfigError::OutOfRange {
                field: "crate_density",
                value: self.crate_density,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bot_config() {
        let config = BotConfig::default();
        assert_eq!(config.move_duration, 0.20);
        assert_eq!(config.perk_detection_radius, 1.5);
        assert_eq!(config.player_detection_radius, 2.0);
        assert_eq!(config.bomb_trigger_threshold, 0.7);
        assert_eq!(config.bomb_commit_delay, 0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_or_default() {
        let config = BotConfig::load_or_default();
        assert!(config.move_duration > 0.0);
        let sim = SimConfig::load_or_default();
        assert!(sim.bots > 0);
    }

    #[test]
    fn test_rejects_bad_trigger() {
        let config = BotConfig {
            bomb_trigger_threshold: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "bomb_trigger_threshold", .. })
        ));
    }

    #[test]
    fn test_rejects_zero_move_duration() {
        let config = BotConfig {
            move_duration: 0.0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NonPositive {
                field: "move_duration",
                value: 0.0
            })
        );
    }

    #[test]
    fn test_sim_config_validation() {
        assert!(SimConfig::default().validate().is_ok());

        let tiny = SimConfig {
            width: 3,
            ..Default::default()
        };
        assert!(matches!(tiny.validate(), Err(ConfigError::ArenaTooSmall { .. })));

        let crowded = SimConfig {
            bots: 9,
            ..Default::default()
        };
        assert_eq!(
            crowded.validate(),
            Err(ConfigError::BotCount { bots: 9, max: MAX_SIM_BOTS })
        );
    }

    #[test]
    fn test_error_messages() {
        let err = ConfigError::ArenaTooSmall { width: 3, height: 4 };
        assert_eq!(err.to_string(), "arena must be at least 5x5 cells, got 3x4");
    }
}
