//! Engine configuration.
//!
//! Hosts configure a game at construction time. The engine never hardcodes
//! hand sizes, life totals or the land-drop allowance - these seed the player
//! objects' properties, which effects may then modify.

use serde::{Deserialize, Serialize};

use super::error::{EngineError, EngineResult};

/// Configuration for one game instance.
///
/// ```
/// use ccg_rules::core::EngineConfig;
///
/// let config = EngineConfig::default().with_players(4).with_seed(7);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.player_count, 4);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of seats (2-8).
    pub player_count: usize,

    /// Life total each player starts with.
    pub starting_life: i64,

    /// Cards drawn for the opening hand.
    pub starting_hand_size: usize,

    /// Maximum hand size enforced during cleanup.
    pub max_hand_size: i64,

    /// Lands a player may play each turn.
    pub lands_per_turn: i64,

    /// Nesting limit while evaluating effects before reporting a cycle.
    pub max_effect_depth: usize,

    /// The player taking the first turn skips their first draw.
    pub skip_first_draw: bool,

    /// Mulligans allowed before a hand is kept automatically.
    pub max_mulligans: usize,

    /// Seed for library shuffles.
    pub seed: u64,

    /// Consecutive retries of one part before the sequencer gives up.
    /// `None` retries until a valid answer arrives.
    pub max_part_retries: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            player_count: 2,
            starting_life: 20,
            starting_hand_size: 7,
            max_hand_size: 7,
            lands_per_turn: 1,
            max_effect_depth: 64,
            skip_first_draw: true,
            max_mulligans: 7,
            seed: 0,
            max_part_retries: None,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_players(mut self, player_count: usize) -> Self {
        self.player_count = player_count;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_max_hand_size(mut self, size: i64) -> Self {
        self.max_hand_size = size;
        self
    }

    #[must_use]
    pub fn with_starting_hand_size(mut self, size: usize) -> Self {
        self.starting_hand_size = size;
        self
    }

    #[must_use]
    pub fn with_max_effect_depth(mut self, depth: usize) -> Self {
        self.max_effect_depth = depth;
        self
    }

    #[must_use]
    pub fn with_max_part_retries(mut self, retries: u32) -> Self {
        self.max_part_retries = Some(retries);
        self
    }

    /// Check the configuration for values the engine cannot run with.
    pub fn validate(&self) -> EngineResult<()> {
        if !(2..=8).contains(&self.player_count) {
            return Err(EngineError::InvalidConfig(format!(
                "player_count must be 2-8, got {}",
                self.player_count
            )));
        }
        if self.max_hand_size < 0 {
            return Err(EngineError::InvalidConfig(
                "max_hand_size must not be negative".into(),
            ));
        }
        if self.lands_per_turn < 0 {
            return Err(EngineError::InvalidConfig(
                "lands_per_turn must not be negative".into(),
            ));
        }
        if self.max_effect_depth == 0 {
            return Err(EngineError::InvalidConfig(
                "max_effect_depth must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_player_count_bounds() {
        assert!(EngineConfig::default().with_players(1).validate().is_err());
        assert!(EngineConfig::default().with_players(9).validate().is_err());
        assert!(EngineConfig::default().with_players(8).validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = EngineConfig::from_json(r#"{ "player_count": 3, "max_hand_size": 5 }"#).unwrap();
        assert_eq!(config.player_count, 3);
        assert_eq!(config.max_hand_size, 5);
        assert_eq!(config.starting_life, 20);
        assert_eq!(config.max_part_retries, None);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        let err = EngineConfig::from_json(r#"{ "player_count": 0 }"#).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));

        let err = EngineConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_zero_depth_rejected() {
        let config = EngineConfig::default().with_max_effect_depth(0);
        assert!(config.validate().is_err());
    }
}
