//! Match configuration.

use serde::{Deserialize, Serialize};

use crate::components::DifficultyMode;
use crate::error::{GameError, Result};

/// Default bullet cap.
pub const DEFAULT_MAX_BULLETS: usize = 100;

/// Default alien cap.
pub const DEFAULT_MAX_ALIENS: usize = 80;

/// Settings fixed for the lifetime of a match.
///
/// ```
/// use nova_core::config::SimulationConfig;
/// use nova_core::components::DifficultyMode;
///
/// let config = SimulationConfig::from_ron_str("(seed: 7, mode: Elite)").unwrap();
/// assert_eq!(config.seed, 7);
/// assert_eq!(config.mode, DifficultyMode::Elite);
/// assert_eq!(config.max_bullets, 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for the match RNG.
    pub seed: u64,
    /// Difficulty mode.
    pub mode: DifficultyMode,
    /// Live bullets kept before the oldest is dropped.
    pub max_bullets: usize,
    /// Live aliens allowed before new spawns are skipped.
    pub max_aliens: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            mode: DifficultyMode::Normal,
            max_bullets: DEFAULT_MAX_BULLETS,
            max_aliens: DEFAULT_MAX_ALIENS,
        }
    }
}

impl SimulationConfig {
    /// Default configuration with a specific seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Parse a RON document. Missing fields take their defaults.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text).map_err(|e| GameError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject caps that would make the match unplayable.
    pub fn validate(&self) -> Result<()> {
        if self.max_bullets == 0 {
            return Err(GameError::ConfigParse("max_bullets must be at least 1".into()));
        }
        if self.max_aliens == 0 {
            return Err(GameError::ConfigParse("max_aliens must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimulationConfig::default();
        assert_eq!(config.max_bullets, 100);
        assert_eq!(config.max_aliens, 80);
        assert_eq!(config.mode, DifficultyMode::Normal);
    }

    #[test]
    fn test_parse_full_document() {
        let text = "(seed: 42, mode: Mastery, max_bullets: 50, max_aliens: 20)";
        let config = SimulationConfig::from_ron_str(text).unwrap();
        assert_eq!(
            config,
            SimulationConfig {
                seed: 42,
                mode: DifficultyMode::Mastery,
                max_bullets: 50,
                max_aliens: 20,
            }
        );
    }

    #[test]
    fn test_parse_rejects_garbage_and_zero_caps() {
        assert!(matches!(
            SimulationConfig::from_ron_str("(seed: \"x\")"),
            Err(GameError::ConfigParse(_))
        ));
        assert!(matches!(
            SimulationConfig::from_ron_str("(max_aliens: 0)"),
            Err(GameError::ConfigParse(_))
        ));
    }
}
