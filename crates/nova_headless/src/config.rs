//! Match configuration files.
//!
//! A config file is a RON document holding a [`SimulationConfig`]; fields
//! that are left out take their defaults.
//!
//! ```ron
//! (
//!     seed: 42,
//!     mode: Elite,
//!     max_aliens: 60,
//! )
//! ```

use std::path::Path;

use nova_core::config::SimulationConfig;
use nova_core::error::GameError;
use thiserror::Error;

/// Error type for config file loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found.
    #[error("Config file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON or the values were rejected.
    #[error("Invalid config: {0}")]
    Invalid(#[from] GameError),
}

/// Load a [`SimulationConfig`] from a RON file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SimulationConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }
    let contents = std::fs::read_to_string(path)?;
    let config = SimulationConfig::from_ron_str(&contents)?;
    tracing::debug!(path = %path.display(), seed = config.seed, "Loaded config");
    Ok(config)
}

/// Load the config at `path` if given, otherwise use defaults. A `seed`
/// override replaces whatever the file says.
pub fn resolve_config(
    path: Option<&Path>,
    seed: Option<u64>,
) -> Result<SimulationConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = seed {
        config.seed = seed;
    }
    Ok(config)
}
