//! Engine configuration, optionally read from a JSON file at start-up.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hard ceiling on search depth; the PV buffer is sized against it.
pub const MAX_DEPTH: u8 = 96;

pub const MIN_HASH_MB: usize = 1;
pub const MAX_HASH_MB: usize = 16_384;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("option {name} out of range: {value} (allowed {min}..={max})")]
    OutOfRange {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("{0} must hold six tables of 64 values")]
    BadTableShape(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Transposition table size in megabytes.
    pub hash_mb: usize,
    /// Default maximum search depth when `go` gives none.
    pub max_depth: u8,
    /// Base piece values by kind (P, N, B, R, Q, K), per phase.
    pub piece_values_mg: [i32; 6],
    pub piece_values_eg: [i32; 6],
    /// Optional square bonuses, six tables of 64 values each (pawn through
    /// king), written rank 8 first as in a board diagram; defaults are
    /// compiled in.
    pub psqt_mg: Option<Vec<Vec<i32>>>,
    pub psqt_eg: Option<Vec<Vec<i32>>>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            hash_mb: 128,
            max_depth: MAX_DEPTH,
            piece_values_mg: [100, 320, 330, 500, 900, 0],
            piece_values_eg: [120, 310, 330, 520, 940, 0],
            psqt_mg: None,
            psqt_eg: None,
        }
    }
}

impl Config {
    /// Read a configuration file; a missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Config::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        tracing::info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("hash_mb", self.hash_mb as i64, MIN_HASH_MB as i64, MAX_HASH_MB as i64)?;
        check_range("max_depth", self.max_depth as i64, 1, MAX_DEPTH as i64)?;
        for (name, tables) in [("psqt_mg", &self.psqt_mg), ("psqt_eg", &self.psqt_eg)] {
            if let Some(tables) = tables {
                if tables.len() != 6 || tables.iter().any(|t| t.len() != 64) {
                    return Err(ConfigError::BadTableShape(name));
                }
            }
        }
        Ok(())
    }
}

pub(crate) fn check_range(
    name: &'static str,
    value: i64,
    min: i64,
    max: i64,
) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            name,
            value,
            min,
            max,
        });
    }
    Ok(())
}
