// src/config.rs
use crate::consensus::AggregationMode;
use crate::dissimilarity::DistanceAlgorithm;
use crate::error::{ConsensusError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "GESTURE_CONSENSUS_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    pub algorithm: DistanceAlgorithm,
    pub aggregation: AggregationMode,
    pub curve_steps: usize,       // points on the tolerance sweep
    pub tolerance_decimals: u32,  // display rounding
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            algorithm: DistanceAlgorithm::NormalizedDtw,
            aggregation: AggregationMode::Average,
            curve_steps: 100,
            tolerance_decimals: 2,
        }
    }
}

impl ConsensusConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConsensusError::io(path, e))?;
        Self::from_json(&text)
    }

    /// `$GESTURE_CONSENSUS_CONFIG`, else `config.json` in the platform config dir.
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os(CONFIG_ENV).map(PathBuf::from).or_else(|| {
            directories::ProjectDirs::from("edu", "monash", "gesture-consensus")
                .map(|dirs| dirs.config_dir().join("config.json"))
        })
    }

    /// Loads the config at `default_path()` when it exists, defaults otherwise.
    pub fn discover() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => {
                tracing::info!("Loading configuration from {}", path.display());
                Self::load(path)
            }
            _ => Ok(Self::default()),
        }
    }
}

/// Rounds half away from zero to `decimals` places, as the result table shows values.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
