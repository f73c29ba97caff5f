use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::JudgeWindows;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("lane_count must be at least 1")]
    NoLanes,

    #[error("judge windows must be non-negative and ascending: {0:?}")]
    UnorderedWindows(JudgeWindows),

    #[error("max_score must be a positive number, got {0}")]
    InvalidMaxScore(f64),

    #[error("trailing_grace_ms must not be negative, got {0}")]
    NegativeGrace(i64),
}

/// Judgement engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of input lanes.
    #[serde(default = "default_lane_count")]
    pub lane_count: usize,
    #[serde(default)]
    pub windows: JudgeWindows,
    /// Score awarded for an all-Perfect play.
    #[serde(default = "default_max_score")]
    pub max_score: f64,
    /// Time after the last note before the session finishes.
    #[serde(default = "default_trailing_grace_ms")]
    pub trailing_grace_ms: i64,
    /// Input latency calibration (positive = presses register late).
    #[serde(default)]
    pub judge_offset_ms: i64,
}

fn default_lane_count() -> usize {
    4
}

fn default_max_score() -> f64 {
    1_000_000.0
}

fn default_trailing_grace_ms() -> i64 {
    3000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lane_count: default_lane_count(),
            windows: JudgeWindows::default(),
            max_score: default_max_score(),
            trailing_grace_ms: default_trailing_grace_ms(),
            judge_offset_ms: 0,
        }
    }
}

impl EngineConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lane_count == 0 {
            return Err(ConfigError::NoLanes);
        }
        if !self.windows.is_ascending() {
            return Err(ConfigError::UnorderedWindows(self.windows));
        }
        if !self.max_score.is_finite() || self.max_score <= 0.0 {
            return Err(ConfigError::InvalidMaxScore(self.max_score));
        }
        if self.trailing_grace_ms < 0 {
            return Err(ConfigError::NegativeGrace(self.trailing_grace_ms));
        }
        Ok(())
    }
}
