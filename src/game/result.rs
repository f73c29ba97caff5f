use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SessionState;

/// Session summary handed to the caller once a play is over (or at any point
/// during it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayResult {
    pub song: String,
    pub bpm: f64,
    pub offset_ms: i64,
    pub total_notes: u32,
    pub score: f64,
    pub max_score: f64,
    pub max_combo: u32,
    pub perfect_count: u32,
    pub great_count: u32,
    pub good_count: u32,
    pub miss_count: u32,
    pub auto_miss_count: u32,
    pub fast_count: u32,
    pub slow_count: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub state: SessionState,
}

impl PlayResult {
    /// Score as a percentage of the maximum.
    pub fn accuracy(&self) -> f64 {
        if self.max_score <= 0.0 {
            return 0.0;
        }
        self.score / self.max_score * 100.0
    }

    /// Score truncated to an integer, as shown on the HUD.
    pub fn display_score(&self) -> u64 {
        self.score.max(0.0).floor() as u64
    }

    pub fn is_full_combo(&self) -> bool {
        self.miss_count == 0 && self.auto_miss_count == 0 && self.max_combo == self.total_notes
    }
}
