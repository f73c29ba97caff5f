use serde::{Deserialize, Serialize};

use super::ChartError;

/// A single note as it appears in a chart file.
///
/// `lane` is kept signed so that out-of-range values survive parsing and can
/// be reported instead of aborting the whole load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartNote {
    pub lane: i32,
    /// Scheduled hit time relative to song start.
    pub time_ms: i64,
}

impl ChartNote {
    pub const fn new(lane: i32, time_ms: i64) -> Self {
        Self { lane, time_ms }
    }

    /// Lane index if it lies within `[0, lane_count)`.
    pub fn lane_index(&self, lane_count: usize) -> Option<usize> {
        usize::try_from(self.lane)
            .ok()
            .filter(|&lane| lane < lane_count)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    /// Song identifier.
    pub song: String,
    pub bpm: f64,
    #[serde(default)]
    pub offset_ms: i64,
    /// Notes in chart order. Not required to be sorted by time.
    pub notes: Vec<ChartNote>,
}

impl Chart {
    pub fn new(song: impl Into<String>, bpm: f64, offset_ms: i64, notes: Vec<ChartNote>) -> Self {
        Self {
            song: song.into(),
            bpm,
            offset_ms,
            notes,
        }
    }

    /// Built-in four lane demo chart.
    pub fn demo() -> Self {
        Self::new(
            "Demo",
            120.0,
            0,
            vec![
                ChartNote::new(0, 1000),
                ChartNote::new(1, 1500),
                ChartNote::new(2, 2000),
                ChartNote::new(3, 2500),
            ],
        )
    }

    pub fn song_id(&self) -> &str {
        &self.song
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Latest scheduled note time, regardless of chart order.
    pub fn last_note_time_ms(&self) -> Option<i64> {
        self.notes.iter().map(|n| n.time_ms).max()
    }

    pub fn validate(&self) -> Result<(), ChartError> {
        if !self.bpm.is_finite() || self.bpm <= 0.0 {
            return Err(ChartError::InvalidBpm(self.bpm));
        }
        Ok(())
    }
}
