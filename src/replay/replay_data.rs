use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::chart::Chart;

/// A recorded lane press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PressEvent {
    /// Song time of the press.
    pub time_ms: i64,
    pub lane: usize,
}

impl PressEvent {
    pub const fn new(time_ms: i64, lane: usize) -> Self {
        Self { time_ms, lane }
    }
}

/// Press log for one play of a chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplayData {
    /// Song the presses were recorded against.
    #[serde(default)]
    pub song: String,
    #[serde(default)]
    pub presses: Vec<PressEvent>,
}

impl ReplayData {
    pub fn new(song: impl Into<String>, presses: Vec<PressEvent>) -> Self {
        Self {
            song: song.into(),
            presses,
        }
    }

    /// One press per note at `time_ms + offset_ms`. Notes on negative lanes
    /// have no key to press and are skipped.
    pub fn autoplay(chart: &Chart, offset_ms: i64) -> Self {
        let presses = chart
            .notes
            .iter()
            .filter_map(|note| {
                let lane = usize::try_from(note.lane).ok()?;
                Some(PressEvent::new(note.time_ms.saturating_add(offset_ms), lane))
            })
            .collect();
        Self::new(chart.song.clone(), presses)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read replay: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse replay: {}", path.display()))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write replay: {}", path.display()))
    }
}
