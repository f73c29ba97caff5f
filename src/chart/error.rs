use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("Failed to read chart file: {}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse chart: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid BPM: {0} (must be a positive number)")]
    InvalidBpm(f64),
}
