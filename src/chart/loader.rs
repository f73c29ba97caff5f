use std::path::Path;

use super::{Chart, ChartError};

pub struct ChartLoader;

impl ChartLoader {
    /// Load and validate a JSON chart file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Chart, ChartError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ChartError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let chart = Self::parse(&content)?;
        log::debug!(
            "Loaded chart {} ({} notes) from {}",
            chart.song,
            chart.note_count(),
            path.display()
        );
        Ok(chart)
    }

    pub fn parse(content: &str) -> Result<Chart, ChartError> {
        let chart: Chart = serde_json::from_str(content)?;
        chart.validate()?;
        Ok(chart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CHART_JSON: &str = r#"{
        "song": "Test Song",
        "bpm": 180,
        "offset_ms": -20,
        "notes": [
            {"lane": 0, "time_ms": 1000},
            {"lane": 3, "time_ms": 1250}
        ]
    }"#;

    #[test]
    fn parse_chart_json() {
        let chart = ChartLoader::parse(CHART_JSON).unwrap();
        assert_eq!(chart.song, "Test Song");
        assert!((chart.bpm - 180.0).abs() < f64::EPSILON);
        assert_eq!(chart.offset_ms, -20);
        assert_eq!(chart.notes.len(), 2);
        assert_eq!(chart.notes[1].lane, 3);
        assert_eq!(chart.notes[1].time_ms, 1250);
    }

    #[test]
    fn offset_defaults_to_zero() {
        let chart =
            ChartLoader::parse(r#"{"song": "x", "bpm": 120, "notes": [{"lane": 1, "time_ms": 5}]}"#)
                .unwrap();
        assert_eq!(chart.offset_ms, 0);
    }

    #[test]
    fn parse_rejects_negative_bpm() {
        let err =
            ChartLoader::parse(r#"{"song": "x", "bpm": -1, "notes": []}"#).unwrap_err();
        assert!(matches!(err, ChartError::InvalidBpm(_)));
    }

    #[test]
    fn parse_rejects_malformed_json() {
        let err = ChartLoader::parse("{ not json").unwrap_err();
        assert!(matches!(err, ChartError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CHART_JSON.as_bytes()).unwrap();

        let chart = ChartLoader::load(file.path()).unwrap();
        assert_eq!(chart.song_id(), "Test Song");
    }

    #[test]
    fn load_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let err = ChartLoader::load(&path).unwrap_err();
        match err {
            ChartError::FileRead { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other}"),
        }
    }
}
