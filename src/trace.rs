//! Per-frame label traces
//!
//! A trace is a CSV file with one header row naming the label fields and one
//! row per video frame.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim};
use tracing::{debug, warn};

use crate::labels::Predicates;
use crate::{PoseGenError, Result};

/// Source of frame labels consulted when selecting a rule
pub trait LabelSource {
    /// Number of frames in the source.
    fn num_datapoints(&self) -> usize;

    /// Whether every predicate holds for `frame`.
    fn labels_match(&self, frame: usize, predicates: &Predicates) -> bool;
}

/// CSV-backed label trace held in memory
#[derive(Debug, Clone, Default)]
pub struct LabelTrace {
    columns: BTreeMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl LabelTrace {
    /// Load a trace from a CSV file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let load_err = |source| PoseGenError::TraceLoad {
            path: path.to_path_buf(),
            source,
        };

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .from_path(path)
            .map_err(load_err)?;
        let trace = Self::read_csv(reader).map_err(load_err)?;

        debug!(
            path = %path.display(),
            frames = trace.rows.len(),
            fields = trace.columns.len(),
            "loaded label trace"
        );
        Ok(trace)
    }

    /// Load a trace from any CSV reader, e.g. an in-memory buffer.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
        let reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
        Self::read_csv(reader).map_err(|source| PoseGenError::TraceLoad {
            path: PathBuf::from("<reader>"),
            source,
        })
    }

    fn read_csv<R: io::Read>(mut reader: csv::Reader<R>) -> csv::Result<Self> {
        let mut columns = BTreeMap::new();
        for (idx, name) in reader.headers()?.iter().enumerate() {
            if columns.contains_key(name) {
                warn!(field = name, "duplicate label column, keeping the first");
                continue;
            }
            columns.insert(name.to_string(), idx);
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { columns, rows })
    }

    /// Label value of `field` at `frame`, if both exist.
    pub fn value(&self, frame: usize, field: &str) -> Option<&str> {
        let column = *self.columns.get(field)?;
        self.rows.get(frame)?.get(column).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}

impl LabelSource for LabelTrace {
    fn num_datapoints(&self) -> usize {
        self.rows.len()
    }

    fn labels_match(&self, frame: usize, predicates: &Predicates) -> bool {
        if frame >= self.rows.len() {
            return false;
        }
        predicates
            .iter()
            .all(|(field, expected)| self.value(frame, field) == Some(expected.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::parse_label_string;

    const TRACE: &str = "\
frame,road_type,user_label,speed
0, highway, stable, 31.2
1,highway,stable,30.8
2,local,stable,12.0
";

    #[test]
    fn reads_rows_and_trims_cells() {
        let trace = LabelTrace::from_reader(TRACE.as_bytes()).unwrap();
        assert_eq!(trace.num_datapoints(), 3);
        assert_eq!(trace.value(0, "road_type"), Some("highway"));
        assert_eq!(trace.value(2, "speed"), Some("12.0"));
        assert_eq!(trace.value(3, "speed"), None);
        assert_eq!(trace.value(0, "weather"), None);
    }

    #[test]
    fn all_predicates_must_hold() {
        let trace = LabelTrace::from_reader(TRACE.as_bytes()).unwrap();
        let highway = parse_label_string("road_type=highway user_label=stable").unwrap();
        let local = parse_label_string("road_type=local").unwrap();

        assert!(trace.labels_match(0, &highway));
        assert!(trace.labels_match(1, &highway));
        assert!(!trace.labels_match(2, &highway));
        assert!(trace.labels_match(2, &local));
    }

    #[test]
    fn unknown_fields_and_frames_never_match() {
        let trace = LabelTrace::from_reader(TRACE.as_bytes()).unwrap();
        let weather = parse_label_string("weather=rain").unwrap();
        assert!(!trace.labels_match(0, &weather));
        assert!(!trace.labels_match(99, &Predicates::new()));
    }

    #[test]
    fn empty_predicates_match_every_frame() {
        let trace = LabelTrace::from_reader(TRACE.as_bytes()).unwrap();
        assert!((0..3).all(|frame| trace.labels_match(frame, &Predicates::new())));
    }

    #[test]
    fn ragged_rows_fail_to_load() {
        let err = LabelTrace::from_reader("a,b\n1,2\n3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, PoseGenError::TraceLoad { .. }));
    }

    #[test]
    fn missing_file_fails_to_load() {
        let err = LabelTrace::from_path("/nonexistent/labels.csv").unwrap_err();
        match err {
            PoseGenError::TraceLoad { path, .. } => {
                assert_eq!(path, PathBuf::from("/nonexistent/labels.csv"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
