use crate::aggregate::{Interval, IntervalTrack};
use crate::config::DataLayout;
use crate::metadata::{Metadata, RecordingMeta};
use crate::prior::TargetMatrix;
use crate::table::{
    DataError, column_names, index_column, nullable_numeric_column, numeric_column, read_csv,
    text_column,
};
use crate::types::{RecordingId, Split};
use ndarray::{Array1, Array2};
use std::fs;
use std::path::{Path, PathBuf};

/// Annotator files are numbered from zero; the public data has at most two per kind.
const MAX_ANNOTATORS: usize = 2;

const TIME_COLUMN: &str = "t";

/// Wrist-worn accelerometer stream (plus any per-sample RSSI channels).
#[derive(Debug, Clone)]
pub struct AccelerationSeries {
    pub times: Array1<f64>,
    /// Every non-time column, in file order.
    pub channels: Vec<String>,
    /// Shape: [n_samples, n_channels]. Missing readings are 0.
    pub values: Array2<f64>,
}

impl AccelerationSeries {
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let df = read_csv(path)?;
        let times = Array1::from_vec(numeric_column(&df, TIME_COLUMN)?);
        let channels: Vec<String> = column_names(&df)
            .into_iter()
            .filter(|name| name != TIME_COLUMN)
            .collect();

        let mut values = Array2::<f64>::zeros((times.len(), channels.len()));
        for (j, name) in channels.iter().enumerate() {
            for (i, value) in nullable_numeric_column(&df, name)?.into_iter().enumerate() {
                values[[i, j]] = value.unwrap_or(0.0);
            }
        }

        Ok(Self {
            times,
            channels,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

/// Everything on disk for one recording session.
#[derive(Debug, Clone)]
pub struct Recording {
    pub id: RecordingId,
    pub meta: RecordingMeta,
    pub acceleration: AccelerationSeries,
    pub annotations: IntervalTrack,
    pub locations: IntervalTrack,
    /// Present for training recordings only.
    pub targets: Option<TargetMatrix>,
}

impl Recording {
    pub fn load(
        layout: &DataLayout,
        split: Split,
        id: RecordingId,
        metadata: &Metadata,
    ) -> Result<Self, DataError> {
        let dir = layout.recording_dir(split, id);
        log::debug!("Loading {split} recording {id} from '{}'", dir.display());

        let meta = RecordingMeta::load(&dir.join("meta.json"))?;
        let acceleration = AccelerationSeries::load(&dir.join("acceleration.csv"))?;
        let annotations = load_annotations(&dir)?;
        let locations = load_locations(&dir, metadata)?;

        let targets_path = dir.join("targets.csv");
        let targets = if targets_path.is_file() {
            Some(TargetMatrix::load(&targets_path, &metadata.annotation_names)?)
        } else {
            None
        };

        if annotations.is_empty() && split == Split::Train {
            log::warn!("Training recording {id} has no annotation files");
        }

        Ok(Self {
            id,
            meta,
            acceleration,
            annotations,
            locations,
            targets,
        })
    }

    pub fn window_count(&self) -> usize {
        self.meta.window_count()
    }
}

fn annotator_files(dir: &Path, prefix: &str) -> Vec<PathBuf> {
    (0..MAX_ANNOTATORS)
        .map(|i| dir.join(format!("{prefix}_{i}.csv")))
        .filter(|path| path.is_file())
        .collect()
}

/// Reads every `annotations_<n>.csv` in the directory (columns `start, end, index`) into
/// one sorted track.
pub fn load_annotations(dir: &Path) -> Result<IntervalTrack, DataError> {
    let mut files = Vec::new();
    for path in annotator_files(dir, "annotations") {
        let df = read_csv(&path)?;
        let starts = numeric_column(&df, "start")?;
        let ends = numeric_column(&df, "end")?;
        let labels = index_column(&df, "index")?;
        files.push(
            starts
                .into_iter()
                .zip(ends)
                .zip(labels)
                .map(|((start, end), label)| Interval { start, end, label })
                .collect::<Vec<_>>(),
        );
    }
    Ok(IntervalTrack::merge(files))
}

/// Reads every `location_<n>.csv` in the directory (columns `start, end, name`) into one
/// sorted track, labelling each interval with its room index.
pub fn load_locations(dir: &Path, metadata: &Metadata) -> Result<IntervalTrack, DataError> {
    let mut files = Vec::new();
    for path in annotator_files(dir, "location") {
        let df = read_csv(&path)?;
        let starts = numeric_column(&df, "start")?;
        let ends = numeric_column(&df, "end")?;
        let names = text_column(&df, "name")?;

        let mut intervals = Vec::with_capacity(names.len());
        for ((start, end), name) in starts.into_iter().zip(ends).zip(names) {
            let label = metadata
                .location_index(&name)
                .ok_or_else(|| DataError::UnknownLocation {
                    name: name.clone(),
                    path: path.display().to_string(),
                })?;
            intervals.push(Interval { start, end, label });
        }
        files.push(intervals);
    }
    Ok(IntervalTrack::merge(files))
}

/// Lists the recordings of a split: directory names sorted lexicographically, skipping
/// dot-prefixed entries and plain files.
pub fn list_recordings(layout: &DataLayout, split: Split) -> Result<Vec<RecordingId>, DataError> {
    let split_dir = layout.split_dir(split);
    let entries = fs::read_dir(&split_dir).map_err(|source| DataError::Io {
        path: split_dir.display().to_string(),
        source,
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| DataError::Io {
            path: split_dir.display().to_string(),
            source,
        })?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || !entry.path().is_dir() {
            continue;
        }
        names.push(name);
    }
    names.sort();

    names
        .into_iter()
        .map(|name| {
            name.parse::<u32>()
                .map(RecordingId)
                .map_err(|_| DataError::InvalidRecordingId(name))
        })
        .collect()
}
