use crate::types::{RecordingId, Split};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_DATA_DIR: &str = "public_data";
pub const DEFAULT_SUBMISSION_FILE: &str = "sample_submission.csv";

const ANNOTATIONS_FILE: &str = "annotations.json";
const CLASS_WEIGHTS_FILE: &str = "class_weights.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Training range {first}..={last} is empty; 'first' must not exceed 'last'.")]
    EmptyRange { first: u32, last: u32 },
    #[error("Recording ids start at 1, but the training range begins at 0.")]
    ZeroRecordingId,
}

/// An inclusive range of recording ids, e.g. `first = 1, last = 10` for `00001..=00010`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RecordingRange {
    pub first: u32,
    pub last: u32,
}

impl RecordingRange {
    pub fn new(first: u32, last: u32) -> Result<Self, ConfigError> {
        let range = Self { first, last };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.first == 0 {
            return Err(ConfigError::ZeroRecordingId);
        }
        if self.first > self.last {
            return Err(ConfigError::EmptyRange {
                first: self.first,
                last: self.last,
            });
        }
        Ok(())
    }

    pub fn ids(&self) -> impl Iterator<Item = RecordingId> + use<> {
        (self.first..=self.last).map(RecordingId)
    }

    pub fn len(&self) -> usize {
        if self.first > self.last {
            0
        } else {
            (self.last - self.first) as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RecordingRange {
    fn default() -> Self {
        Self { first: 1, last: 10 }
    }
}

/// Run configuration. Every field has a default so a partial TOML file is enough.
///
/// ```toml
/// data_dir = "public_data"
/// submission_file = "sample_submission.csv"
///
/// [train]
/// first = 1
/// last = 10
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    pub data_dir: PathBuf,
    pub submission_file: String,
    pub train: RecordingRange,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            submission_file: DEFAULT_SUBMISSION_FILE.to_string(),
            train: RecordingRange::default(),
        }
    }
}

impl BaselineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: BaselineConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.train.validate()
    }

    pub fn layout(&self) -> DataLayout {
        DataLayout::new(self.data_dir.clone())
    }
}

/// Resolves every input and output path relative to the data directory.
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn annotations_path(&self) -> PathBuf {
        self.root.join(ANNOTATIONS_FILE)
    }

    pub fn class_weights_path(&self) -> PathBuf {
        self.root.join(CLASS_WEIGHTS_FILE)
    }

    pub fn split_dir(&self, split: Split) -> PathBuf {
        self.root.join(split.dir_name())
    }

    pub fn recording_dir(&self, split: Split, id: RecordingId) -> PathBuf {
        self.split_dir(split).join(id.dir_name())
    }

    pub fn submission_path(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }
}
