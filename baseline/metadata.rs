use crate::config::DataLayout;
use crate::table::{DataError, read_json};
use ndarray::Array1;
use serde::Deserialize;
use std::path::Path;

/// The rooms a location annotator can report, in column order.
pub const LOCATION_NAMES: [&str; 9] = [
    "bath", "bed1", "bed2", "hall", "kitchen", "living", "stairs", "study", "toilet",
];

/// Label vocabularies shared by every recording.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    /// Activity labels; position is the column index into counts and probabilities.
    pub annotation_names: Vec<String>,
    pub location_names: Vec<String>,
}

impl Metadata {
    pub fn load(layout: &DataLayout) -> Result<Self, DataError> {
        let annotation_names: Vec<String> = read_json(&layout.annotations_path())?;
        log::info!("Loaded {} annotation labels", annotation_names.len());
        Ok(Self::new(annotation_names))
    }

    pub fn new(annotation_names: Vec<String>) -> Self {
        Self {
            annotation_names,
            location_names: LOCATION_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn num_labels(&self) -> usize {
        self.annotation_names.len()
    }

    pub fn num_locations(&self) -> usize {
        self.location_names.len()
    }

    pub fn location_index(&self, name: &str) -> Option<usize> {
        self.location_names.iter().position(|room| room == name)
    }
}

/// Loads one scoring weight per annotation label.
pub fn load_class_weights(layout: &DataLayout, num_labels: usize) -> Result<Array1<f64>, DataError> {
    let weights: Vec<f64> = read_json(&layout.class_weights_path())?;
    validate_class_weights(&weights, num_labels)?;
    Ok(Array1::from_vec(weights))
}

fn validate_class_weights(weights: &[f64], num_labels: usize) -> Result<(), DataError> {
    if weights.len() != num_labels {
        return Err(DataError::ClassWeightCount {
            expected: num_labels,
            found: weights.len(),
        });
    }
    for (index, &value) in weights.iter().enumerate() {
        if !value.is_finite() || value < 0.0 {
            return Err(DataError::InvalidClassWeight { index, value });
        }
    }
    Ok(())
}

/// Contents of a recording's `meta.json`; only the duration is used.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RecordingMeta {
    pub end: f64,
}

impl RecordingMeta {
    pub fn load(path: &Path) -> Result<Self, DataError> {
        read_json(path)
    }

    /// Number of unit windows `[s, s + 1)` covering `[0, end)`.
    pub fn window_count(&self) -> usize {
        if self.end.is_finite() && self.end > 0.0 {
            self.end.ceil() as usize
        } else {
            0
        }
    }
}
