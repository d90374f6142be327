use crate::table::{DataError, nullable_numeric_column, read_csv};
use crate::types::RecordingId;
use ndarray::{Array1, Array2, Axis};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum PriorError {
    #[error("No training recordings were provided; the class prior is undefined.")]
    NoRecordings,
    #[error("Training recording {0} has no complete target rows.")]
    EmptyRecording(RecordingId),
    #[error("Recording {recording} has {found} label columns, but {expected} were expected.")]
    LabelCountMismatch {
        recording: RecordingId,
        expected: usize,
        found: usize,
    },
    #[error("Summed class probabilities total {0}; cannot normalize to a distribution.")]
    DegenerateMass(f64),
}

/// Ground truth for one training recording: a row per window, a column per label.
/// Missing cells are NaN.
#[derive(Debug, Clone)]
pub struct TargetMatrix {
    pub starts: Array1<f64>,
    pub ends: Array1<f64>,
    /// Shape: [n_windows, n_labels], columns in annotation-name order.
    pub probabilities: Array2<f64>,
}

impl TargetMatrix {
    /// Reads `targets.csv`, picking label columns by name in `label_names` order.
    pub fn load(path: &Path, label_names: &[String]) -> Result<Self, DataError> {
        let df = read_csv(path)?;
        let n_rows = df.height();

        let to_array = |values: Vec<Option<f64>>| {
            Array1::from_iter(values.into_iter().map(|v| v.unwrap_or(f64::NAN)))
        };
        let starts = to_array(nullable_numeric_column(&df, "start")?);
        let ends = to_array(nullable_numeric_column(&df, "end")?);

        let mut probabilities = Array2::<f64>::from_elem((n_rows, label_names.len()), f64::NAN);
        for (j, name) in label_names.iter().enumerate() {
            let column = nullable_numeric_column(&df, name)?;
            for (i, value) in column.into_iter().enumerate() {
                if let Some(v) = value {
                    probabilities[[i, j]] = v;
                }
            }
        }

        Ok(Self {
            starts,
            ends,
            probabilities,
        })
    }

    pub fn num_rows(&self) -> usize {
        self.probabilities.nrows()
    }

    pub fn num_labels(&self) -> usize {
        self.probabilities.ncols()
    }

    /// Indices of rows where start, end and every label are observed.
    pub fn complete_row_indices(&self) -> Vec<usize> {
        (0..self.num_rows())
            .filter(|&i| {
                !self.starts[i].is_nan()
                    && !self.ends[i].is_nan()
                    && self.probabilities.row(i).iter().all(|v| !v.is_nan())
            })
            .collect()
    }

    /// The label columns of the complete rows only.
    pub fn complete_rows(&self) -> Array2<f64> {
        self.probabilities
            .select(Axis(0), &self.complete_row_indices())
    }
}

/// Estimates the class-marginal prior from training targets.
///
/// Each recording contributes the per-label mean of its complete rows; contributions are
/// summed without weighting by recording length and the sum is normalized to 1.
pub fn estimate_prior<'a, I>(targets: I) -> Result<Array1<f64>, PriorError>
where
    I: IntoIterator<Item = (RecordingId, &'a TargetMatrix)>,
{
    let mut summed: Option<Array1<f64>> = None;

    for (recording, target) in targets {
        let complete = target.complete_rows();
        let means = complete
            .mean_axis(Axis(0))
            .ok_or(PriorError::EmptyRecording(recording))?;

        log::debug!(
            "Recording {recording}: {} of {} target rows complete",
            complete.nrows(),
            target.num_rows()
        );

        summed = Some(match summed.take() {
            None => means,
            Some(total) if total.len() == means.len() => total + &means,
            Some(total) => {
                return Err(PriorError::LabelCountMismatch {
                    recording,
                    expected: total.len(),
                    found: means.len(),
                });
            }
        });
    }

    let mut prior = summed.ok_or(PriorError::NoRecordings)?;
    let mass = prior.sum();
    if !mass.is_finite() || mass <= 0.0 {
        return Err(PriorError::DegenerateMass(mass));
    }
    prior /= mass;
    Ok(prior)
}
