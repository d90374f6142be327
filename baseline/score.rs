use crate::prior::TargetMatrix;
use crate::types::RecordingId;
use ndarray::{Array1, ArrayView1, ArrayView2};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ScoreError {
    #[error(
        "Shape mismatch: target has {target_labels} label columns, prediction has {predicted}, weights have {weights}."
    )]
    ShapeMismatch {
        target_labels: usize,
        predicted: usize,
        weights: usize,
    },
    #[error("Cannot score an empty target matrix.")]
    EmptyTarget,
    #[error("Recording {0} has no complete target rows to score.")]
    NothingToScore(RecordingId),
}

/// Class-weighted Brier score of a constant prediction:
/// `mean over rows of sum over labels of weight * (target - predicted)^2`.
///
/// `target` must already exclude `start`/`end` and rows with missing values. Lower is
/// better; 0 is a perfect prediction.
pub fn brier_score(
    target: ArrayView2<f64>,
    predicted: ArrayView1<f64>,
    weights: ArrayView1<f64>,
) -> Result<f64, ScoreError> {
    if target.ncols() != predicted.len() || target.ncols() != weights.len() {
        return Err(ScoreError::ShapeMismatch {
            target_labels: target.ncols(),
            predicted: predicted.len(),
            weights: weights.len(),
        });
    }

    let residuals = &target - &predicted;
    let per_row = residuals.mapv(|r| r * r).dot(&weights);
    per_row.mean().ok_or(ScoreError::EmptyTarget)
}

/// Per-recording scores of one prediction against every training recording.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreReport {
    pub per_recording: Vec<(RecordingId, f64)>,
    /// Mean of the per-recording scores.
    pub mean: f64,
}

/// Scores `prior` against each recording's complete target rows.
pub fn evaluate_prior<'a, I>(
    targets: I,
    prior: ArrayView1<f64>,
    weights: ArrayView1<f64>,
) -> Result<ScoreReport, ScoreError>
where
    I: IntoIterator<Item = (RecordingId, &'a TargetMatrix)>,
{
    let mut per_recording = Vec::new();
    for (recording, target) in targets {
        let complete = target.complete_rows();
        let score = match brier_score(complete.view(), prior, weights) {
            Err(ScoreError::EmptyTarget) => return Err(ScoreError::NothingToScore(recording)),
            other => other?,
        };
        log::info!("Recording {recording}: Brier score {score:.6}");
        per_recording.push((recording, score));
    }

    let scores = Array1::from_iter(per_recording.iter().map(|&(_, score)| score));
    let mean = scores.mean().ok_or(ScoreError::EmptyTarget)?;
    Ok(ScoreReport {
        per_recording,
        mean,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array2, array};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn perfect_prediction_scores_zero() {
        let target = array![[0.25, 0.75], [0.25, 0.75]];
        let predicted = array![0.25, 0.75];
        let weights = array![1.0, 3.0];
        let score = brier_score(target.view(), predicted.view(), weights.view()).unwrap();
        assert_abs_diff_eq!(score, 0.0, epsilon = 1e-15);
    }

    #[test]
    fn weighted_squared_error_is_averaged_over_rows() {
        let target = array![[1.0, 0.0], [0.0, 1.0]];
        let predicted = array![0.5, 0.5];
        let weights = array![1.0, 2.0];
        // Each row: 1 * 0.25 + 2 * 0.25 = 0.75.
        let score = brier_score(target.view(), predicted.view(), weights.view()).unwrap();
        assert_abs_diff_eq!(score, 0.75, epsilon = 1e-12);
    }

    #[test]
    fn score_is_never_negative() {
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let rows = rng.gen_range(1..12);
            let labels = rng.gen_range(1..8);
            let target = Array2::from_shape_fn((rows, labels), |_| rng.gen_range(0.0..=1.0));
            let predicted = Array1::from_shape_fn(labels, |_| rng.gen_range(0.0..=1.0));
            let weights = Array1::from_shape_fn(labels, |_| rng.gen_range(0.0..3.0));

            let score = brier_score(target.view(), predicted.view(), weights.view()).unwrap();
            assert!(
                score.is_finite() && score >= 0.0,
                "seed {seed}: score {score} for a {rows}x{labels} target"
            );
        }
    }

    #[test]
    fn shape_mismatch_is_reported() {
        let target = array![[1.0, 0.0]];
        let err = brier_score(target.view(), array![0.5].view(), array![1.0, 1.0].view());
        assert_eq!(
            err.unwrap_err(),
            ScoreError::ShapeMismatch {
                target_labels: 2,
                predicted: 1,
                weights: 2,
            }
        );
    }

    #[test]
    fn empty_target_is_an_error() {
        let target = Array2::<f64>::zeros((0, 2));
        let err = brier_score(target.view(), array![0.5, 0.5].view(), array![1.0, 1.0].view());
        assert_eq!(err.unwrap_err(), ScoreError::EmptyTarget);
    }

    #[test]
    fn report_averages_recordings_on_complete_rows() {
        let first = TargetMatrix {
            starts: array![0.0, 1.0],
            ends: array![1.0, 2.0],
            probabilities: array![[1.0, 0.0], [f64::NAN, 0.0]],
        };
        let second = TargetMatrix {
            starts: array![0.0],
            ends: array![1.0],
            probabilities: array![[0.5, 0.5]],
        };
        let prior = array![0.5, 0.5];
        let weights = array![1.0, 1.0];
        let report = evaluate_prior(
            [(RecordingId(1), &first), (RecordingId(2), &second)],
            prior.view(),
            weights.view(),
        )
        .unwrap();

        assert_eq!(report.per_recording.len(), 2);
        assert_eq!(report.per_recording[0].0, RecordingId(1));
        assert_abs_diff_eq!(report.per_recording[0].1, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(report.per_recording[1].1, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(report.mean, 0.25, epsilon = 1e-12);
    }

    #[test]
    fn report_flags_recordings_without_complete_rows() {
        let empty = TargetMatrix {
            starts: array![0.0],
            ends: array![1.0],
            probabilities: array![[f64::NAN, 1.0]],
        };
        let err = evaluate_prior(
            [(RecordingId(3), &empty)],
            array![0.5, 0.5].view(),
            array![1.0, 1.0].view(),
        )
        .unwrap_err();
        assert_eq!(err, ScoreError::NothingToScore(RecordingId(3)));
    }
}
