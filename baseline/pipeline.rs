use crate::aggregate::{AggregateError, active_rows, aggregate_windows, label_samples};
use crate::config::{BaselineConfig, ConfigError, DataLayout};
use crate::metadata::{Metadata, RecordingMeta, load_class_weights};
use crate::prior::{PriorError, TargetMatrix, estimate_prior};
use crate::recording::{Recording, list_recordings};
use crate::score::{ScoreError, ScoreReport, evaluate_prior};
use crate::submission::{SubmissionError, write_submission_file};
use crate::table::DataError;
use crate::types::{RecordingId, Split};
use ndarray::Array1;
use std::path::PathBuf;
use thiserror::Error;

// ========================================================================================
//                          Public API, context & error handling
// ========================================================================================

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Data error: {0}")]
    Data(#[from] DataError),
    #[error("Label aggregation failed for recording {recording}: {source}")]
    Aggregate {
        recording: RecordingId,
        #[source]
        source: AggregateError,
    },
    #[error("Prior estimation failed: {0}")]
    Prior(#[from] PriorError),
    #[error("Scoring failed: {0}")]
    Score(#[from] ScoreError),
    #[error("Submission failed: {0}")]
    Submission(#[from] SubmissionError),
}

/// Per-recording label coverage computed during evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSummary {
    pub id: RecordingId,
    pub windows: usize,
    pub annotation_intervals: usize,
    /// Windows covered by at least one activity annotation.
    pub annotated_windows: usize,
    /// Windows covered by at least one room annotation.
    pub located_windows: usize,
    pub samples: usize,
    /// Acceleration samples covered by at least one activity annotation.
    pub annotated_samples: usize,
}

#[derive(Debug, Clone)]
pub struct EvaluationSummary {
    pub label_names: Vec<String>,
    pub prior: Array1<f64>,
    pub recordings: Vec<RecordingSummary>,
    pub report: ScoreReport,
}

#[derive(Debug, Clone)]
pub struct SubmissionSummary {
    pub path: PathBuf,
    pub label_names: Vec<String>,
    pub prior: Array1<f64>,
    pub recordings: usize,
    pub rows: usize,
}

// ========================================================================================
//                                   Evaluation
// ========================================================================================

/// Loads every configured training recording, aggregates its annotations and room
/// labels per window and per sample, estimates the class prior and scores it against
/// each recording's targets.
pub fn run_evaluation(config: &BaselineConfig) -> Result<EvaluationSummary, PipelineError> {
    config.validate()?;
    let layout = config.layout();
    let metadata = Metadata::load(&layout)?;
    let num_labels = metadata.num_labels();

    let mut summaries = Vec::with_capacity(config.train.len());
    let mut targets: Vec<(RecordingId, TargetMatrix)> = Vec::with_capacity(config.train.len());

    for id in config.train.ids() {
        let recording = Recording::load(&layout, Split::Train, id, &metadata)?;
        summaries.push(summarize_labels(&recording, &metadata)?);

        let target = recording
            .targets
            .ok_or_else(|| DataError::MissingTargets(id.dir_name()))?;
        targets.push((id, target));
    }
    log::info!("Loaded {} training recordings", targets.len());

    let prior = estimate_prior(targets.iter().map(|(id, target)| (*id, target)))?;
    let weights = load_class_weights(&layout, num_labels)?;
    let report = evaluate_prior(
        targets.iter().map(|(id, target)| (*id, target)),
        prior.view(),
        weights.view(),
    )?;
    log::info!(
        "Mean Brier score over {} recordings: {:.6}",
        report.per_recording.len(),
        report.mean
    );

    Ok(EvaluationSummary {
        label_names: metadata.annotation_names,
        prior,
        recordings: summaries,
        report,
    })
}

fn summarize_labels(
    recording: &Recording,
    metadata: &Metadata,
) -> Result<RecordingSummary, PipelineError> {
    let aggregate_error = |source: AggregateError| PipelineError::Aggregate {
        recording: recording.id,
        source,
    };
    let windows = recording.window_count();

    let activity = aggregate_windows(windows, &recording.annotations, metadata.num_labels())
        .map_err(aggregate_error)?;
    let rooms = aggregate_windows(windows, &recording.locations, metadata.num_locations())
        .map_err(aggregate_error)?;
    let samples = label_samples(
        recording.acceleration.times.view(),
        &recording.annotations,
        metadata.num_labels(),
    )
    .map_err(aggregate_error)?;

    let summary = RecordingSummary {
        id: recording.id,
        windows,
        annotation_intervals: recording.annotations.len(),
        annotated_windows: active_rows(activity.view()),
        located_windows: active_rows(rooms.view()),
        samples: recording.acceleration.len(),
        annotated_samples: active_rows(samples.view()),
    };
    log::debug!("{summary:?}");
    Ok(summary)
}

// ========================================================================================
//                                   Submission
// ========================================================================================

fn load_training_targets(
    layout: &DataLayout,
    config: &BaselineConfig,
    metadata: &Metadata,
) -> Result<Vec<(RecordingId, TargetMatrix)>, DataError> {
    config
        .train
        .ids()
        .map(|id| {
            let path = layout.recording_dir(Split::Train, id).join("targets.csv");
            if !path.is_file() {
                return Err(DataError::MissingTargets(id.dir_name()));
            }
            Ok((id, TargetMatrix::load(&path, &metadata.annotation_names)?))
        })
        .collect()
}

/// Estimates the prior from the training targets and writes it as the prediction for
/// every window of every test recording. `output` overrides the configured file name.
pub fn run_submission(
    config: &BaselineConfig,
    output: Option<PathBuf>,
) -> Result<SubmissionSummary, PipelineError> {
    config.validate()?;
    let layout = config.layout();
    let metadata = Metadata::load(&layout)?;

    let targets = load_training_targets(&layout, config, &metadata)?;
    let prior = estimate_prior(targets.iter().map(|(id, target)| (*id, target)))?;

    let test_ids = list_recordings(&layout, Split::Test)?;
    let mut recordings = Vec::with_capacity(test_ids.len());
    for id in test_ids {
        let meta = RecordingMeta::load(&layout.recording_dir(Split::Test, id).join("meta.json"))?;
        recordings.push((id, meta.window_count()));
    }
    log::info!("Found {} test recordings", recordings.len());

    let path = output.unwrap_or_else(|| layout.submission_path(&config.submission_file));
    let rows = write_submission_file(&path, &recordings, prior.view())?;

    Ok(SubmissionSummary {
        path,
        label_names: metadata.annotation_names,
        prior,
        recordings: recordings.len(),
        rows,
    })
}
