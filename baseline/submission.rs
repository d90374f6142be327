use crate::types::RecordingId;
use itertools::Itertools;
use ndarray::ArrayView1;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("Failed to write submission file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Prior probability {index} is {value}; refusing to write a non-finite prediction.")]
    NonFiniteProbability { index: usize, value: f64 },
}

/// Formats the prediction once; every row reuses it.
fn format_probabilities(prior: ArrayView1<f64>) -> Result<String, SubmissionError> {
    let mut buffer = ryu::Buffer::new();
    let mut formatted = Vec::with_capacity(prior.len());
    for (index, &value) in prior.iter().enumerate() {
        if !value.is_finite() {
            return Err(SubmissionError::NonFiniteProbability { index, value });
        }
        formatted.push(buffer.format_finite(value).to_owned());
    }
    Ok(formatted.iter().join(","))
}

/// Writes `id,start,end,p_1,...,p_K` for every unit window of every recording, no header.
/// Returns the number of rows written.
pub fn write_submission<W: Write>(
    writer: &mut W,
    recordings: &[(RecordingId, usize)],
    prior: ArrayView1<f64>,
) -> Result<usize, SubmissionError> {
    let probabilities = format_probabilities(prior)?;
    let io_error = |source: io::Error| SubmissionError::Io {
        path: "<writer>".to_string(),
        source,
    };

    let mut rows = 0;
    for &(id, window_count) in recordings {
        for start in 0..window_count {
            writeln!(writer, "{id},{start},{},{probabilities}", start + 1).map_err(io_error)?;
        }
        rows += window_count;
    }
    writer.flush().map_err(io_error)?;
    Ok(rows)
}

/// Creates (or truncates) `path` and writes the submission into it.
pub fn write_submission_file(
    path: &Path,
    recordings: &[(RecordingId, usize)],
    prior: ArrayView1<f64>,
) -> Result<usize, SubmissionError> {
    let with_path = |source: io::Error| SubmissionError::Io {
        path: path.display().to_string(),
        source,
    };
    let file = File::create(path).map_err(with_path)?;
    let mut writer = BufWriter::new(file);
    let rows = write_submission(&mut writer, recordings, prior).map_err(|err| match err {
        SubmissionError::Io { source, .. } => with_path(source),
        other => other,
    })?;
    log::info!("Wrote {rows} submission rows to '{}'", path.display());
    Ok(rows)
}
