//! # Tabular Input Module
//!
//! Every CSV input of a recording (acceleration, annotations, locations, targets) is read
//! wholesale into a `polars` `DataFrame` and then converted column by column into plain
//! vectors. Recordings are small, so there is no streaming: the table lives in memory for
//! exactly as long as it takes to pull the required columns out of it.
//!
//! - Files are comma-separated with a header row.
//! - Schema inference scans the whole file, so a probability column whose first rows
//!   happen to be integral is still read as floating point.
//! - Empty cells become nulls. Extractors decide whether a null is an error or a
//!   missing observation.

use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

/// A comprehensive error type for every failure while reading the public data files.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Error from the underlying Polars DataFrame library: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Could not open '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not parse JSON file '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("The required column '{0}' was not found in the input file.")]
    ColumnNotFound(String),
    #[error(
        "The column '{column_name}' could not be converted to the expected type '{expected_type}'. (Found type: {found_type})"
    )]
    ColumnWrongType {
        column_name: String,
        expected_type: &'static str,
        found_type: String,
    },
    #[error("Missing or null values were found in the required column '{0}'.")]
    MissingValuesFound(String),
    #[error("Recording directory name '{0}' is not an integer recording id.")]
    InvalidRecordingId(String),
    #[error("Location '{name}' in '{path}' is not one of the known rooms.")]
    UnknownLocation { name: String, path: String },
    #[error("Training recording {0} has no targets.csv.")]
    MissingTargets(String),
    #[error("Expected {expected} class weights (one per annotation), found {found}.")]
    ClassWeightCount { expected: usize, found: usize },
    #[error("Class weight {index} is {value}; weights must be finite and non-negative.")]
    InvalidClassWeight { index: usize, value: f64 },
}

/// Reads a comma-separated file with a header row into memory.
pub fn read_csv(path: &Path) -> Result<DataFrame, DataError> {
    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let df = CsvReader::new(file)
        .with_options(
            CsvReadOptions::default()
                .with_has_header(true)
                .with_infer_schema_length(None),
        )
        .finish()?;

    log::trace!(
        "Read {} rows x {} columns from '{}'",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

/// Reads and deserializes a JSON file.
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, DataError> {
    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_reader(std::io::BufReader::new(file)).map_err(|source| DataError::Json {
        path: path.display().to_string(),
        source,
    })
}

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

fn column<'a>(df: &'a DataFrame, column_name: &str) -> Result<&'a Column, DataError> {
    df.column(column_name)
        .map_err(|_| DataError::ColumnNotFound(column_name.to_string()))
}

fn cast_to_f64(series: &Column, column_name: &str) -> Result<Column, DataError> {
    let casted = series
        .cast(&DataType::Float64)
        .map_err(|_| DataError::ColumnWrongType {
            column_name: column_name.to_string(),
            expected_type: "f64 (numeric)",
            found_type: format!("{:?}", series.dtype()),
        })?;

    // A non-strict cast turns unparseable text into nulls; more nulls than before means
    // the column held non-numeric data.
    if casted.null_count() > series.null_count() {
        return Err(DataError::ColumnWrongType {
            column_name: column_name.to_string(),
            expected_type: "f64 (numeric)",
            found_type: format!("{:?}", series.dtype()),
        });
    }
    Ok(casted)
}

/// Extracts a numeric column that must be complete.
pub fn numeric_column(df: &DataFrame, column_name: &str) -> Result<Vec<f64>, DataError> {
    let series = column(df, column_name)?;
    if series.null_count() > 0 {
        return Err(DataError::MissingValuesFound(column_name.to_string()));
    }
    let casted = cast_to_f64(series, column_name)?;
    let values = casted.f64()?;
    let values: Vec<f64> = values.into_no_null_iter().collect();
    if values.iter().any(|v| v.is_nan()) {
        return Err(DataError::MissingValuesFound(column_name.to_string()));
    }
    Ok(values)
}

/// Extracts a numeric column where nulls and NaN both mean "not observed".
pub fn nullable_numeric_column(
    df: &DataFrame,
    column_name: &str,
) -> Result<Vec<Option<f64>>, DataError> {
    let series = column(df, column_name)?;
    let casted = cast_to_f64(series, column_name)?;
    let values = casted.f64()?;
    Ok(values
        .into_iter()
        .map(|value| value.filter(|v| !v.is_nan()))
        .collect())
}

/// Extracts a complete column of non-negative integers, e.g. a label index.
pub fn index_column(df: &DataFrame, column_name: &str) -> Result<Vec<usize>, DataError> {
    let series = column(df, column_name)?;
    if series.null_count() > 0 {
        return Err(DataError::MissingValuesFound(column_name.to_string()));
    }
    let dtype = series.dtype().clone();
    // Casting a float to Int64 truncates, so fractional labels must be caught first.
    if dtype.is_float() {
        let floats = cast_to_f64(series, column_name)?;
        if let Some(value) = floats.f64()?.into_no_null_iter().find(|v| v.fract() != 0.0) {
            return Err(DataError::ColumnWrongType {
                column_name: column_name.to_string(),
                expected_type: "non-negative integer",
                found_type: format!("fractional value {value}"),
            });
        }
    }
    let casted = series
        .cast(&DataType::Int64)
        .map_err(|_| DataError::ColumnWrongType {
            column_name: column_name.to_string(),
            expected_type: "non-negative integer",
            found_type: dtype.to_string(),
        })?;
    if casted.null_count() > 0 {
        return Err(DataError::ColumnWrongType {
            column_name: column_name.to_string(),
            expected_type: "non-negative integer",
            found_type: dtype.to_string(),
        });
    }

    let values = casted.i64()?;
    let mut result = Vec::with_capacity(values.len());
    for value in values.into_no_null_iter() {
        if value < 0 {
            return Err(DataError::ColumnWrongType {
                column_name: column_name.to_string(),
                expected_type: "non-negative integer",
                found_type: format!("negative value {value}"),
            });
        }
        result.push(value as usize);
    }
    Ok(result)
}

/// Extracts a complete text column.
pub fn text_column(df: &DataFrame, column_name: &str) -> Result<Vec<String>, DataError> {
    let series = column(df, column_name)?;
    if series.null_count() > 0 {
        return Err(DataError::MissingValuesFound(column_name.to_string()));
    }
    let casted = series.cast(&DataType::String)?;
    let values = casted.str()?;
    Ok(values
        .into_no_null_iter()
        .map(|value| value.to_string())
        .collect())
}
