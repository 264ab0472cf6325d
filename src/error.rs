//! Error types shared by the loader, the aggregation stage and the forecaster.

use thiserror::Error;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Failures surfaced to the caller as distinct conditions so the front end
/// can render a specific message for each.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// No valid rows remain after timestamp parsing.
    #[error("no data to analyze")]
    EmptyDataset,

    /// The selected forecast mode needs more daily observations.
    #[error("not enough historical data for forecasting; need at least {needed} days, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Requested horizon is zero or negative.
    #[error("invalid forecast horizon {0}: must be a positive number of days")]
    InvalidHorizon(i64),

    /// A structurally required column is absent from the input.
    #[error("missing required column `{0}`")]
    MissingColumn(String),

    /// A required field is present but not parseable.
    #[error("row {row}: invalid value {value:?} in column `{column}`")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    /// The least-squares solver could not produce coefficients.
    #[error("model fitting error: {0}")]
    Fit(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// Whether the error comes from the data rather than from the environment.
    pub fn is_data_error(&self) -> bool {
        !matches!(self, AnalysisError::Csv(_) | AnalysisError::Io(_))
    }
}
