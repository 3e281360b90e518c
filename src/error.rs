// ============================================================
// Shared Error Type
// ============================================================
// The data and ml layers return PipelineError so callers (and
// tests) can match on what went wrong. The application layer
// wraps these into anyhow::Error with extra context.

use std::path::PathBuf;

/// Result type for loader, scaler and trainer operations
pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Preprocessing method '{0}' is not supported (expected standard_scaler, min_max_scaler or normalization)")]
    UnsupportedPreprocessor(String),

    #[error("Optimizer '{0}' is not supported (expected adam or sgd)")]
    UnsupportedOptimizer(String),

    #[error("Cannot read dataset '{path}': {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Dataset is missing required column '{0}'")]
    MissingColumn(String),

    #[error("Dataset has no access point columns (expected names containing 'AP')")]
    NoAccessPoints,

    #[error("Row {row}, column '{column}': '{value}' is not a number")]
    MalformedValue {
        row:    usize,
        column: String,
        value:  String,
    },

    #[error("No rows found for floor {0}")]
    EmptyFloor(i64),

    #[error("Invalid fraction for {name}: {value} (expected a value in [0, 1])")]
    InvalidFraction { name: &'static str, value: f64 },

    #[error("Invalid hyperparameter: {0}")]
    InvalidHyperparameter(String),

    #[error("Cannot fit a scaler on an empty matrix")]
    EmptyInput,

    #[error("Dimension mismatch: expected {expected} columns, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("The {0} preprocessor does not keep the parameters needed to invert it")]
    NotInvertible(&'static str),

    #[error("Transmit power branch requested but the dataset has no TX power columns")]
    MissingPowerFeatures,

    #[error("Model has not been built; call build() first")]
    ModelNotBuilt,

    #[error("Model has not been trained; call train() first")]
    ModelNotTrained,

    #[error("Tensor conversion failed: {0}")]
    Tensor(String),
}
