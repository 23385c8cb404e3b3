use thiserror::Error;

/// Errors raised by the experiment harness.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("row {row}: expected {expected} columns, found {found}")]
    ColumnCount {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("row {row}, column '{column}': '{value}' is not a number")]
    ParseValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("unknown discretization target '{0}' (expected 'class' or 'n_children')")]
    UnknownTarget(String),

    #[error("unknown classifier '{0}' (expected 'GaussianNB' or 'DecisionTree')")]
    UnknownClassifier(String),

    #[error(
        "unknown estimator '{0}' (expected 'MaximumLikelihoodEstimator' or 'BayesianEstimator')"
    )]
    UnknownEstimator(String),

    #[error("unknown structure score '{0}' (expected 'BicScore', 'K2Score' or 'BDeuScore')")]
    UnknownScore(String),

    #[error("invalid network: {0}")]
    InvalidNetwork(String),

    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("label {0} is not a class label (must be integral)")]
    NonIntegralLabel(f64),

    #[error("empty input: {0}")]
    EmptyInput(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("model is not fitted")]
    NotFitted,
}

pub type Result<T> = std::result::Result<T, HarnessError>;
