//! Error types for the DoE engine
//!
//! Every failure carries enough context for the caller to act on it: which
//! call was made too early, which row overflowed the well, which formula
//! failed to fit. Nothing is retried internally.

use thiserror::Error;

use crate::analysis::ModelType;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure classes, used by callers to pick a remediation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing setup or unknown model family; fix the call sequence
    Configuration,
    /// Volume arithmetic exceeded the final well volume
    Capacity,
    /// Numerical failure while fitting a regression
    Fit,
    /// Optimization backend is not available in this build/environment
    BackendUnavailable,
    /// `suggest`/`report` called before `initialize`
    NotInitialized,
    /// Caller-supplied data or parameters were rejected
    Input,
    /// Backend or interchange failure
    Internal,
}

/// DoE engine error types
#[derive(Error, Debug)]
pub enum Error {
    /// An operation that needs data ran before `set_data`
    #[error("No data set: call set_data() before {0}")]
    NoData(&'static str),

    /// An operation that needs a fitted model ran before `fit`
    #[error("No model fitted: call fit() before {0}")]
    NoModel(&'static str),

    /// Unrecognized regression model family
    #[error("Unknown model type: {0}\nExpected one of: linear, interactions, quadratic, purequadratic")]
    InvalidModelType(String),

    /// Reagent volumes in a combination exceed the final volume
    #[error("Capacity exceeded in combination {row}: reagent volumes sum to {required:.3} but the final volume is {final_volume:.3}\nLower the levels or use more concentrated stocks")]
    Capacity {
        /// 1-based combination index
        row: usize,
        /// Sum of reagent volumes for the combination
        required: f64,
        /// Configured final volume
        final_volume: f64,
    },

    /// Regression fit failed numerically
    #[error("Regression fit failed for {model_type} model on {rows} rows: {reason}\nFormula: {formula}")]
    Fit {
        /// Model family that was being fit
        model_type: ModelType,
        /// Rendered model formula
        formula: String,
        /// Number of observations supplied
        rows: usize,
        /// Underlying failure
        reason: String,
    },

    /// Optimization backend is not installed/compiled in
    #[error("Optimization backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Optimization backend failed while computing a suggestion
    #[error("Optimization backend error: {0}")]
    Backend(String),

    /// Ask-tell call before the optimizer was initialized
    #[error("Optimizer not initialized: call initialize() before {0}")]
    NotInitialized(&'static str),

    /// Two factor names sanitize to the same backend identifier
    #[error("Factor names {first:?} and {second:?} both sanitize to {sanitized:?}\nRename one of the factors")]
    NameCollision {
        /// Factor that claimed the identifier first
        first: String,
        /// Factor that collided with it
        second: String,
        /// Shared sanitized identifier
        sanitized: String,
    },

    /// Factor name not present in the set/session
    #[error("Unknown factor: {0}")]
    UnknownFactor(String),

    /// Column missing from a dataset
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Column cannot be coerced to the declared role
    #[error("Column {column} cannot be read as {expected}: {detail}")]
    ColumnType {
        /// Column name
        column: String,
        /// Requested representation
        expected: &'static str,
        /// Offending value or reason
        detail: String,
    },

    /// Session identifier not registered in the store
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Invalid caller input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Arrow interchange error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Configuration could not be parsed
    #[error("Configuration parse error: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    /// Failure class of this error.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::NoData(_) | Self::NoModel(_) | Self::InvalidModelType(_) | Self::Config(_) => {
                ErrorCategory::Configuration
            }
            Self::Capacity { .. } => ErrorCategory::Capacity,
            Self::Fit { .. } => ErrorCategory::Fit,
            Self::BackendUnavailable(_) => ErrorCategory::BackendUnavailable,
            Self::NotInitialized(_) => ErrorCategory::NotInitialized,
            Self::NameCollision { .. }
            | Self::UnknownFactor(_)
            | Self::ColumnNotFound(_)
            | Self::ColumnType { .. }
            | Self::SessionNotFound(_)
            | Self::InvalidInput(_) => ErrorCategory::Input,
            Self::Backend(_) | Self::Arrow(_) => ErrorCategory::Internal,
        }
    }
}
