//! Error types for dataset loading and class summaries.
//!
//! All summary operations are pure, so errors are surfaced directly to the
//! caller without retries. Errors serialize as `{code, message}` so a report
//! consumer can branch on the code.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the analysis library.
#[derive(Error, Debug)]
pub enum SummaryError {
    /// A referenced field is not part of the record schema or the table.
    #[error("Field '{0}' not found in schema")]
    FieldNotFound(String),

    /// A ratio was requested over an empty denominator.
    #[error("Division by zero: {0}")]
    DivisionByZero(String),

    /// An operation needed at least one record and found none.
    #[error("Partition for class '{0}' is empty")]
    EmptyPartition(String),

    /// A numeric operation was asked for a non-numeric field.
    #[error("Field '{field}' is not numeric (dtype {dtype})")]
    NotNumeric { field: String, dtype: String },

    /// A categorical field holds values that cannot be read as labels.
    #[error("Field '{field}' is not categorical (dtype {dtype})")]
    NotCategorical { field: String, dtype: String },

    /// A class label that is not part of the configured label set.
    #[error("Unknown class label '{0}'")]
    UnknownClass(String),

    /// A row carries a label outside the known class set.
    #[error("Row {row}: label '{value}' is not a known class")]
    InvalidLabel { row: usize, value: String },

    /// A row has no label.
    #[error("Row {row}: label is missing")]
    MissingLabel { row: usize },

    /// The named table does not exist in the session database.
    #[error("Table '{table}' not found in database '{database}'")]
    TableNotFound { table: String, database: String },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<SummaryError>,
    },
}

impl SummaryError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        SummaryError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code, preserved through [`SummaryError::with_context`].
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::FieldNotFound(_) => "FIELD_NOT_FOUND",
            Self::DivisionByZero(_) => "DIVISION_BY_ZERO",
            Self::EmptyPartition(_) => "EMPTY_PARTITION",
            Self::NotNumeric { .. } => "NOT_NUMERIC",
            Self::NotCategorical { .. } => "NOT_CATEGORICAL",
            Self::UnknownClass(_) => "UNKNOWN_CLASS",
            Self::InvalidLabel { .. } => "INVALID_LABEL",
            Self::MissingLabel { .. } => "MISSING_LABEL",
            Self::TableNotFound { .. } => "TABLE_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error was caused by a bad field reference.
    pub fn is_field_not_found(&self) -> bool {
        match self {
            Self::FieldNotFound(_) => true,
            Self::WithContext { source, .. } => source.is_field_not_found(),
            _ => false,
        }
    }

    /// Check if this error rejects the loaded data itself rather than a request.
    pub fn is_data_error(&self) -> bool {
        match self {
            Self::InvalidLabel { .. }
            | Self::MissingLabel { .. }
            | Self::NotNumeric { .. }
            | Self::NotCategorical { .. } => true,
            Self::WithContext { source, .. } => source.is_data_error(),
            _ => false,
        }
    }
}

impl Serialize for SummaryError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("SummaryError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, SummaryError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| SummaryError::Polars(e).with_context(context))
    }
}
