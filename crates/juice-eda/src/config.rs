//! Session configuration.
//!
//! Everything a notebook session would keep in implicit global state (the
//! database in use, the table, the label column and its classes) is named
//! explicitly here and handed to the data source.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Default table holding the collected orange measurements.
pub const DEFAULT_TABLE: &str = "phytochemicals_quality";

/// Configuration for one analysis session.
///
/// Use [`SessionConfig::builder()`] to create a validated configuration.
///
/// # Example
///
/// ```rust,ignore
/// use juice_eda::config::SessionConfig;
///
/// let config = SessionConfig::builder()
///     .data_dir("warehouse")
///     .database("apjuice")
///     .class_labels(["Good", "Bad"])
///     .minority_label("Bad")
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Root directory containing one sub-directory per database.
    /// Default: "data"
    pub data_dir: PathBuf,

    /// Database (schema) the session is bound to.
    /// Default: "default"
    pub database: String,

    /// Table to analyse.
    /// Default: "phytochemicals_quality"
    pub table: String,

    /// Categorical field holding the class label.
    /// Default: "quality"
    pub label_field: String,

    /// Ordered set of known class labels.
    /// Default: ["Good", "Bad"]
    pub class_labels: Vec<String>,

    /// Label whose share is reported as the imbalance ratio.
    /// Default: "Bad"
    pub minority_label: String,

    /// Field cross-tabulated against the label field.
    /// Default: Some("type")
    pub crosstab_field: Option<String>,

    /// Numeric fields whose per-class samples are extracted.
    /// Default: ["citric_acid"]
    pub sample_fields: Vec<String>,

    /// Number of equal-width bins for histograms.
    /// Default: 10
    pub histogram_bins: usize,

    /// Rows used by the CSV reader to infer column types.
    /// Default: 100
    pub infer_schema_length: usize,

    /// Output directory for JSON reports.
    /// Default: "output"
    pub output_dir: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            database: "default".to_string(),
            table: DEFAULT_TABLE.to_string(),
            label_field: "quality".to_string(),
            class_labels: vec!["Good".to_string(), "Bad".to_string()],
            minority_label: "Bad".to_string(),
            crosstab_field: Some("type".to_string()),
            sample_fields: vec!["citric_acid".to_string()],
            histogram_bins: 10,
            infer_schema_length: 100,
            output_dir: PathBuf::from("output"),
        }
    }
}

impl SessionConfig {
    /// Create a new configuration builder.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Directory holding the tables of the configured database.
    pub fn database_dir(&self) -> PathBuf {
        self.data_dir.join(&self.database)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.trim().is_empty() {
            return Err(ConfigValidationError::EmptyName("database"));
        }

        if self.table.trim().is_empty() {
            return Err(ConfigValidationError::EmptyName("table"));
        }

        if self.label_field.trim().is_empty() {
            return Err(ConfigValidationError::EmptyName("label_field"));
        }

        if self.class_labels.is_empty() {
            return Err(ConfigValidationError::NoClassLabels);
        }

        let mut seen = HashSet::new();
        for label in &self.class_labels {
            if !seen.insert(label.as_str()) {
                return Err(ConfigValidationError::DuplicateClassLabel(label.clone()));
            }
        }

        if !seen.contains(self.minority_label.as_str()) {
            return Err(ConfigValidationError::UnknownMinorityLabel(
                self.minority_label.clone(),
            ));
        }

        if self.histogram_bins == 0 {
            return Err(ConfigValidationError::InvalidHistogramBins(
                self.histogram_bins,
            ));
        }

        if self.infer_schema_length == 0 {
            return Err(ConfigValidationError::InvalidInferSchemaLength);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("'{0}' must not be empty")]
    EmptyName(&'static str),

    #[error("At least one class label is required")]
    NoClassLabels,

    #[error("Class label '{0}' is listed more than once")]
    DuplicateClassLabel(String),

    #[error("Minority label '{0}' is not one of the class labels")]
    UnknownMinorityLabel(String),

    #[error("Invalid histogram bins: {0} (must be at least 1)")]
    InvalidHistogramBins(usize),

    #[error("infer_schema_length must be at least 1")]
    InvalidInferSchemaLength,
}

impl From<ConfigValidationError> for crate::error::SummaryError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::SummaryError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`SessionConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    data_dir: Option<PathBuf>,
    database: Option<String>,
    table: Option<String>,
    label_field: Option<String>,
    class_labels: Option<Vec<String>>,
    minority_label: Option<String>,
    crosstab_field: Option<Option<String>>,
    sample_fields: Option<Vec<String>>,
    histogram_bins: Option<usize>,
    infer_schema_length: Option<usize>,
    output_dir: Option<PathBuf>,
}

impl SessionConfigBuilder {
    /// Set the root directory containing the databases.
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    /// Bind the session to a database.
    pub fn database(mut self, name: impl Into<String>) -> Self {
        self.database = Some(name.into());
        self
    }

    /// Set the table to analyse.
    pub fn table(mut self, name: impl Into<String>) -> Self {
        self.table = Some(name.into());
        self
    }

    /// Set the categorical field holding the class label.
    pub fn label_field(mut self, field: impl Into<String>) -> Self {
        self.label_field = Some(field.into());
        self
    }

    /// Set the ordered set of class labels.
    pub fn class_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.class_labels = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    /// Set the label whose share is reported as the imbalance ratio.
    pub fn minority_label(mut self, label: impl Into<String>) -> Self {
        self.minority_label = Some(label.into());
        self
    }

    /// Set the field cross-tabulated against the label, or `None` to skip.
    pub fn crosstab_field(mut self, field: Option<impl Into<String>>) -> Self {
        self.crosstab_field = Some(field.map(Into::into));
        self
    }

    /// Set the numeric fields whose per-class samples are extracted.
    pub fn sample_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sample_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Set the number of histogram bins.
    pub fn histogram_bins(mut self, bins: usize) -> Self {
        self.histogram_bins = Some(bins);
        self
    }

    /// Set how many rows the CSV reader inspects to infer types.
    pub fn infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = Some(rows);
        self
    }

    /// Set the output directory for reports.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `SessionConfig` or an error if validation fails.
    pub fn build(self) -> Result<SessionConfig, ConfigValidationError> {
        let defaults = SessionConfig::default();
        let config = SessionConfig {
            data_dir: self.data_dir.unwrap_or(defaults.data_dir),
            database: self.database.unwrap_or(defaults.database),
            table: self.table.unwrap_or(defaults.table),
            label_field: self.label_field.unwrap_or(defaults.label_field),
            class_labels: self.class_labels.unwrap_or(defaults.class_labels),
            minority_label: self.minority_label.unwrap_or(defaults.minority_label),
            crosstab_field: self.crosstab_field.unwrap_or(defaults.crosstab_field),
            sample_fields: self.sample_fields.unwrap_or(defaults.sample_fields),
            histogram_bins: self.histogram_bins.unwrap_or(defaults.histogram_bins),
            infer_schema_length: self
                .infer_schema_length
                .unwrap_or(defaults.infer_schema_length),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
        };

        config.validate()?;
        Ok(config)
    }
}
