//! Orange Quality Exploratory Analysis Library
//!
//! Class-balance and class-conditional summaries over a table of orange
//! measurements, built with Rust and Polars.
//!
//! # Overview
//!
//! - **Loading**: [`source::TableSource`] reads `<data_dir>/<database>/<table>.csv`
//!   (or `.parquet`) and validates it against a static [`schema::RecordSchema`]
//! - **Class balance**: partition by label, count per class, imbalance ratio
//!   and majority baseline
//! - **Class-conditional samples**: present values of a numeric field for one
//!   class, missing values excluded
//! - **Contingency tables**: co-occurrence counts of two categorical fields
//! - **Profiling**: missing values, near-constant fields and correlations
//! - **Reporting**: everything above as one JSON document
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use juice_eda::{DataSource, RecordSchema, SessionConfig, TableSource};
//! use juice_eda::summary::*;
//!
//! let config = SessionConfig::builder()
//!     .data_dir("warehouse")
//!     .database("apjuice")
//!     .build()?;
//!
//! let source = TableSource::new(&config, RecordSchema::orange())?;
//! let dataset = source.load_table(&config.table)?;
//!
//! let partition = partition_by_class(&dataset, &config.class_labels)?;
//! let counts = count_per_class(&partition);
//! let ratio = imbalance_ratio(&counts, "Bad", &config.class_labels)?;
//! println!("{:.1}% of the juices are bad", ratio * 100.0);
//!
//! let good_citric = extract_field_samples(&partition, "Good", "citric_acid")?;
//! let table = cross_tabulate(&dataset, "quality", "type")?;
//! ```
//!
//! # Missing values
//!
//! Numeric values are read as [`types::Observation`], either `Present(f64)`
//! or `Missing`. Sample extraction and statistics use present values only;
//! cross tabulation skips rows where either field is missing. Labels are
//! never missing: a row without one is rejected at load.

pub mod config;
pub mod dataset;
pub mod display;
pub mod error;
pub mod profile;
pub mod reporting;
pub mod schema;
pub mod source;
pub mod summary;
pub mod types;

// Re-exports for convenient access
pub use config::{ConfigValidationError, SessionConfig, SessionConfigBuilder};
pub use dataset::Dataset;
pub use display::{ConsoleSink, DisplaySink, ScatterData};
pub use error::{Result as SummaryResult, ResultExt, SummaryError};
pub use profile::{CorrelationMatrix, FieldProfile};
pub use reporting::{ReportGenerator, SummaryReport};
pub use schema::{FieldKind, FieldSpec, RecordSchema};
pub use source::{DataSource, TableFormat, TableSource};
pub use summary::{
    Baseline, ClassPartition, baseline_accuracy, count_per_class, cross_tabulate,
    extract_field_samples, imbalance_ratio, partition_by_class,
};
pub use types::{ClassCounts, ContingencyTable, Observation, Record};
