//! Report generation module.
//!
//! A [`SummaryReport`] gathers the class balance, per-class samples,
//! contingency table and field profile of one table. It serves:
//! - JSON output to stdout (`--json` CLI flag)
//! - JSON file output (`--emit-report` CLI flag)
//! - Programmatic access in library mode
//!
//! # Example
//!
//! ```rust,ignore
//! use juice_eda::reporting::ReportGenerator;
//!
//! let report = ReportGenerator::build_report(&dataset, &config)?;
//! println!("{}", serde_json::to_string_pretty(&report)?);
//!
//! let generator = ReportGenerator::new(PathBuf::from("output"));
//! generator.write_report_to_file(&report, "phytochemicals_quality")?;
//! ```

mod generator;

pub use generator::{ImbalanceReport, ReportGenerator, STRONG_CORRELATION, SummaryReport};
