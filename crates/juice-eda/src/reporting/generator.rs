use crate::config::SessionConfig;
use crate::dataset::Dataset;
use crate::error::{Result, ResultExt};
use crate::profile::{
    CorrelatedPair, CorrelationMatrix, FieldProfile, numeric_correlations, profile_fields,
};
use crate::summary::{
    Baseline, baseline_accuracy, count_per_class, cross_tabulate, imbalance_ratio,
    partition_by_class, summarize_class,
};
use crate::types::{ClassCounts, ClassSummary, ContingencyTable};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Absolute correlation from which a pair of fields is flagged.
pub const STRONG_CORRELATION: f64 = 0.8;

// ============================================================================
// Report Types
// ============================================================================

/// Everything the analysis computes for one table.
///
/// Used both for `--json` output on stdout and for the file written with
/// `--emit-report`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    // Metadata
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Database the table was loaded from
    pub database: String,
    /// Table name
    pub table: String,
    /// Number of records
    pub rows: usize,
    /// Number of schema fields
    pub fields: usize,

    // Class balance
    /// Field holding the class label
    pub label_field: String,
    /// Distinct labels in order of first appearance
    pub distinct_labels: Vec<String>,
    /// Records per configured class
    pub class_counts: ClassCounts,
    /// Share of the configured minority label
    pub imbalance: ImbalanceReport,
    /// Accuracy of always predicting the majority class
    pub baseline: Baseline,

    // Class-conditional detail
    /// Label cross-tabulated against the configured field
    pub contingency: Option<ContingencyTable>,
    /// Per-class samples of the configured numeric fields
    pub class_summaries: Vec<ClassSummary>,

    // Profile
    /// Per-field missing values and distribution
    pub field_profiles: Vec<FieldProfile>,
    /// Pearson correlations between numeric fields
    pub correlations: CorrelationMatrix,
    /// Pairs with |r| at or above the strong-correlation threshold
    pub strong_correlations: Vec<CorrelatedPair>,

    /// Notes on things worth a second look
    pub warnings: Vec<String>,
}

/// Imbalance ratio of the configured minority label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImbalanceReport {
    pub minority_label: String,
    pub ratio: f64,
}

// ============================================================================
// Report Generator
// ============================================================================

/// Builds [`SummaryReport`]s and writes them to disk.
pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl ReportGenerator {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    /// Run every summary over `dataset` using the labels and fields named in
    /// `config`. Errors are not suppressed: an empty table fails the
    /// imbalance computation and therefore the whole report.
    pub fn build_report(dataset: &Dataset, config: &SessionConfig) -> Result<SummaryReport> {
        let label_field = dataset.label_field().to_string();
        let distinct_labels = dataset.distinct_values(&label_field)?;

        let partition = partition_by_class(dataset, &config.class_labels)?;
        let class_counts = count_per_class(&partition);
        let ratio = imbalance_ratio(&class_counts, &config.minority_label, &config.class_labels)
            .context("Computing class imbalance")?;
        let baseline = baseline_accuracy(&class_counts)?;
        debug!(
            "Imbalance of '{}': {:.3}, baseline '{}' {:.3}",
            config.minority_label, ratio, baseline.majority_label, baseline.accuracy
        );

        let contingency = match &config.crosstab_field {
            Some(field) => Some(
                cross_tabulate(dataset, &label_field, field).context("Cross tabulation")?,
            ),
            None => None,
        };

        let mut class_summaries = Vec::with_capacity(partition.len());
        for label in partition.labels() {
            class_summaries.push(summarize_class(&partition, label, &config.sample_fields)?);
        }

        let field_profiles = profile_fields(dataset)?;
        let correlations = numeric_correlations(dataset)?;
        let strong_correlations = correlations.strong_pairs(STRONG_CORRELATION);

        let warnings = collect_warnings(&class_counts, &field_profiles, &strong_correlations);
        for warning in &warnings {
            warn!("{}", warning);
        }

        Ok(SummaryReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            database: config.database.clone(),
            table: config.table.clone(),
            rows: dataset.len(),
            fields: dataset.schema().len(),
            label_field,
            distinct_labels,
            class_counts,
            imbalance: ImbalanceReport {
                minority_label: config.minority_label.clone(),
                ratio,
            },
            baseline,
            contingency,
            class_summaries,
            field_profiles,
            correlations,
            strong_correlations,
            warnings,
        })
    }

    /// Write `report` as pretty JSON to `<output_dir>/<base_name>_report.json`.
    pub fn write_report_to_file(&self, report: &SummaryReport, base_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self.output_dir.join(format!("{}_report.json", base_name));
        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());

        Ok(report_path)
    }
}

fn collect_warnings(
    counts: &ClassCounts,
    profiles: &[FieldProfile],
    strong: &[CorrelatedPair],
) -> Vec<String> {
    let mut warnings = Vec::new();

    for (label, count) in counts.iter() {
        if count == 0 {
            warnings.push(format!("Class '{}' has no records", label));
        }
    }

    for profile in profiles {
        if profile.missing_count > 0 {
            warnings.push(format!(
                "Field '{}' has {} missing values ({:.1}%)",
                profile.name, profile.missing_count, profile.missing_percentage
            ));
        }
        if profile.near_constant {
            warnings.push(format!("Field '{}' is (nearly) constant", profile.name));
        }
    }

    for pair in strong {
        warnings.push(format!(
            "Fields '{}' and '{}' are strongly correlated (r = {:.2})",
            pair.first, pair.second, pair.coefficient
        ));
    }

    warnings
}
