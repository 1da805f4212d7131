use crate::dataset::Dataset;
use crate::error::{Result, SummaryError};
use crate::schema::RecordSchema;
use crate::types::{ClassCounts, ClassSummary, FieldSamples, FieldStats, Observation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Records of a dataset split by class label.
///
/// Parts are kept in the order the labels were requested and share the
/// schema of the source dataset. Within a part, records keep their original
/// order.
#[derive(Debug, Clone)]
pub struct ClassPartition {
    schema: RecordSchema,
    parts: Vec<(String, Dataset)>,
}

static_assertions::assert_impl_all!(ClassPartition: Send, Sync);

impl ClassPartition {
    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(label, _)| label.as_str())
    }

    pub fn get(&self, label: &str) -> Option<&Dataset> {
        self.parts
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, part)| part)
    }

    /// The part for `label`, failing when the label was not requested or
    /// the part holds no records.
    pub fn non_empty(&self, label: &str) -> Result<&Dataset> {
        let part = self
            .get(label)
            .ok_or_else(|| SummaryError::UnknownClass(label.to_string()))?;
        if part.is_empty() {
            return Err(SummaryError::EmptyPartition(label.to_string()));
        }
        Ok(part)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Dataset)> {
        self.parts.iter().map(|(label, part)| (label.as_str(), part))
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Number of records across all parts.
    pub fn total_records(&self) -> usize {
        self.parts.iter().map(|(_, part)| part.len()).sum()
    }
}

/// Drop repeated labels, keeping the first occurrence.
fn ordered_set<S: AsRef<str>>(labels: &[S]) -> Vec<&str> {
    let mut seen = HashSet::new();
    labels
        .iter()
        .map(AsRef::as_ref)
        .filter(|label| seen.insert(*label))
        .collect()
}

/// Split `dataset` by the values of its label field.
///
/// `class_labels` is treated as an ordered set. A label that never occurs
/// gets an empty part; records whose label is not requested are left out.
pub fn partition_by_class<S: AsRef<str>>(
    dataset: &Dataset,
    class_labels: &[S],
) -> Result<ClassPartition> {
    let mut parts = Vec::with_capacity(class_labels.len());
    for label in ordered_set(class_labels) {
        let part = dataset.filter_label(label)?;
        debug!("Class '{}': {} records", label, part.len());
        parts.push((label.to_string(), part));
    }

    Ok(ClassPartition {
        schema: dataset.schema().clone(),
        parts,
    })
}

/// Number of records in each part, in partition order.
pub fn count_per_class(partition: &ClassPartition) -> ClassCounts {
    partition
        .iter()
        .map(|(label, part)| (label, part.len()))
        .collect()
}

/// Share of `minority_label` among the records of `labels`.
///
/// Labels without an entry in `counts` count as zero. Fails with
/// [`SummaryError::UnknownClass`] when `minority_label` is not one of
/// `labels`, and with [`SummaryError::DivisionByZero`] when the labels hold
/// no records at all.
pub fn imbalance_ratio<S: AsRef<str>>(
    counts: &ClassCounts,
    minority_label: &str,
    labels: &[S],
) -> Result<f64> {
    let labels = ordered_set(labels);
    if !labels.contains(&minority_label) {
        return Err(SummaryError::UnknownClass(minority_label.to_string()));
    }

    let total: usize = labels
        .iter()
        .map(|label| counts.get(label).unwrap_or(0))
        .sum();
    if total == 0 {
        return Err(SummaryError::DivisionByZero(format!(
            "no records carry any of the labels {:?}",
            labels
        )));
    }

    let minority = counts.get(minority_label).unwrap_or(0);
    Ok(minority as f64 / total as f64)
}

/// Values of a numeric field for one class, in record order.
///
/// Missing values are excluded, so the result is never longer than the
/// class. An empty class, or one where every value is missing, yields an
/// empty vector.
pub fn extract_field_samples(
    partition: &ClassPartition,
    class_label: &str,
    field: &str,
) -> Result<Vec<f64>> {
    partition.schema().numeric_field(field)?;
    let part = partition
        .get(class_label)
        .ok_or_else(|| SummaryError::UnknownClass(class_label.to_string()))?;
    part.present_values(field)
}

/// Count, samples and statistics of `fields` for one class.
pub fn summarize_class<S: AsRef<str>>(
    partition: &ClassPartition,
    class_label: &str,
    fields: &[S],
) -> Result<ClassSummary> {
    for field in fields {
        partition.schema().numeric_field(field.as_ref())?;
    }
    let part = partition
        .get(class_label)
        .ok_or_else(|| SummaryError::UnknownClass(class_label.to_string()))?;

    let mut summaries = Vec::with_capacity(fields.len());
    for field in fields {
        let field = field.as_ref();
        let observations = part.materialize_as_array(field)?;
        let missing = observations.iter().filter(|o| o.is_missing()).count();
        let values: Vec<f64> = observations
            .into_iter()
            .filter_map(Observation::value)
            .collect();
        let stats = FieldStats::from_values(&values);

        summaries.push(FieldSamples {
            field: field.to_string(),
            values,
            missing,
            stats,
        });
    }

    Ok(ClassSummary {
        label: class_label.to_string(),
        count: part.len(),
        fields: summaries,
    })
}

/// Accuracy of always predicting the most common class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub majority_label: String,
    pub accuracy: f64,
}

/// Majority class and its share of all counted records. Ties go to the
/// label listed first.
pub fn baseline_accuracy(counts: &ClassCounts) -> Result<Baseline> {
    let total = counts.total();
    if total == 0 {
        return Err(SummaryError::DivisionByZero(
            "baseline over zero records".to_string(),
        ));
    }

    let mut majority: Option<(&str, usize)> = None;
    for (label, count) in counts.iter() {
        if majority.is_none_or(|(_, best)| count > best) {
            majority = Some((label, count));
        }
    }

    let (label, count) = majority
        .ok_or_else(|| SummaryError::DivisionByZero("no class counts".to_string()))?;
    Ok(Baseline {
        majority_label: label.to_string(),
        accuracy: count as f64 / total as f64,
    })
}
