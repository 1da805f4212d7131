use crate::profile::calculate_std;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ============================================================================
// Records
// ============================================================================

/// A single numeric measurement that may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Observation {
    Present(f64),
    Missing,
}

impl Observation {
    pub fn value(self) -> Option<f64> {
        match self {
            Observation::Present(v) => Some(v),
            Observation::Missing => None,
        }
    }

    pub fn is_missing(self) -> bool {
        matches!(self, Observation::Missing)
    }
}

impl From<Option<f64>> for Observation {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) if !v.is_nan() => Observation::Present(v),
            _ => Observation::Missing,
        }
    }
}

/// One observation of a dataset, keyed by schema field name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Value of the label field. Never missing in a validated dataset.
    pub label: String,
    /// Categorical fields other than the label.
    pub categorical: BTreeMap<String, Option<String>>,
    /// Numeric measurements.
    pub numeric: BTreeMap<String, Observation>,
}

impl Record {
    /// Numeric value of a field, `Missing` when absent or null.
    pub fn numeric(&self, field: &str) -> Observation {
        self.numeric
            .get(field)
            .copied()
            .unwrap_or(Observation::Missing)
    }
}

// ============================================================================
// Class counts
// ============================================================================

/// Record count of one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCount {
    pub label: String,
    pub count: usize,
}

/// Per-class record counts, in the order the labels were requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCounts {
    entries: Vec<ClassCount>,
}

impl ClassCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a count. A label already present is overwritten in place.
    pub fn insert(&mut self, label: impl Into<String>, count: usize) {
        let label = label.into();
        match self.entries.iter_mut().find(|e| e.label == label) {
            Some(entry) => entry.count = count,
            None => self.entries.push(ClassCount { label, count }),
        }
    }

    pub fn get(&self, label: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.count)
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|e| (e.label.as_str(), e.count))
    }
}

impl<S: Into<String>> FromIterator<(S, usize)> for ClassCounts {
    fn from_iter<I: IntoIterator<Item = (S, usize)>>(iter: I) -> Self {
        let mut counts = ClassCounts::new();
        for (label, count) in iter {
            counts.insert(label, count);
        }
        counts
    }
}

// ============================================================================
// Per-class summaries
// ============================================================================

/// Descriptive statistics of a sequence of present values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1); 0 for fewer than two values.
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl FieldStats {
    /// Statistics of `values`, `None` when empty.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let std = calculate_std(values);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            count: values.len(),
            mean,
            std,
            min,
            max,
        })
    }
}

/// Observed values of one numeric field within one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSamples {
    pub field: String,
    /// Present values in record order; missing values are excluded.
    pub values: Vec<f64>,
    /// Number of records whose value was missing.
    pub missing: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<FieldStats>,
}

/// Read-only summary of one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub label: String,
    pub count: usize,
    pub fields: Vec<FieldSamples>,
}

impl ClassSummary {
    pub fn field(&self, name: &str) -> Option<&FieldSamples> {
        self.fields.iter().find(|f| f.field == name)
    }
}

// ============================================================================
// Contingency table
// ============================================================================

/// Count of one co-occurring value pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContingencyCell {
    pub row: String,
    pub column: String,
    pub count: usize,
}

/// Counts of co-occurring values of two fields.
///
/// Only combinations present in the data are stored; every stored count is
/// positive. Cells are sorted by row value, then column value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContingencyTable {
    pub row_field: String,
    pub column_field: String,
    cells: Vec<ContingencyCell>,
}

impl ContingencyTable {
    pub(crate) fn from_counts(
        row_field: impl Into<String>,
        column_field: impl Into<String>,
        counts: BTreeMap<(String, String), usize>,
    ) -> Self {
        let cells = counts
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|((row, column), count)| ContingencyCell { row, column, count })
            .collect();

        Self {
            row_field: row_field.into(),
            column_field: column_field.into(),
            cells,
        }
    }

    /// Count of a value pair, `None` when the pair never occurs.
    pub fn get(&self, row: &str, column: &str) -> Option<usize> {
        self.cells
            .iter()
            .find(|c| c.row == row && c.column == column)
            .map(|c| c.count)
    }

    pub fn cells(&self) -> &[ContingencyCell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn total(&self) -> usize {
        self.cells.iter().map(|c| c.count).sum()
    }

    pub fn row_values(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.cells.iter().map(|c| c.row.as_str()).collect();
        set.into_iter().collect()
    }

    pub fn column_values(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.cells.iter().map(|c| c.column.as_str()).collect();
        set.into_iter().collect()
    }

    /// Wide rendering for display: one row per row value, one column per
    /// column value. Pairs that never occur are shown as 0 here only.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let rows = self.row_values();
        let columns_values = self.column_values();

        let mut columns: Vec<Column> = Vec::with_capacity(columns_values.len() + 1);
        let mut header = self.row_field.clone();
        while columns_values.contains(&header.as_str()) {
            header.push('_');
        }
        columns.push(Column::new(
            header.into(),
            rows.iter().map(|r| r.to_string()).collect::<Vec<_>>(),
        ));

        for column_value in &columns_values {
            let counts: Vec<u64> = rows
                .iter()
                .map(|row| self.get(row, column_value).unwrap_or(0) as u64)
                .collect();
            columns.push(Column::new((*column_value).into(), counts));
        }

        DataFrame::new(columns)
    }
}
