//! Field profiling.
//!
//! Answers the usual first questions about a freshly loaded table: which
//! fields have missing values, which are (nearly) constant, how the numeric
//! measurements are distributed, and which pairs of measurements move
//! together.

mod statistics;

pub(crate) use statistics::calculate_std;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::schema::FieldKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Standard deviation at or below which a field counts as constant.
pub const NEAR_CONSTANT_STD: f64 = 1e-12;

/// Distribution of a numeric field's present values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericProfile {
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub skewness: f64,
    pub has_outliers: bool,
}

/// Profile of one schema field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldProfile {
    pub name: String,
    pub kind: FieldKind,
    pub missing_count: usize,
    pub missing_percentage: f64,
    pub distinct_count: usize,
    /// Fewer than two present values, or no spread among them.
    pub near_constant: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_frequent: Option<String>,
}

/// Profile every field of the dataset, in schema order.
pub fn profile_fields(dataset: &Dataset) -> Result<Vec<FieldProfile>> {
    let mut profiles = Vec::with_capacity(dataset.schema().len());
    for spec in dataset.schema().fields() {
        profiles.push(profile_field(dataset, &spec.name)?);
    }
    Ok(profiles)
}

/// Profile a single field.
pub fn profile_field(dataset: &Dataset, field: &str) -> Result<FieldProfile> {
    let kind = dataset.schema().field(field)?.kind;
    let values = dataset.string_values(field)?;
    let total = values.len();
    let missing_count = values.iter().filter(|v| v.is_none()).count();
    let missing_percentage = if total > 0 {
        (missing_count as f64 / total as f64) * 100.0
    } else {
        0.0
    };

    let mut frequencies: HashMap<&str, usize> = HashMap::new();
    for value in values.iter().flatten() {
        *frequencies.entry(value.as_str()).or_insert(0) += 1;
    }
    let distinct_count = frequencies.len();

    let (numeric, most_frequent, near_constant) = match kind {
        FieldKind::Numeric => {
            let present = dataset.present_values(field)?;
            let numeric = numeric_profile(&present);
            let near_constant = numeric
                .as_ref()
                .is_none_or(|p| present.len() < 2 || p.std <= NEAR_CONSTANT_STD);
            (numeric, None, near_constant)
        }
        FieldKind::Categorical => {
            // ties go to the alphabetically first value
            let most_frequent = frequencies
                .iter()
                .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
                .map(|(value, _)| value.to_string());
            (None, most_frequent, distinct_count < 2)
        }
    };

    debug!(
        "Profiled '{}': {} missing, {} distinct",
        field, missing_count, distinct_count
    );

    Ok(FieldProfile {
        name: field.to_string(),
        kind,
        missing_count,
        missing_percentage,
        distinct_count,
        near_constant,
        numeric,
        most_frequent,
    })
}

fn numeric_profile(values: &[f64]) -> Option<NumericProfile> {
    if values.is_empty() {
        return None;
    }

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    Some(NumericProfile {
        mean,
        std: statistics::calculate_std(values),
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        skewness: statistics::calculate_skewness(values),
        has_outliers: statistics::detect_outliers(values),
    })
}

/// Pairwise Pearson correlations between numeric fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub fields: Vec<String>,
    /// Row-major, `fields.len()` squared entries. `None` where fewer than two
    /// rows have both values present or either side is constant.
    pub values: Vec<Option<f64>>,
}

/// A correlated pair of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelatedPair {
    pub first: String,
    pub second: String,
    pub coefficient: f64,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.fields.iter().position(|f| f == a)?;
        let j = self.fields.iter().position(|f| f == b)?;
        self.values[i * self.fields.len() + j]
    }

    /// Distinct pairs whose absolute correlation is at least `threshold`,
    /// strongest first.
    pub fn strong_pairs(&self, threshold: f64) -> Vec<CorrelatedPair> {
        let n = self.fields.len();
        let mut pairs = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                if let Some(r) = self.values[i * n + j]
                    && r.abs() >= threshold
                {
                    pairs.push(CorrelatedPair {
                        first: self.fields[i].clone(),
                        second: self.fields[j].clone(),
                        coefficient: r,
                    });
                }
            }
        }
        pairs.sort_by(|a, b| b.coefficient.abs().total_cmp(&a.coefficient.abs()));
        pairs
    }
}

/// Correlation matrix of the named numeric fields, using for each pair only
/// the rows where both values are present.
pub fn correlation_matrix<S: AsRef<str>>(dataset: &Dataset, fields: &[S]) -> Result<CorrelationMatrix> {
    let mut columns = Vec::with_capacity(fields.len());
    for field in fields {
        let observations = dataset.materialize_as_array(field.as_ref())?;
        columns.push(observations);
    }

    let n = fields.len();
    let mut values = vec![None; n * n];
    for i in 0..n {
        for j in i..n {
            let pairs: Vec<(f64, f64)> = columns[i]
                .iter()
                .zip(&columns[j])
                .filter_map(|(a, b)| Some((a.value()?, b.value()?)))
                .collect();
            let r = statistics::pearson(&pairs);
            values[i * n + j] = r;
            values[j * n + i] = r;
        }
    }

    Ok(CorrelationMatrix {
        fields: fields.iter().map(|f| f.as_ref().to_string()).collect(),
        values,
    })
}

/// Correlation matrix over every numeric field of the schema.
pub fn numeric_correlations(dataset: &Dataset) -> Result<CorrelationMatrix> {
    let fields: Vec<String> = dataset
        .schema()
        .numeric_fields()
        .map(|f| f.name.clone())
        .collect();
    correlation_matrix(dataset, &fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::{labels, sample_dataset, small_schema};
    use polars::prelude::*;

    #[test]
    fn test_profile_numeric_field() {
        let profile = profile_field(&sample_dataset(), "citric_acid").unwrap();
        assert_eq!(profile.kind, FieldKind::Numeric);
        assert_eq!(profile.missing_count, 1);
        assert!((profile.missing_percentage - 20.0).abs() < 1e-9);
        assert_eq!(profile.distinct_count, 4);
        assert!(!profile.near_constant);

        let numeric = profile.numeric.unwrap();
        assert_eq!(numeric.min, 0.2);
        assert_eq!(numeric.max, 0.9);
    }

    #[test]
    fn test_profile_categorical_field() {
        let profile = profile_field(&sample_dataset(), "quality").unwrap();
        assert_eq!(profile.kind, FieldKind::Categorical);
        assert_eq!(profile.missing_count, 0);
        assert_eq!(profile.distinct_count, 2);
        assert_eq!(profile.most_frequent.as_deref(), Some("Bad"));
        assert!(profile.numeric.is_none());
    }

    #[test]
    fn test_near_constant_field() {
        let df = df![
            "citric_acid" => [0.5, 0.5, 0.5],
            "sugar" => [Some(1.0), None, None],
            "type" => ["navel", "navel", "navel"],
            "quality" => ["Good", "Bad", "Good"],
        ]
        .unwrap();
        let dataset = Dataset::from_frame(df, small_schema(), &labels()).unwrap();
        let profiles = profile_fields(&dataset).unwrap();

        assert_eq!(profiles.len(), 4);
        assert!(profiles.iter().find(|p| p.name == "citric_acid").unwrap().near_constant);
        assert!(profiles.iter().find(|p| p.name == "sugar").unwrap().near_constant);
        assert!(profiles.iter().find(|p| p.name == "type").unwrap().near_constant);
        assert!(!profiles.iter().find(|p| p.name == "quality").unwrap().near_constant);
    }

    #[test]
    fn test_profile_unknown_field() {
        assert!(
            profile_field(&sample_dataset(), "pulp")
                .unwrap_err()
                .is_field_not_found()
        );
    }

    #[test]
    fn test_correlation_matrix_pairwise_complete() {
        let df = df![
            "citric_acid" => [Some(1.0), Some(2.0), None, Some(4.0)],
            "sugar" => [Some(2.0), Some(4.0), Some(100.0), Some(8.0)],
            "type" => ["navel", "navel", "navel", "navel"],
            "quality" => ["Good", "Bad", "Good", "Bad"],
        ]
        .unwrap();
        let dataset = Dataset::from_frame(df, small_schema(), &labels()).unwrap();
        let matrix = numeric_correlations(&dataset).unwrap();

        assert_eq!(matrix.fields, vec!["citric_acid", "sugar"]);
        // the outlier row is skipped because citric_acid is missing there
        assert!((matrix.get("citric_acid", "sugar").unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(
            matrix.get("sugar", "citric_acid"),
            matrix.get("citric_acid", "sugar")
        );

        let pairs = matrix.strong_pairs(0.9);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].first, "citric_acid");
    }

    #[test]
    fn test_correlation_rejects_categorical() {
        let err = correlation_matrix(&sample_dataset(), &["sugar", "type"]).unwrap_err();
        assert_eq!(err.error_code(), "NOT_NUMERIC");
    }
}
