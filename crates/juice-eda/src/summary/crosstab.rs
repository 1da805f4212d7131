use crate::dataset::Dataset;
use crate::error::Result;
use crate::types::ContingencyTable;
use std::collections::BTreeMap;
use tracing::debug;

/// Contingency table of two fields.
///
/// Values are compared in their string form, so numeric fields can be
/// tabulated too. Rows where either value is missing are skipped, and only
/// pairs that actually occur are stored.
pub fn cross_tabulate(dataset: &Dataset, field_a: &str, field_b: &str) -> Result<ContingencyTable> {
    let values_a = dataset.string_values(field_a)?;
    let values_b = dataset.string_values(field_b)?;

    let mut counts: BTreeMap<(String, String), usize> = BTreeMap::new();
    let mut skipped = 0usize;
    for (a, b) in values_a.into_iter().zip(values_b) {
        match (a, b) {
            (Some(a), Some(b)) => *counts.entry((a, b)).or_insert(0) += 1,
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!(
            "Cross tabulation {} x {}: skipped {} rows with missing values",
            field_a, field_b, skipped
        );
    }

    Ok(ContingencyTable::from_counts(field_a, field_b, counts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::{labels, sample_dataset, small_schema};
    use polars::prelude::*;

    #[test]
    fn test_quality_by_type() {
        let table = cross_tabulate(&sample_dataset(), "quality", "type").unwrap();

        assert!(table.len() <= 4);
        assert!(table.cells().iter().all(|c| c.count > 0));
        assert_eq!(table.get("Good", "navel"), Some(2));
        assert_eq!(table.get("Bad", "valencia"), Some(2));
        assert_eq!(table.get("Bad", "navel"), Some(1));
        assert_eq!(table.get("Good", "valencia"), None);
        assert_eq!(table.total(), 5);
    }

    #[test]
    fn test_missing_values_are_skipped() {
        let df = df![
            "citric_acid" => [0.1, 0.2, 0.3],
            "sugar" => [1.0, 2.0, 3.0],
            "type" => [Some("navel"), None, Some("navel")],
            "quality" => ["Good", "Bad", "Bad"],
        ]
        .unwrap();
        let dataset = Dataset::from_frame(df, small_schema(), &labels()).unwrap();

        let table = cross_tabulate(&dataset, "quality", "type").unwrap();
        assert_eq!(table.total(), 2);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_unknown_field() {
        let err = cross_tabulate(&sample_dataset(), "quality", "colour").unwrap_err();
        assert!(err.is_field_not_found());
    }

    #[test]
    fn test_empty_dataset_gives_empty_table() {
        let table = cross_tabulate(&sample_dataset().empty_like(), "quality", "type").unwrap();
        assert!(table.is_empty());
        assert_eq!(table.to_frame().unwrap().height(), 0);
    }
}
