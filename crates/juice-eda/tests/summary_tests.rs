//! Integration tests for loading and summarizing the orange quality table.
//!
//! The fixture database `tests/fixtures/apjuice` holds 20 records: 16 Bad
//! and 4 Good, one Good record without citric_acid and one Bad record
//! without sugar.

use juice_eda::summary::{
    baseline_accuracy, count_per_class, cross_tabulate, extract_field_samples, imbalance_ratio,
    partition_by_class, summarize_class,
};
use juice_eda::{
    DataSource, Dataset, RecordSchema, ReportGenerator, SessionConfig, SummaryError, TableSource,
};
use polars::prelude::*;
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::PathBuf;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn config() -> SessionConfig {
    SessionConfig::builder()
        .data_dir(fixtures_path())
        .database("apjuice")
        .build()
        .unwrap()
}

fn load_oranges() -> Dataset {
    TableSource::new(&config(), RecordSchema::orange())
        .unwrap()
        .load_table("phytochemicals_quality")
        .unwrap()
}

const HEADER: &str = "acidity,enzymes,citric_acid,sugar,chlorides,octyl_acetate,sulfur_dioxide,vitamin_c,type,quality";

/// Load `body` (rows after the header) through a fresh `apjuice` database.
fn load_csv_table(name: &str, body: &str) -> Dataset {
    let data_dir = std::env::temp_dir().join("juice_eda_csv_tables").join(name);
    let database = data_dir.join("apjuice");
    let _ = std::fs::remove_dir_all(&data_dir);
    std::fs::create_dir_all(&database).unwrap();
    std::fs::write(
        database.join("phytochemicals_quality.csv"),
        format!("{}\n{}", HEADER, body),
    )
    .unwrap();

    let config = SessionConfig::builder()
        .data_dir(&data_dir)
        .database("apjuice")
        .build()
        .unwrap();
    TableSource::new(&config, RecordSchema::orange())
        .unwrap()
        .load_table("phytochemicals_quality")
        .unwrap()
}

/// Same records in a different order.
fn shuffled(dataset: &Dataset, seed: u64) -> Dataset {
    let mut idx: Vec<IdxSize> = (0..dataset.len() as IdxSize).collect();
    idx.shuffle(&mut StdRng::seed_from_u64(seed));
    let frame = dataset
        .frame()
        .take(&IdxCa::from_vec("idx".into(), idx))
        .unwrap();
    Dataset::from_frame(frame, dataset.schema().clone(), dataset.class_labels()).unwrap()
}

fn sorted_records(dataset: &Dataset) -> Vec<String> {
    let mut records: Vec<String> = dataset
        .records()
        .unwrap()
        .iter()
        .map(|r| format!("{:?}", r))
        .collect();
    records.sort();
    records
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_fixture_table() {
    let dataset = load_oranges();
    assert_eq!(dataset.len(), 20);
    assert_eq!(dataset.schema().len(), 10);
    assert_eq!(dataset.label_field(), "quality");
    assert_eq!(dataset.distinct_values("quality").unwrap(), vec!["Bad", "Good"]);
}

#[test]
fn test_list_fixture_tables() {
    let source = TableSource::new(&config(), RecordSchema::orange()).unwrap();
    assert_eq!(source.list_tables().unwrap(), vec!["phytochemicals_quality"]);
}

#[test]
fn test_load_column_without_values() {
    let dataset = load_csv_table(
        "no_citric_acid",
        "7.4,0.70,,1.9,0.076,11.0,34.0,56.4,navel,Good\n\
         7.8,0.88,,2.6,0.098,25.0,67.0,50.1,valencia,Bad\n",
    );
    assert_eq!(dataset.len(), 2);

    let partition = partition_by_class(&dataset, &["Good", "Bad"]).unwrap();
    let samples = extract_field_samples(&partition, "Good", "citric_acid").unwrap();
    assert!(samples.is_empty());
    assert_eq!(
        extract_field_samples(&partition, "Bad", "sugar").unwrap(),
        vec![2.6]
    );
}

#[test]
fn test_load_header_only_table() {
    let dataset = load_csv_table("header_only", "");
    assert!(dataset.is_empty());

    let counts = count_per_class(&partition_by_class(&dataset, &["Good", "Bad"]).unwrap());
    assert_eq!(counts.total(), 0);
    let err = imbalance_ratio(&counts, "Bad", &["Good", "Bad"]).unwrap_err();
    assert_eq!(err.error_code(), "DIVISION_BY_ZERO");
}

#[test]
fn test_unknown_label_set_rejects_table() {
    let config = SessionConfig::builder()
        .data_dir(fixtures_path())
        .database("apjuice")
        .class_labels(["Good"])
        .minority_label("Good")
        .build()
        .unwrap();
    let err = TableSource::new(&config, RecordSchema::orange())
        .unwrap()
        .load_table("phytochemicals_quality")
        .unwrap_err();
    assert!(err.is_data_error());
    assert_eq!(err.error_code(), "INVALID_LABEL");
}

// ============================================================================
// Class Balance
// ============================================================================

#[test]
fn test_counts_cover_dataset() {
    let dataset = load_oranges();
    let partition = partition_by_class(&dataset, &["Good", "Bad"]).unwrap();
    let counts = count_per_class(&partition);

    assert_eq!(counts.get("Good"), Some(4));
    assert_eq!(counts.get("Bad"), Some(16));
    assert_eq!(counts.total(), dataset.len());

    // a partial label set counts fewer records
    let bad_only = count_per_class(&partition_by_class(&dataset, &["Bad"]).unwrap());
    assert!(bad_only.total() <= dataset.len());
    assert_eq!(bad_only.len(), 1);
}

#[test]
fn test_imbalance_ratio_of_fixture() {
    let dataset = load_oranges();
    let counts = count_per_class(&partition_by_class(&dataset, &["Bad", "Good"]).unwrap());

    let ratio = imbalance_ratio(&counts, "Bad", &["Bad", "Good"]).unwrap();
    assert!((ratio - 0.8).abs() < 1e-12);

    let baseline = baseline_accuracy(&counts).unwrap();
    assert_eq!(baseline.majority_label, "Bad");
    assert!((baseline.accuracy - 0.8).abs() < 1e-12);
}

#[test]
fn test_imbalance_ratio_ignores_record_order() {
    let dataset = load_oranges();
    let labels = ["Good", "Bad"];
    let expected = imbalance_ratio(
        &count_per_class(&partition_by_class(&dataset, &labels).unwrap()),
        "Bad",
        &labels,
    )
    .unwrap();

    for seed in [1, 7, 42] {
        let reordered = shuffled(&dataset, seed);
        let counts = count_per_class(&partition_by_class(&reordered, &labels).unwrap());
        assert_eq!(imbalance_ratio(&counts, "Bad", &labels).unwrap(), expected);
    }
}

#[test]
fn test_empty_table_division_by_zero() {
    let empty = load_oranges().empty_like();
    let counts = count_per_class(&partition_by_class(&empty, &["Good", "Bad"]).unwrap());

    let err = imbalance_ratio(&counts, "Bad", &["Good", "Bad"]).unwrap_err();
    assert!(matches!(err, SummaryError::DivisionByZero(_)));
}

#[test]
fn test_partition_round_trip() {
    let dataset = load_oranges();
    let partition = partition_by_class(&dataset, &["Good", "Bad"]).unwrap();

    let mut merged: Vec<String> = partition
        .iter()
        .flat_map(|(_, part)| sorted_records(part))
        .collect();
    merged.sort();

    assert_eq!(merged, sorted_records(&dataset));
    assert_eq!(sorted_records(&shuffled(&dataset, 3)), sorted_records(&dataset));
}

// ============================================================================
// Class-Conditional Samples
// ============================================================================

#[test]
fn test_field_samples_exclude_missing() {
    let partition = partition_by_class(&load_oranges(), &["Good", "Bad"]).unwrap();

    let good = extract_field_samples(&partition, "Good", "citric_acid").unwrap();
    assert_eq!(good, vec![0.56, 0.0, 0.02]);

    let bad_sugar = extract_field_samples(&partition, "Bad", "sugar").unwrap();
    assert_eq!(bad_sugar.len(), 15);
}

#[test]
fn test_field_samples_never_exceed_class_size() {
    let dataset = load_oranges();
    let partition = partition_by_class(&dataset, &["Good", "Bad"]).unwrap();

    for spec in dataset.schema().numeric_fields() {
        for (label, part) in partition.iter() {
            let samples = extract_field_samples(&partition, label, &spec.name).unwrap();
            assert!(samples.len() <= part.len(), "{} / {}", label, spec.name);
        }
    }
}

#[test]
fn test_field_samples_unknown_field() {
    let partition = partition_by_class(&load_oranges(), &["Good", "Bad"]).unwrap();
    let err = extract_field_samples(&partition, "Good", "pulp").unwrap_err();
    assert!(matches!(err, SummaryError::FieldNotFound(ref f) if f == "pulp"));
}

#[test]
fn test_summarize_good_class() {
    let partition = partition_by_class(&load_oranges(), &["Good", "Bad"]).unwrap();
    let summary = summarize_class(&partition, "Good", &["citric_acid", "vitamin_c"]).unwrap();

    assert_eq!(summary.count, 4);
    let citric = summary.field("citric_acid").unwrap();
    assert_eq!(citric.missing, 1);
    assert_eq!(citric.stats.as_ref().unwrap().count, 3);
    assert_eq!(summary.field("vitamin_c").unwrap().values.len(), 4);
}

// ============================================================================
// Cross Tabulation
// ============================================================================

#[test]
fn test_cross_tabulate_quality_by_type() {
    let dataset = load_oranges();
    let table = cross_tabulate(&dataset, "quality", "type").unwrap();

    assert!(table.len() <= 4);
    assert!(table.cells().iter().all(|cell| cell.count > 0));
    assert_eq!(table.total(), dataset.len());
    assert_eq!(table.get("Bad", "navel"), Some(9));
    assert_eq!(table.get("Good", "valencia"), Some(1));
}

#[test]
fn test_cross_tabulate_frame_is_zero_filled() {
    let dataset = load_oranges();
    let good = dataset.filter_label("Good").unwrap();
    let table = cross_tabulate(&good, "quality", "type").unwrap();
    assert_eq!(table.len(), 2);

    let frame = table.to_frame().unwrap();
    assert_eq!(frame.height(), 1);
    assert_eq!(frame.width(), 3);
}

// ============================================================================
// Report
// ============================================================================

#[test]
fn test_report_end_to_end() {
    let dataset = load_oranges();
    let output = std::env::temp_dir().join("juice_eda_integration_report");
    let config = SessionConfig::builder()
        .data_dir(fixtures_path())
        .database("apjuice")
        .output_dir(&output)
        .sample_fields(["citric_acid", "sugar"])
        .build()
        .unwrap();

    let report = ReportGenerator::build_report(&dataset, &config).unwrap();
    assert_eq!(report.rows, 20);
    assert!((report.imbalance.ratio - 0.8).abs() < 1e-12);
    assert_eq!(report.class_summaries.len(), 2);
    assert_eq!(report.field_profiles.len(), 10);
    assert_eq!(report.correlations.fields.len(), 8);

    let path = ReportGenerator::new(config.output_dir.clone())
        .write_report_to_file(&report, &config.table)
        .unwrap();
    assert!(path.ends_with("phytochemicals_quality_report.json"));
    assert!(path.is_file());
}
