//! Validated, immutable tables.
//!
//! A [`Dataset`] pairs a Polars frame with the [`RecordSchema`] it was
//! checked against. Numeric fields are stored as `Float64`, categorical
//! fields as strings, and the label field never contains nulls or values
//! outside the known class set. Every derived dataset (filtered, projected,
//! partitioned) shares the schema and keeps those guarantees.

use crate::error::{Result, ResultExt, SummaryError};
use crate::schema::{FieldKind, RecordSchema, is_categorical_dtype, is_numeric_dtype};
use crate::types::{Observation, Record};
use polars::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// An ordered collection of records conforming to a schema.
#[derive(Debug, Clone)]
pub struct Dataset {
    schema: Arc<RecordSchema>,
    class_labels: Arc<Vec<String>>,
    frame: DataFrame,
}

static_assertions::assert_impl_all!(Dataset: Send, Sync);

impl Dataset {
    /// Validate `frame` against `schema` and the known class labels.
    ///
    /// Columns not declared in the schema are dropped; the remaining columns
    /// are ordered as in the schema.
    pub fn from_frame(
        frame: DataFrame,
        schema: RecordSchema,
        class_labels: &[String],
    ) -> Result<Self> {
        let mut columns: Vec<Column> = Vec::with_capacity(schema.len());

        for spec in schema.fields() {
            let column = frame
                .column(&spec.name)
                .map_err(|_| SummaryError::FieldNotFound(spec.name.clone()))?;
            let series = column.as_materialized_series();
            let dtype = series.dtype();

            let normalized = match spec.kind {
                FieldKind::Numeric => {
                    // a column with no values at all is read back as strings
                    let all_missing = matches!(dtype, DataType::Null | DataType::String)
                        && series.null_count() == series.len();
                    if !is_numeric_dtype(dtype) && !all_missing {
                        return Err(SummaryError::NotNumeric {
                            field: spec.name.clone(),
                            dtype: format!("{:?}", dtype),
                        });
                    }
                    series.cast(&DataType::Float64)?
                }
                FieldKind::Categorical => {
                    if !is_categorical_dtype(dtype) && !matches!(dtype, DataType::Null) {
                        return Err(SummaryError::NotCategorical {
                            field: spec.name.clone(),
                            dtype: format!("{:?}", dtype),
                        });
                    }
                    series.cast(&DataType::String)?
                }
            };
            columns.push(normalized.into());
        }

        let frame = DataFrame::new(columns).context("Building validated frame")?;
        Self::check_labels(&frame, schema.label_field(), class_labels)?;

        debug!(
            "Validated dataset: {} rows x {} fields",
            frame.height(),
            frame.width()
        );

        Ok(Self {
            schema: Arc::new(schema),
            class_labels: Arc::new(class_labels.to_vec()),
            frame,
        })
    }

    fn check_labels(frame: &DataFrame, label_field: &str, class_labels: &[String]) -> Result<()> {
        let known: HashSet<&str> = class_labels.iter().map(String::as_str).collect();
        let labels = frame.column(label_field)?.as_materialized_series().str()?;

        for (row, value) in labels.into_iter().enumerate() {
            match value {
                None => return Err(SummaryError::MissingLabel { row }),
                Some(v) if !known.contains(v) => {
                    return Err(SummaryError::InvalidLabel {
                        row,
                        value: v.to_string(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Wrap a frame derived from `self` (same columns and dtypes).
    fn derived(&self, frame: DataFrame) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            class_labels: Arc::clone(&self.class_labels),
            frame,
        }
    }

    /// An empty dataset with the same schema.
    pub fn empty_like(&self) -> Self {
        self.derived(self.frame.clear())
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn class_labels(&self) -> &[String] {
        &self.class_labels
    }

    pub fn label_field(&self) -> &str {
        self.schema.label_field()
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Column of a schema field.
    pub fn column(&self, field: &str) -> Result<&Series> {
        self.schema.field(field)?;
        Ok(self.frame.column(field)?.as_materialized_series())
    }

    /// Rows matching a Polars predicate, in original order.
    ///
    /// ```rust,ignore
    /// let sweet = dataset.filter(col("sugar").gt(lit(10.0)))?;
    /// ```
    pub fn filter(&self, predicate: Expr) -> Result<Self> {
        let frame = self
            .frame
            .clone()
            .lazy()
            .filter(predicate)
            .collect()
            .context("Filtering dataset")?;
        Ok(self.derived(frame))
    }

    /// Rows whose label equals `label`, in original order.
    pub fn filter_label(&self, label: &str) -> Result<Self> {
        self.filter(col(self.label_field()).eq(lit(label)))
    }

    /// Keep only the named fields. The label field is always retained.
    pub fn select_fields(&self, names: &[&str]) -> Result<Self> {
        let schema = self.schema.project(names)?;
        let frame = self.frame.select(schema.names())?;
        Ok(Self {
            schema: Arc::new(schema),
            class_labels: Arc::clone(&self.class_labels),
            frame,
        })
    }

    /// All values of a numeric field, missing values kept as
    /// [`Observation::Missing`].
    pub fn materialize_as_array(&self, field: &str) -> Result<Vec<Observation>> {
        self.schema.numeric_field(field)?;
        let values = self.frame.column(field)?.as_materialized_series().f64()?;
        Ok(values.into_iter().map(Observation::from).collect())
    }

    /// Present values of a numeric field, missing values excluded.
    pub fn present_values(&self, field: &str) -> Result<Vec<f64>> {
        Ok(self
            .materialize_as_array(field)?
            .into_iter()
            .filter_map(Observation::value)
            .collect())
    }

    /// Values of any field in string form; `None` for missing values.
    pub fn string_values(&self, field: &str) -> Result<Vec<Option<String>>> {
        let spec = self.schema.field(field)?;
        let series = self.frame.column(field)?.as_materialized_series();

        let values = match spec.kind {
            FieldKind::Categorical => series
                .str()?
                .into_iter()
                .map(|v| v.map(str::to_string))
                .collect(),
            FieldKind::Numeric => series
                .f64()?
                .into_iter()
                .map(|v| v.filter(|x| !x.is_nan()).map(|x| x.to_string()))
                .collect(),
        };
        Ok(values)
    }

    /// Distinct non-missing values of a field, in order of first appearance.
    pub fn distinct_values(&self, field: &str) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        Ok(self
            .string_values(field)?
            .into_iter()
            .flatten()
            .filter(|v| seen.insert(v.clone()))
            .collect())
    }

    /// Record at position `idx`, `None` past the end.
    pub fn record(&self, idx: usize) -> Result<Option<Record>> {
        if idx >= self.len() {
            return Ok(None);
        }
        let single = self.frame.slice(idx as i64, 1);
        let mut records = self.derived(single).records()?;
        Ok(records.pop())
    }

    /// All records in order.
    pub fn records(&self) -> Result<Vec<Record>> {
        let label_field = self.label_field();
        let mut records: Vec<Record> = self
            .frame
            .column(label_field)?
            .as_materialized_series()
            .str()?
            .into_iter()
            .map(|label| Record {
                label: label.unwrap_or_default().to_string(),
                categorical: BTreeMap::new(),
                numeric: BTreeMap::new(),
            })
            .collect();

        for spec in self.schema.fields() {
            if spec.name == label_field {
                continue;
            }
            let series = self.frame.column(&spec.name)?.as_materialized_series();
            match spec.kind {
                FieldKind::Numeric => {
                    for (record, value) in records.iter_mut().zip(series.f64()?.into_iter()) {
                        record
                            .numeric
                            .insert(spec.name.clone(), Observation::from(value));
                    }
                }
                FieldKind::Categorical => {
                    for (record, value) in records.iter_mut().zip(series.str()?.into_iter()) {
                        record
                            .categorical
                            .insert(spec.name.clone(), value.map(str::to_string));
                    }
                }
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn small_schema() -> RecordSchema {
        use crate::schema::FieldSpec;
        RecordSchema::new(
            vec![
                FieldSpec::numeric("citric_acid"),
                FieldSpec::numeric("sugar"),
                FieldSpec::categorical("type"),
                FieldSpec::categorical("quality"),
            ],
            "quality",
        )
        .unwrap()
    }

    pub(crate) fn labels() -> Vec<String> {
        vec!["Good".to_string(), "Bad".to_string()]
    }

    pub(crate) fn sample_dataset() -> Dataset {
        let df = df![
            "citric_acid" => [Some(0.3), None, Some(0.5), Some(0.2), Some(0.9)],
            "sugar" => [Some(10.0), Some(12.0), Some(8.0), None, Some(11.0)],
            "type" => ["navel", "valencia", "navel", "navel", "valencia"],
            "quality" => ["Good", "Bad", "Good", "Bad", "Bad"],
            "extra" => [1, 2, 3, 4, 5],
        ]
        .unwrap();
        Dataset::from_frame(df, small_schema(), &labels()).unwrap()
    }

    #[test]
    fn test_from_frame_normalizes_columns() {
        let dataset = sample_dataset();
        assert_eq!(dataset.len(), 5);
        assert_eq!(dataset.frame().width(), 4);
        assert!(dataset.frame().column("extra").is_err());
        assert_eq!(
            dataset.frame().column("citric_acid").unwrap().dtype(),
            &DataType::Float64
        );
    }

    #[test]
    fn test_integer_measurements_cast_to_float() {
        let df = df![
            "citric_acid" => [1, 2],
            "sugar" => [3, 4],
            "type" => ["navel", "navel"],
            "quality" => ["Good", "Bad"],
        ]
        .unwrap();
        let dataset = Dataset::from_frame(df, small_schema(), &labels()).unwrap();
        assert_eq!(dataset.present_values("sugar").unwrap(), vec![3.0, 4.0]);
    }

    #[test]
    fn test_missing_schema_field() {
        let df = df![
            "citric_acid" => [0.1],
            "type" => ["navel"],
            "quality" => ["Good"],
        ]
        .unwrap();
        let err = Dataset::from_frame(df, small_schema(), &labels()).unwrap_err();
        assert!(matches!(err, SummaryError::FieldNotFound(name) if name == "sugar"));
    }

    #[test]
    fn test_non_numeric_measurement() {
        let df = df![
            "citric_acid" => ["high"],
            "sugar" => [1.0],
            "type" => ["navel"],
            "quality" => ["Good"],
        ]
        .unwrap();
        let err = Dataset::from_frame(df, small_schema(), &labels()).unwrap_err();
        assert_eq!(err.error_code(), "NOT_NUMERIC");
    }

    #[test]
    fn test_all_missing_string_measurement_is_numeric() {
        let df = df![
            "citric_acid" => [None::<&str>, None],
            "sugar" => [1.0, 2.0],
            "type" => ["navel", "navel"],
            "quality" => ["Good", "Bad"],
        ]
        .unwrap();
        let dataset = Dataset::from_frame(df, small_schema(), &labels()).unwrap();
        assert_eq!(
            dataset.frame().column("citric_acid").unwrap().dtype(),
            &DataType::Float64
        );
        assert_eq!(
            dataset.materialize_as_array("citric_acid").unwrap(),
            vec![Observation::Missing, Observation::Missing]
        );
    }

    #[test]
    fn test_non_categorical_type_is_data_error() {
        let df = DataFrame::new(vec![
            Column::new("citric_acid".into(), [0.1, 0.2]),
            Column::new("sugar".into(), [1.0, 2.0]),
            Column::new("type".into(), [19000i32, 19001])
                .cast(&DataType::Date)
                .unwrap(),
            Column::new("quality".into(), ["Good", "Bad"]),
        ])
        .unwrap();
        let err = Dataset::from_frame(df, small_schema(), &labels()).unwrap_err();
        assert_eq!(err.error_code(), "NOT_CATEGORICAL");
        assert!(err.is_data_error());
    }

    #[test]
    fn test_unknown_and_missing_labels() {
        let df = df![
            "citric_acid" => [0.1, 0.2],
            "sugar" => [1.0, 2.0],
            "type" => ["navel", "navel"],
            "quality" => ["Good", "Average"],
        ]
        .unwrap();
        let err = Dataset::from_frame(df, small_schema(), &labels()).unwrap_err();
        assert!(matches!(err, SummaryError::InvalidLabel { row: 1, ref value } if value == "Average"));

        let df = df![
            "citric_acid" => [0.1, 0.2],
            "sugar" => [1.0, 2.0],
            "type" => ["navel", "navel"],
            "quality" => [None, Some("Good")],
        ]
        .unwrap();
        let err = Dataset::from_frame(df, small_schema(), &labels()).unwrap_err();
        assert!(matches!(err, SummaryError::MissingLabel { row: 0 }));
    }

    #[test]
    fn test_filter_label_preserves_order() {
        let bad = sample_dataset().filter_label("Bad").unwrap();
        assert_eq!(bad.len(), 3);
        assert_eq!(
            bad.materialize_as_array("citric_acid").unwrap(),
            vec![
                Observation::Missing,
                Observation::Present(0.2),
                Observation::Present(0.9)
            ]
        );
    }

    #[test]
    fn test_filter_with_expression() {
        let sweet = sample_dataset()
            .filter(col("sugar").gt_eq(lit(11.0)))
            .unwrap();
        assert_eq!(sweet.len(), 2);
        assert_eq!(sweet.schema().label_field(), "quality");
    }

    #[test]
    fn test_select_fields() {
        let selected = sample_dataset().select_fields(&["sugar"]).unwrap();
        assert_eq!(selected.schema().names(), vec!["sugar", "quality"]);
        assert_eq!(selected.frame().width(), 2);
        assert!(selected.column("citric_acid").unwrap_err().is_field_not_found());
        assert!(sample_dataset().select_fields(&["pulp"]).is_err());
    }

    #[test]
    fn test_materialize_rejects_categorical() {
        let err = sample_dataset().materialize_as_array("type").unwrap_err();
        assert_eq!(err.error_code(), "NOT_NUMERIC");
    }

    #[test]
    fn test_distinct_values_in_appearance_order() {
        let dataset = sample_dataset();
        assert_eq!(dataset.distinct_values("quality").unwrap(), vec!["Good", "Bad"]);
        assert_eq!(
            dataset.distinct_values("type").unwrap(),
            vec!["navel", "valencia"]
        );
    }

    #[test]
    fn test_records() {
        let dataset = sample_dataset();
        let records = dataset.records().unwrap();
        assert_eq!(records.len(), 5);
        assert_eq!(records[1].label, "Bad");
        assert_eq!(records[1].numeric("citric_acid"), Observation::Missing);
        assert_eq!(
            records[1].categorical.get("type"),
            Some(&Some("valencia".to_string()))
        );

        let third = dataset.record(2).unwrap().unwrap();
        assert_eq!(third, records[2]);
        assert!(dataset.record(5).unwrap().is_none());
    }

    #[test]
    fn test_empty_like() {
        let empty = sample_dataset().empty_like();
        assert!(empty.is_empty());
        assert_eq!(empty.frame().width(), 4);
    }
}
