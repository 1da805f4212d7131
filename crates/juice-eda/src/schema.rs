//! Statically declared record schema.
//!
//! Tables are validated against a [`RecordSchema`] when they are loaded, so
//! every later field reference is checked against a known set of names and
//! kinds instead of being resolved loosely at access time.

use crate::error::{Result, SummaryError};
use once_cell::sync::Lazy;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Kind of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Measured quantity, stored as `Float64`, may be missing.
    Numeric,
    /// Categorical value stored as a string.
    Categorical,
}

/// One named field of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Numeric,
        }
    }

    pub fn categorical(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Categorical,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.kind == FieldKind::Numeric
    }
}

/// Numeric measurements of the orange quality table.
pub const ORANGE_NUMERIC_FIELDS: [&str; 8] = [
    "acidity",
    "enzymes",
    "citric_acid",
    "sugar",
    "chlorides",
    "octyl_acetate",
    "sulfur_dioxide",
    "vitamin_c",
];

static ORANGE_SCHEMA: Lazy<RecordSchema> = Lazy::new(|| {
    let mut fields: Vec<FieldSpec> = ORANGE_NUMERIC_FIELDS
        .iter()
        .map(|name| FieldSpec::numeric(*name))
        .collect();
    fields.push(FieldSpec::categorical("type"));
    fields.push(FieldSpec::categorical("quality"));

    RecordSchema {
        fields,
        label_field: "quality".to_string(),
    }
});

/// Ordered set of fields plus the name of the label field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSchema {
    fields: Vec<FieldSpec>,
    label_field: String,
}

impl RecordSchema {
    /// Create a schema. The label field must be a declared categorical field
    /// and field names must be unique.
    pub fn new(fields: Vec<FieldSpec>, label_field: impl Into<String>) -> Result<Self> {
        let label_field = label_field.into();

        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SummaryError::InvalidConfig(format!(
                    "field '{}' declared twice",
                    field.name
                )));
            }
        }

        let schema = Self {
            fields,
            label_field,
        };
        schema.check_label_field(&schema.label_field)?;
        Ok(schema)
    }

    /// Schema of the orange quality table, labelled by `quality`.
    pub fn orange() -> Self {
        ORANGE_SCHEMA.clone()
    }

    /// Same fields, labelled by another categorical field.
    pub fn with_label_field(mut self, label_field: impl Into<String>) -> Result<Self> {
        let label_field = label_field.into();
        self.check_label_field(&label_field)?;
        self.label_field = label_field;
        Ok(self)
    }

    fn check_label_field(&self, name: &str) -> Result<()> {
        let spec = self.field(name)?;
        if spec.kind != FieldKind::Categorical {
            return Err(SummaryError::InvalidConfig(format!(
                "label field '{}' must be categorical",
                name
            )));
        }
        Ok(())
    }

    pub fn label_field(&self) -> &str {
        &self.label_field
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a field by name, failing fast on unknown names.
    pub fn field(&self, name: &str) -> Result<&FieldSpec> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| SummaryError::FieldNotFound(name.to_string()))
    }

    /// Look up a field that must be numeric.
    pub fn numeric_field(&self, name: &str) -> Result<&FieldSpec> {
        let spec = self.field(name)?;
        if !spec.is_numeric() {
            return Err(SummaryError::NotNumeric {
                field: name.to_string(),
                dtype: "categorical".to_string(),
            });
        }
        Ok(spec)
    }

    pub fn numeric_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.is_numeric())
    }

    pub fn categorical_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| !f.is_numeric())
    }

    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Keep only the named fields, in the requested order. The label field is
    /// always retained.
    pub(crate) fn project(&self, names: &[&str]) -> Result<Self> {
        let mut fields = Vec::with_capacity(names.len() + 1);
        for name in names {
            let spec = self.field(name)?;
            if !fields.iter().any(|f: &FieldSpec| f.name == spec.name) {
                fields.push(spec.clone());
            }
        }
        if !fields.iter().any(|f| f.name == self.label_field) {
            fields.push(self.field(&self.label_field)?.clone());
        }
        Ok(Self {
            fields,
            label_field: self.label_field.clone(),
        })
    }
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType can hold categorical values.
#[inline]
pub fn is_categorical_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::String | DataType::Categorical(_, _) | DataType::Boolean
    ) || is_numeric_dtype(dtype)
}
