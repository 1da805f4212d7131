//! Table loading.
//!
//! A [`TableSource`] is bound to one database directory named by the
//! [`SessionConfig`]; each table is a file `<data_dir>/<database>/<name>.csv`
//! or `<name>.parquet`.

use crate::config::SessionConfig;
use crate::dataset::Dataset;
use crate::error::{Result, ResultExt, SummaryError};
use crate::schema::RecordSchema;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Something that can hand out validated tables by name.
pub trait DataSource {
    /// Load and validate a table.
    fn load_table(&self, name: &str) -> Result<Dataset>;

    /// Names of the tables available in the bound database, sorted.
    fn list_tables(&self) -> Result<Vec<String>>;
}

/// File formats a table may be stored in, in lookup order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Parquet,
}

impl TableFormat {
    pub const ALL: [TableFormat; 2] = [TableFormat::Csv, TableFormat::Parquet];

    pub fn extension(self) -> &'static str {
        match self {
            TableFormat::Csv => "csv",
            TableFormat::Parquet => "parquet",
        }
    }

    fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Self::ALL.into_iter().find(|f| f.extension() == ext)
    }
}

/// File-backed data source bound to one database.
#[derive(Debug, Clone)]
pub struct TableSource {
    database_dir: PathBuf,
    database: String,
    schema: RecordSchema,
    class_labels: Vec<String>,
    infer_schema_length: usize,
}

impl TableSource {
    /// Bind a source to the database named in `config`, validating tables
    /// against `schema` relabelled by `config.label_field`.
    pub fn new(config: &SessionConfig, schema: RecordSchema) -> Result<Self> {
        config.validate()?;
        let schema = if schema.label_field() == config.label_field {
            schema
        } else {
            schema.with_label_field(&config.label_field)?
        };

        Ok(Self {
            database_dir: config.database_dir(),
            database: config.database.clone(),
            schema,
            class_labels: config.class_labels.clone(),
            infer_schema_length: config.infer_schema_length,
        })
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Path of the file backing `name`, CSV preferred over Parquet.
    pub fn table_path(&self, name: &str) -> Result<(PathBuf, TableFormat)> {
        TableFormat::ALL
            .into_iter()
            .map(|format| {
                (
                    self.database_dir
                        .join(format!("{}.{}", name, format.extension())),
                    format,
                )
            })
            .find(|(path, _)| path.is_file())
            .ok_or_else(|| SummaryError::TableNotFound {
                table: name.to_string(),
                database: self.database.clone(),
            })
    }

    /// Dtypes of the schema fields present in the CSV header, so that a
    /// numeric column without any values is still read as `Float64`.
    fn csv_dtype_overrides(&self, path: &Path) -> Option<SchemaRef> {
        let header = match CsvReadOptions::default()
            .with_has_header(true)
            .with_n_rows(Some(0))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .and_then(|reader| reader.finish())
        {
            Ok(header) => header,
            Err(e) => {
                warn!("Could not read CSV header, inferring all dtypes: {}", e);
                return None;
            }
        };

        let overrides: Schema = self
            .schema
            .fields()
            .iter()
            .filter(|spec| header.get_column_index(&spec.name).is_some())
            .map(|spec| {
                let dtype = if spec.is_numeric() {
                    DataType::Float64
                } else {
                    DataType::String
                };
                Field::new(spec.name.as_str().into(), dtype)
            })
            .collect();
        Some(Arc::new(overrides))
    }

    fn read_frame(&self, path: &Path, format: TableFormat) -> Result<DataFrame> {
        match format {
            TableFormat::Csv => {
                let overrides = self.csv_dtype_overrides(path);
                load_csv_with_fallbacks(path, self.infer_schema_length, overrides)
            }
            TableFormat::Parquet => {
                let file = File::open(path)?;
                Ok(ParquetReader::new(file).finish()?)
            }
        }
    }
}

impl DataSource for TableSource {
    fn load_table(&self, name: &str) -> Result<Dataset> {
        let (path, format) = self.table_path(name)?;
        info!("Loading table '{}' from: {}", name, path.display());

        let frame = self
            .read_frame(&path, format)
            .context(format!("Reading table '{}'", name))?;
        debug!("Raw table shape: {:?}", frame.shape());

        Dataset::from_frame(frame, self.schema.clone(), &self.class_labels)
            .context(format!("Validating table '{}'", name))
    }

    fn list_tables(&self) -> Result<Vec<String>> {
        if !self.database_dir.is_dir() {
            return Err(SummaryError::InvalidConfig(format!(
                "database directory not found: {}",
                self.database_dir.display()
            )));
        }

        let mut tables = Vec::new();
        for entry in fs::read_dir(&self.database_dir)? {
            let path = entry?.path();
            if !path.is_file() || TableFormat::from_path(&path).is_none() {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                tables.push(stem.to_string());
            }
        }
        tables.sort();
        tables.dedup();
        Ok(tables)
    }
}

/// Load a CSV file, retrying without quote handling when the first parse
/// fails. `overrides` pins the dtypes of the named columns.
fn load_csv_with_fallbacks(
    path: &Path,
    infer_schema_length: usize,
    overrides: Option<SchemaRef>,
) -> Result<DataFrame> {
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(infer_schema_length))
        .with_has_header(true)
        .with_schema_overwrite(overrides.clone())
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            warn!("Standard CSV loading failed, retrying without quotes: {}", e);
        }
    }

    Ok(CsvReadOptions::default()
        .with_infer_schema_length(Some(infer_schema_length))
        .with_has_header(true)
        .with_schema_overwrite(overrides)
        .with_parse_options(CsvParseOptions::default().with_quote_char(None))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?)
}
