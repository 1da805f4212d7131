//! CLI entry point for the orange quality summaries.

use anyhow::{Result, anyhow};
use clap::Parser;
use dotenv::dotenv;
use juice_eda::display::{ConsoleSink, DisplaySink, ScatterData};
use juice_eda::profile::{numeric_correlations, profile_fields};
use juice_eda::reporting::STRONG_CORRELATION;
use juice_eda::summary::{
    baseline_accuracy, count_per_class, cross_tabulate, extract_field_samples, imbalance_ratio,
    partition_by_class,
};
use juice_eda::{
    DataSource, Dataset, RecordSchema, ReportGenerator, SessionConfig, SummaryError, TableSource,
};
use polars::prelude::*;
use std::env;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Environment variable naming the default data directory.
const DATA_DIR_ENV: &str = "JUICE_EDA_DATA_DIR";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Class balance and class-conditional summaries of orange quality data",
    long_about = "Summarizes a table of orange measurements labelled Good/Bad: class \
                  counts, imbalance ratio, majority baseline, contingency tables, \
                  per-class histograms and a field profile.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  JUICE_EDA_DATA_DIR    Default for --data-dir (also read from .env)\n\n\
                  EXAMPLES:\n  \
                  # Summarize the default table of the apjuice database\n  \
                  juice-eda --data-dir warehouse --database apjuice\n\n  \
                  # Per-class histograms of two measurements\n  \
                  juice-eda --database apjuice --histogram citric_acid --histogram sugar\n\n  \
                  # Machine-readable output\n  \
                  juice-eda --database apjuice --json | jq .imbalance"
)]
struct Args {
    /// Root directory holding one sub-directory per database
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Database the session is bound to
    #[arg(long, default_value = "default")]
    database: String,

    /// Table to summarize
    #[arg(short, long, default_value = juice_eda::config::DEFAULT_TABLE)]
    table: String,

    /// Field holding the class label
    #[arg(long, default_value = "quality")]
    label_field: String,

    /// Known class labels, comma separated
    #[arg(long, value_delimiter = ',', default_value = "Good,Bad")]
    classes: Vec<String>,

    /// Label whose share is reported as the imbalance ratio
    #[arg(long, default_value = "Bad")]
    minority: String,

    /// Field cross-tabulated against the label
    #[arg(long, default_value = "type")]
    crosstab_with: String,

    /// Skip the contingency table
    #[arg(long)]
    no_crosstab: bool,

    /// Numeric field to draw per-class histograms for (repeatable)
    ///
    /// Defaults to citric_acid when not given.
    #[arg(long = "histogram", value_name = "FIELD")]
    histograms: Vec<String>,

    /// Numeric field on the x axis of the scatter digest
    #[arg(long, requires = "scatter_y")]
    scatter_x: Option<String>,

    /// Numeric field on the y axis of the scatter digest
    #[arg(long, requires = "scatter_x")]
    scatter_y: Option<String>,

    /// Number of histogram bins
    #[arg(long, default_value = "10")]
    bins: usize,

    /// List the tables of the database and exit
    #[arg(long)]
    list_tables: bool,

    /// Output the JSON report to stdout instead of human-readable tables
    ///
    /// Disables all logs; only the report is written to stdout.
    #[arg(long)]
    json: bool,

    /// Write the JSON report to the output directory as <table>_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,

    /// Output directory for reports
    #[arg(short, long, default_value = "./output")]
    output: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Only show warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    // .env may supply the data directory
    dotenv().ok();

    if let Err(e) = run(&args) {
        error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let config = build_config(args)?;
    debug!("Session config: {:?}", config);

    let source = TableSource::new(&config, RecordSchema::orange())?;

    if args.list_tables {
        let tables = source.list_tables()?;
        if tables.is_empty() {
            warn!("No tables found in database '{}'", config.database);
        }
        for table in tables {
            println!("{}", table);
        }
        return Ok(());
    }

    let dataset = source.load_table(&config.table)?;
    info!(
        "Table '{}' loaded: {} records x {} fields",
        config.table,
        dataset.len(),
        dataset.schema().len()
    );

    if args.json {
        let report = ReportGenerator::build_report(&dataset, &config)?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        if args.emit_report {
            ReportGenerator::new(config.output_dir.clone())
                .write_report_to_file(&report, &config.table)?;
        }
        return Ok(());
    }

    print_summary(args, &config, &dataset)?;

    if args.emit_report {
        let report = ReportGenerator::build_report(&dataset, &config)?;
        let path = ReportGenerator::new(config.output_dir.clone())
            .write_report_to_file(&report, &config.table)?;
        println!("\nReport written to {}", path.display());
    }

    Ok(())
}

fn build_config(args: &Args) -> Result<SessionConfig> {
    let data_dir = match &args.data_dir {
        Some(dir) => dir.clone(),
        None => env::var(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| SessionConfig::default().data_dir),
    };

    let mut builder = SessionConfig::builder()
        .data_dir(data_dir)
        .database(&args.database)
        .table(&args.table)
        .label_field(&args.label_field)
        .class_labels(&args.classes)
        .minority_label(&args.minority)
        .crosstab_field((!args.no_crosstab).then_some(&args.crosstab_with))
        .histogram_bins(args.bins)
        .output_dir(&args.output);

    if !args.histograms.is_empty() {
        builder = builder.sample_fields(&args.histograms);
    }

    builder
        .build()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))
}

/// Print the human-readable summary.
///
/// Uses `println!` for the tables themselves; they are the point of the run
/// and must show regardless of log level.
fn print_summary(args: &Args, config: &SessionConfig, dataset: &Dataset) -> Result<()> {
    let mut sink = ConsoleSink::stdout(config.histogram_bins);
    let label_field = dataset.label_field();

    println!("\n{}", "=".repeat(80));
    println!("ORANGE QUALITY SUMMARY");
    println!("{}\n", "=".repeat(80));
    println!("  Database: {}", config.database);
    println!("  Table:    {}", config.table);
    println!("  Records:  {}", dataset.len());
    println!(
        "  Labels:   {}",
        dataset.distinct_values(label_field)?.join(", ")
    );

    // 1. Class balance
    let partition = partition_by_class(dataset, &config.class_labels)?;
    let counts = count_per_class(&partition);

    let labels: Vec<&str> = counts.labels().collect();
    let values: Vec<u64> = counts.iter().map(|(_, n)| n as u64).collect();
    let frame = DataFrame::new(vec![
        Column::new(label_field.into(), labels),
        Column::new("count".into(), values),
    ])?;
    sink.render("CLASS COUNTS", &frame)?;

    let ratio = imbalance_ratio(&counts, &config.minority_label, &config.class_labels)?;
    let baseline = baseline_accuracy(&counts)?;
    println!(
        "  {:.1}% of the records are '{}'",
        ratio * 100.0,
        config.minority_label
    );
    println!(
        "  Always predicting '{}' would be {:.1}% accurate",
        baseline.majority_label,
        baseline.accuracy * 100.0
    );

    // 2. Contingency table
    if let Some(field) = &config.crosstab_field {
        let table = cross_tabulate(dataset, label_field, field)?;
        sink.render(
            &format!("{} BY {}", label_field.to_uppercase(), field.to_uppercase()),
            &table.to_frame()?,
        )?;
    }

    // 3. Per-class histograms
    for field in &config.sample_fields {
        for label in partition.labels() {
            match partition.non_empty(label) {
                Ok(_) => {
                    let samples = extract_field_samples(&partition, label, field)?;
                    sink.render_histogram(&format!("{} ({})", field, label), &samples)?;
                }
                Err(SummaryError::EmptyPartition(_)) => {
                    warn!("No '{}' records, skipping {} histogram", label, field);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    // 4. Scatter digest
    if let (Some(x), Some(y)) = (&args.scatter_x, &args.scatter_y) {
        let scatter = ScatterData::from_dataset(dataset, x, y, label_field)?;
        sink.render_scatter(&format!("{} VS {}", y, x), &scatter)?;
    }

    // 5. Field profile
    println!("\nFIELD PROFILE");
    println!("{}", "-".repeat(40));
    println!(
        "{:<16} {:<12} {:>10} {:>9} {:>10} {:>10}",
        "Field", "Kind", "Missing %", "Distinct", "Mean", "Std"
    );
    println!("{}", "-".repeat(72));
    for profile in profile_fields(dataset)? {
        let (mean, std) = profile
            .numeric
            .as_ref()
            .map(|n| (format!("{:.3}", n.mean), format!("{:.3}", n.std)))
            .unwrap_or_else(|| ("-".to_string(), "-".to_string()));
        println!(
            "{:<16.16} {:<12} {:>10.1} {:>9} {:>10} {:>10}{}",
            profile.name,
            format!("{:?}", profile.kind).to_lowercase(),
            profile.missing_percentage,
            profile.distinct_count,
            mean,
            std,
            if profile.near_constant { "  (constant)" } else { "" }
        );
    }

    // 6. Correlations
    let correlations = numeric_correlations(dataset)?;
    sink.render_correlations("CORRELATIONS", &correlations)?;
    for pair in correlations.strong_pairs(STRONG_CORRELATION) {
        println!(
            "  strong: {} ~ {} (r = {:.2})",
            pair.first, pair.second, pair.coefficient
        );
    }

    Ok(())
}
