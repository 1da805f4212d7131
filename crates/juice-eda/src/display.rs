//! Display sinks.
//!
//! The summary functions never render anything themselves; callers hand
//! their results to a [`DisplaySink`]. [`ConsoleSink`] is a plain-text
//! implementation writing to any [`Write`] target.

use crate::dataset::Dataset;
use crate::error::{Result, SummaryError};
use crate::profile::CorrelationMatrix;
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

/// Destination for tables and plots.
pub trait DisplaySink {
    /// Show a table.
    fn render(&mut self, title: &str, table: &DataFrame) -> Result<()>;

    /// Show the distribution of a sequence of values.
    fn render_histogram(&mut self, title: &str, values: &[f64]) -> Result<()>;

    /// Show `y` against `x`, one color per distinct value of `colors`.
    fn render_scatter(&mut self, title: &str, scatter: &ScatterData) -> Result<()>;
}

/// One equal-width histogram bin. `upper` is exclusive except for the last
/// bin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Split values into `bins` equal-width bins spanning their range.
///
/// Empty input yields no bins; a constant input yields a single bin.
pub fn histogram_bins(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: finite.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut result: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins {
                max
            } else {
                min + width * (i + 1) as f64
            },
            count: 0,
        })
        .collect();

    for v in finite {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        result[idx].count += 1;
    }
    result
}

/// Points of a colored scatter plot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScatterData {
    pub x_field: String,
    pub y_field: String,
    pub color_field: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub colors: Vec<String>,
}

impl ScatterData {
    /// Points of two numeric fields colored by a third field. Rows missing
    /// any of the three values are dropped.
    pub fn from_dataset(
        dataset: &Dataset,
        x_field: &str,
        y_field: &str,
        color_field: &str,
    ) -> Result<Self> {
        let xs = dataset.materialize_as_array(x_field)?;
        let ys = dataset.materialize_as_array(y_field)?;
        let colors = dataset.string_values(color_field)?;

        let mut data = ScatterData {
            x_field: x_field.to_string(),
            y_field: y_field.to_string(),
            color_field: color_field.to_string(),
            ..Default::default()
        };
        for ((x, y), color) in xs.into_iter().zip(ys).zip(colors) {
            if let (Some(x), Some(y), Some(color)) = (x.value(), y.value(), color) {
                data.x.push(x);
                data.y.push(y);
                data.colors.push(color);
            }
        }
        Ok(data)
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    fn check_lengths(&self) -> Result<()> {
        if self.x.len() != self.y.len() || self.x.len() != self.colors.len() {
            return Err(SummaryError::InvalidConfig(format!(
                "scatter lengths differ: x={}, y={}, colors={}",
                self.x.len(),
                self.y.len(),
                self.colors.len()
            )));
        }
        Ok(())
    }
}

/// Plain-text sink.
pub struct ConsoleSink<W: Write> {
    out: W,
    bins: usize,
    bar_width: usize,
}

impl ConsoleSink<std::io::Stdout> {
    pub fn stdout(bins: usize) -> Self {
        Self::new(std::io::stdout(), bins)
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W, bins: usize) -> Self {
        Self {
            out,
            bins: bins.max(1),
            bar_width: 40,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn heading(&mut self, title: &str) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", title)?;
        writeln!(self.out, "{}", "-".repeat(title.chars().count().max(40)))?;
        Ok(())
    }

    /// Correlation matrix as a fixed-width grid.
    pub fn render_correlations(&mut self, title: &str, matrix: &CorrelationMatrix) -> Result<()> {
        self.heading(title)?;
        write!(self.out, "{:<16}", "")?;
        for field in &matrix.fields {
            write!(self.out, " {:>9}", truncate_str(field, 9))?;
        }
        writeln!(self.out)?;

        for row in &matrix.fields {
            write!(self.out, "{:<16}", truncate_str(row, 16))?;
            for column in &matrix.fields {
                match matrix.get(row, column) {
                    Some(r) => write!(self.out, " {:>9.3}", r)?,
                    None => write!(self.out, " {:>9}", "-")?,
                }
            }
            writeln!(self.out)?;
        }
        Ok(())
    }
}

impl<W: Write> DisplaySink for ConsoleSink<W> {
    fn render(&mut self, title: &str, table: &DataFrame) -> Result<()> {
        self.heading(title)?;
        writeln!(self.out, "{}", table)?;
        Ok(())
    }

    fn render_histogram(&mut self, title: &str, values: &[f64]) -> Result<()> {
        self.heading(title)?;
        let bins = histogram_bins(values, self.bins);
        if bins.is_empty() {
            writeln!(self.out, "  (no values)")?;
            return Ok(());
        }

        let peak = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1);
        for bin in &bins {
            let bar = "#".repeat(bin.count * self.bar_width / peak);
            writeln!(
                self.out,
                "  [{:>10.4}, {:>10.4}] {:<width$} {}",
                bin.lower,
                bin.upper,
                bar,
                bin.count,
                width = self.bar_width
            )?;
        }
        Ok(())
    }

    fn render_scatter(&mut self, title: &str, scatter: &ScatterData) -> Result<()> {
        scatter.check_lengths()?;
        self.heading(title)?;
        writeln!(
            self.out,
            "  {} vs {} colored by {} ({} points)",
            scatter.y_field,
            scatter.x_field,
            scatter.color_field,
            scatter.len()
        )?;

        let mut groups: BTreeMap<&str, Vec<(f64, f64)>> = BTreeMap::new();
        for ((x, y), color) in scatter.x.iter().zip(&scatter.y).zip(&scatter.colors) {
            groups.entry(color.as_str()).or_default().push((*x, *y));
        }

        for (color, points) in groups {
            let (xs, ys): (Vec<f64>, Vec<f64>) = points.iter().copied().unzip();
            let x_range = histogram_bins(&xs, 1);
            let y_range = histogram_bins(&ys, 1);
            let (Some(xr), Some(yr)) = (x_range.first(), y_range.first()) else {
                continue;
            };
            writeln!(
                self.out,
                "  {:<12} n={:<6} {}: [{:.3}, {:.3}]  {}: [{:.3}, {:.3}]",
                truncate_str(color, 12),
                points.len(),
                scatter.x_field,
                xr.lower,
                xr.upper,
                scatter.y_field,
                yr.lower,
                yr.upper
            )?;
        }
        Ok(())
    }
}

/// Truncate a string to max length with ellipsis.
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
