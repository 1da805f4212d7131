//! Class balance and class-conditional summaries.
//!
//! Every function here is a pure computation over an in-memory
//! [`Dataset`](crate::dataset::Dataset):
//!
//! - [`partition_by_class`] splits records by label, keeping record order
//! - [`count_per_class`] and [`imbalance_ratio`] describe the class balance
//! - [`extract_field_samples`] and [`summarize_class`] pull per-class values
//!   of numeric fields (missing values excluded)
//! - [`cross_tabulate`] counts co-occurring values of two fields
//!
//! # Example
//!
//! ```rust,ignore
//! use juice_eda::summary::*;
//!
//! let partition = partition_by_class(&dataset, &["Good", "Bad"])?;
//! let counts = count_per_class(&partition);
//! let ratio = imbalance_ratio(&counts, "Bad", &["Good", "Bad"])?;
//! let citric_good = extract_field_samples(&partition, "Good", "citric_acid")?;
//! ```

mod crosstab;
mod partition;

pub use crosstab::cross_tabulate;
pub use partition::{
    Baseline, ClassPartition, baseline_accuracy, count_per_class, extract_field_samples,
    imbalance_ratio, partition_by_class, summarize_class,
};
