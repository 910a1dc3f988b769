//! Output module for reporting run results
//!
//! This module handles:
//! - Summarizing a project's stored results
//! - Printing statistics for the `--stats` mode

pub mod stats;

pub use stats::{load_statistics, print_statistics, ProjectStatistics};
