//! extentdigest -- duration summaries for HTML test-execution reports.
//!
//! This crate extracts test records from Extent-style HTML reports, turns
//! repeated runs into per-test duration summaries, and reshapes
//! pipe-delimited design steps in CSV exports.

pub mod config;
pub mod report;
pub mod runner;
pub mod scan;
pub mod steps;
pub mod summary;
pub mod table;

pub use config::AppConfig;
pub use summary::{summarize, RawRecord, RunOrder, SummaryOutcome};
