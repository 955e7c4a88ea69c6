//! Per-test duration summaries built from raw report records.
//!
//! The pipeline is `normalize` (drop records without two usable timestamps),
//! `aggregate` (group by test name, collect durations) and `pivot` (spread the
//! duration list into fixed `run-N` columns). Bad records never abort a batch;
//! they are tallied in [`Diagnostics`].

pub mod aggregate;
pub mod normalize;
pub mod pivot;
pub mod stats;

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{DurationUnit, SummaryConfig};

pub use aggregate::{aggregate, ordered_by_time, ranked_by_duration, RunOrder};
pub use normalize::{derive_end_time, normalize, round2};
pub use pivot::{pivot, WideRow, WideTable};
pub use stats::{describe, status_counts, StatusCount, TestStats};

/// Why a record was left out of the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Error)]
#[serde(rename_all = "kebab-case")]
pub enum DropReason {
    #[error("test name is empty")]
    MissingName,

    #[error("start time is missing")]
    MissingStart,

    #[error("end time is missing and no step timestamp to fall back on")]
    MissingEnd,

    #[error("start time does not match the timestamp format")]
    MalformedStart,

    #[error("end time does not match the timestamp format")]
    MalformedEnd,
}

/// One test execution as read from a report or a flat file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub test_name: String,
    pub status: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// Sub-step timestamps in document order (time of day only).
    pub step_timestamps: Vec<String>,
    /// Report the record was extracted from, if known.
    pub source: Option<String>,
}

impl RawRecord {
    pub fn new(test_name: &str, start_time: Option<&str>, end_time: Option<&str>) -> Self {
        Self {
            test_name: test_name.to_string(),
            start_time: start_time.map(str::to_string),
            end_time: end_time.map(str::to_string),
            ..Self::default()
        }
    }

    /// Explicit end time if present, otherwise the one derived from the last
    /// step timestamp and the start date.
    pub fn effective_end_time(&self) -> Option<String> {
        match non_blank(self.end_time.as_deref()) {
            Some(end) => Some(end.to_string()),
            None => {
                let start = non_blank(self.start_time.as_deref())?;
                derive_end_time(start, &self.step_timestamps)
            }
        }
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A record with two parsed timestamps and its duration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidRecord {
    pub test_name: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Rounded to two decimals, in the configured unit.
    pub duration: f64,
    /// The raw duration was negative and replaced with zero.
    pub clamped: bool,
}

/// Aggregate of every valid run of one test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestDurationSummary {
    pub test_name: String,
    pub run_count: usize,
    pub total_duration: f64,
    pub max_duration: f64,
    pub ordered_durations: Vec<f64>,
}

/// Counters describing how a batch was filtered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub total: usize,
    pub accepted: usize,
    pub clamped: usize,
    pub dropped: BTreeMap<DropReason, usize>,
}

impl Diagnostics {
    pub fn dropped_total(&self) -> usize {
        self.dropped.values().sum()
    }

    fn record_drop(&mut self, reason: DropReason) {
        *self.dropped.entry(reason).or_insert(0) += 1;
    }
}

/// Everything produced from a batch that had at least one valid record.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub order: RunOrder,
    pub unit: DurationUnit,
    pub summaries: Vec<TestDurationSummary>,
    pub table: WideTable,
    pub diagnostics: Diagnostics,
}

/// Result of summarizing a batch.
///
/// `NoData` is not an error: it tells the caller there is nothing worth
/// writing, as opposed to a table that happens to be small.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum SummaryOutcome {
    Summarized(SummaryReport),
    NoData(Diagnostics),
}

impl SummaryOutcome {
    pub fn diagnostics(&self) -> &Diagnostics {
        match self {
            SummaryOutcome::Summarized(report) => &report.diagnostics,
            SummaryOutcome::NoData(diagnostics) => diagnostics,
        }
    }

    pub fn report(&self) -> Option<&SummaryReport> {
        match self {
            SummaryOutcome::Summarized(report) => Some(report),
            SummaryOutcome::NoData(_) => None,
        }
    }
}

/// Normalize a batch, keeping the valid records and the filtering tally.
pub fn normalize_all(records: &[RawRecord], config: &SummaryConfig) -> (Vec<ValidRecord>, Diagnostics) {
    let mut diagnostics = Diagnostics {
        total: records.len(),
        ..Diagnostics::default()
    };
    let mut valid = Vec::with_capacity(records.len());

    for record in records {
        match normalize(record, config) {
            Ok(v) => {
                if v.clamped {
                    diagnostics.clamped += 1;
                }
                valid.push(v);
            }
            Err(reason) => {
                debug!(test = %record.test_name, source = ?record.source, %reason, "dropping record");
                diagnostics.record_drop(reason);
            }
        }
    }

    diagnostics.accepted = valid.len();
    (valid, diagnostics)
}

/// Run the whole summarization pipeline over one batch.
pub fn summarize(records: &[RawRecord], config: &SummaryConfig, order: RunOrder) -> SummaryOutcome {
    let (valid, diagnostics) = normalize_all(records, config);

    info!(
        total = diagnostics.total,
        accepted = diagnostics.accepted,
        dropped = diagnostics.dropped_total(),
        clamped = diagnostics.clamped,
        "normalized test records"
    );

    if valid.is_empty() {
        warn!(total = diagnostics.total, "no valid test records to summarize");
        return SummaryOutcome::NoData(diagnostics);
    }

    let summaries = aggregate(&valid, order, config.row_order);
    let table = pivot(&summaries);

    SummaryOutcome::Summarized(SummaryReport {
        order,
        unit: config.duration_unit,
        summaries,
        table,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login_batch() -> Vec<RawRecord> {
        vec![
            RawRecord::new("Login", Some("05/19/2025 10:00:00"), Some("05/19/2025 10:02:30")),
            RawRecord::new("Login", Some("05/19/2025 11:00:00"), Some("05/19/2025 11:01:00")),
            RawRecord::new("Logout", Some("05/19/2025 12:00:00"), Some("05/19/2025 12:00:45")),
        ]
    }

    #[test]
    fn test_summarize_login_logout() {
        let outcome = summarize(&login_batch(), &SummaryConfig::default(), RunOrder::Chronological);
        let report = outcome.report().expect("batch has valid records");

        assert_eq!(report.summaries.len(), 2);
        let login = &report.summaries[0];
        assert_eq!(login.test_name, "Login");
        assert_eq!(login.run_count, 2);
        assert_eq!(login.total_duration, 3.5);
        assert_eq!(login.max_duration, 2.5);
        assert_eq!(login.ordered_durations, vec![2.5, 1.0]);

        let logout = &report.summaries[1];
        assert_eq!(logout.run_count, 1);
        assert_eq!(logout.total_duration, 0.75);
        assert_eq!(logout.ordered_durations, vec![0.75]);

        assert_eq!(report.table.run_columns(), 2);
        assert_eq!(report.diagnostics.accepted, 3);
    }

    #[test]
    fn test_empty_batch_is_no_data() {
        let outcome = summarize(&[], &SummaryConfig::default(), RunOrder::Chronological);
        assert!(matches!(outcome, SummaryOutcome::NoData(ref d) if d.total == 0));
    }

    #[test]
    fn test_all_invalid_is_no_data_with_tally() {
        let records = vec![
            RawRecord::new("A", None, Some("05/19/2025 10:00:00")),
            RawRecord::new("B", Some("not a time"), Some("05/19/2025 10:00:00")),
            RawRecord::new("", Some("05/19/2025 10:00:00"), Some("05/19/2025 10:01:00")),
        ];

        let outcome = summarize(&records, &SummaryConfig::default(), RunOrder::Ranked);
        let SummaryOutcome::NoData(diagnostics) = outcome else {
            panic!("expected no data");
        };
        assert_eq!(diagnostics.total, 3);
        assert_eq!(diagnostics.accepted, 0);
        assert_eq!(diagnostics.dropped.get(&DropReason::MissingStart), Some(&1));
        assert_eq!(diagnostics.dropped.get(&DropReason::MalformedStart), Some(&1));
        assert_eq!(diagnostics.dropped.get(&DropReason::MissingName), Some(&1));
        assert_eq!(diagnostics.dropped_total(), 3);
    }

    #[test]
    fn test_clamped_records_are_counted() {
        let records = vec![RawRecord::new(
            "Backwards",
            Some("05/19/2025 10:05:00"),
            Some("05/19/2025 10:00:00"),
        )];
        let outcome = summarize(&records, &SummaryConfig::default(), RunOrder::Chronological);
        assert_eq!(outcome.diagnostics().clamped, 1);
        let report = outcome.report().unwrap();
        assert_eq!(report.summaries[0].ordered_durations, vec![0.0]);
    }

    #[test]
    fn test_effective_end_time_prefers_explicit() {
        let mut record = RawRecord::new("A", Some("2025-05-19 10:00:00"), Some(" 2025-05-19 10:09:00 "));
        record.step_timestamps = vec!["10:04:30".to_string()];
        assert_eq!(record.effective_end_time().as_deref(), Some("2025-05-19 10:09:00"));

        record.end_time = Some("   ".to_string());
        assert_eq!(record.effective_end_time().as_deref(), Some("2025-05-19 10:04:30"));
    }

    #[test]
    fn test_outcome_serializes_with_tag() {
        let outcome = summarize(&[], &SummaryConfig::default(), RunOrder::Chronological);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "no-data");
    }
}
