//! Group valid records by test name.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{round2, TestDurationSummary, ValidRecord};
use crate::config::RowOrder;

/// How the per-run durations of a test are ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunOrder {
    /// By the start time of each run, earliest first.
    #[default]
    Chronological,
    /// By duration, longest first.
    Ranked,
}

/// Build one summary per test, ordering each test's runs as `order` says.
pub fn aggregate(records: &[ValidRecord], order: RunOrder, rows: RowOrder) -> Vec<TestDurationSummary> {
    match order {
        RunOrder::Chronological => ordered_by_time(records, rows),
        RunOrder::Ranked => ranked_by_duration(records, rows),
    }
}

/// Summaries whose `ordered_durations` follow run start time, ascending.
/// Runs that started at the same instant keep their input order.
pub fn ordered_by_time(records: &[ValidRecord], rows: RowOrder) -> Vec<TestDurationSummary> {
    build(records, rows, |runs| runs.sort_by_key(|r| r.start))
}

/// Summaries whose `ordered_durations` are sorted longest first.
pub fn ranked_by_duration(records: &[ValidRecord], rows: RowOrder) -> Vec<TestDurationSummary> {
    build(records, rows, |runs| {
        runs.sort_by(|a, b| b.duration.total_cmp(&a.duration))
    })
}

fn build<F>(records: &[ValidRecord], rows: RowOrder, sort_runs: F) -> Vec<TestDurationSummary>
where
    F: Fn(&mut Vec<&ValidRecord>),
{
    let mut summaries: Vec<TestDurationSummary> = group_first_seen(records)
        .into_iter()
        .map(|(test_name, mut runs)| {
            sort_runs(&mut runs);
            summarize_group(test_name, &runs)
        })
        .collect();

    if rows == RowOrder::TotalDescending {
        summaries.sort_by(|a, b| b.total_duration.total_cmp(&a.total_duration));
    }

    summaries
}

/// Group records by name, keeping groups in order of first appearance.
fn group_first_seen(records: &[ValidRecord]) -> Vec<(&str, Vec<&ValidRecord>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&ValidRecord>)> = Vec::new();

    for record in records {
        let name = record.test_name.as_str();
        match index.get(name) {
            Some(&i) => groups[i].1.push(record),
            None => {
                index.insert(name, groups.len());
                groups.push((name, vec![record]));
            }
        }
    }

    groups
}

fn summarize_group(test_name: &str, runs: &[&ValidRecord]) -> TestDurationSummary {
    let ordered_durations: Vec<f64> = runs.iter().map(|r| r.duration).collect();
    let total: f64 = ordered_durations.iter().sum();
    let max_duration = ordered_durations
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);

    TestDurationSummary {
        test_name: test_name.to_string(),
        run_count: ordered_durations.len(),
        total_duration: round2(total),
        max_duration,
        ordered_durations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn run(name: &str, start: &str, duration: f64) -> ValidRecord {
        let start = NaiveDateTime::parse_from_str(start, "%Y-%m-%d %H:%M:%S").unwrap();
        ValidRecord {
            test_name: name.to_string(),
            start,
            end: start,
            duration,
            clamped: false,
        }
    }

    fn batch() -> Vec<ValidRecord> {
        vec![
            run("Search", "2025-05-19 12:00:00", 1.25),
            run("Login", "2025-05-19 11:00:00", 1.0),
            run("Login", "2025-05-19 10:00:00", 2.5),
            run("Search", "2025-05-19 09:00:00", 4.0),
            run("Login", "2025-05-19 12:30:00", 0.5),
        ]
    }

    #[test]
    fn test_chronological_runs_follow_start_time() {
        let summaries = ordered_by_time(&batch(), RowOrder::FirstSeen);

        assert_eq!(summaries[0].test_name, "Search");
        assert_eq!(summaries[0].ordered_durations, vec![4.0, 1.25]);
        assert_eq!(summaries[1].test_name, "Login");
        assert_eq!(summaries[1].ordered_durations, vec![2.5, 1.0, 0.5]);
    }

    #[test]
    fn test_ranked_runs_longest_first() {
        let summaries = ranked_by_duration(&batch(), RowOrder::FirstSeen);
        assert_eq!(summaries[1].ordered_durations, vec![2.5, 1.0, 0.5]);
        assert_eq!(summaries[0].ordered_durations, vec![4.0, 1.25]);
    }

    #[test]
    fn test_orders_differ_when_chronology_disagrees_with_magnitude() {
        let records = vec![
            run("Export", "2025-05-19 10:00:00", 0.5),
            run("Export", "2025-05-19 11:00:00", 3.0),
        ];
        assert_eq!(
            aggregate(&records, RunOrder::Chronological, RowOrder::FirstSeen)[0].ordered_durations,
            vec![0.5, 3.0]
        );
        assert_eq!(
            aggregate(&records, RunOrder::Ranked, RowOrder::FirstSeen)[0].ordered_durations,
            vec![3.0, 0.5]
        );
    }

    #[test]
    fn test_stats_match_durations() {
        let summaries = ordered_by_time(&batch(), RowOrder::FirstSeen);
        let login = &summaries[1];
        assert_eq!(login.run_count, 3);
        assert_eq!(login.total_duration, 4.0);
        assert_eq!(login.max_duration, 2.5);
    }

    #[test]
    fn test_total_descending_rows() {
        let records = vec![
            run("Short", "2025-05-19 10:00:00", 1.0),
            run("Long", "2025-05-19 10:00:00", 9.0),
            run("Tie", "2025-05-19 10:00:00", 1.0),
        ];
        let names: Vec<_> = ordered_by_time(&records, RowOrder::TotalDescending)
            .into_iter()
            .map(|s| s.test_name)
            .collect();
        assert_eq!(names, vec!["Long", "Short", "Tie"]);
    }

    #[test]
    fn test_ties_on_start_keep_input_order() {
        let records = vec![
            run("Retry", "2025-05-19 10:00:00", 0.3),
            run("Retry", "2025-05-19 10:00:00", 0.1),
        ];
        assert_eq!(
            ordered_by_time(&records, RowOrder::FirstSeen)[0].ordered_durations,
            vec![0.3, 0.1]
        );
    }

    #[test]
    fn test_total_is_rounded() {
        let records = vec![
            run("Sum", "2025-05-19 10:00:00", 0.1),
            run("Sum", "2025-05-19 10:01:00", 0.2),
        ];
        assert_eq!(ordered_by_time(&records, RowOrder::FirstSeen)[0].total_duration, 0.3);
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let first = aggregate(&batch(), RunOrder::Chronological, RowOrder::FirstSeen);
        let second = aggregate(&batch(), RunOrder::Chronological, RowOrder::FirstSeen);
        assert_eq!(first, second);
    }
}
