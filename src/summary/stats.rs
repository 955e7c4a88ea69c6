//! Descriptive statistics and status tallies.

use std::collections::HashMap;

use serde::Serialize;

use super::{round2, RawRecord, ValidRecord};

/// Count / total / mean / shortest / longest for one test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestStats {
    pub test_name: String,
    pub runs: usize,
    pub total: f64,
    pub mean: f64,
    /// Shortest non-zero run, or zero when every run was zero.
    pub shortest: f64,
    pub longest: f64,
}

/// Per-test statistics in first-seen order.
pub fn describe(records: &[ValidRecord]) -> Vec<TestStats> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<f64>)> = Vec::new();

    for record in records {
        let name = record.test_name.as_str();
        match index.get(name) {
            Some(&i) => groups[i].1.push(record.duration),
            None => {
                index.insert(name, groups.len());
                groups.push((name, vec![record.duration]));
            }
        }
    }

    groups
        .into_iter()
        .map(|(name, durations)| {
            let runs = durations.len();
            let total: f64 = durations.iter().sum();
            let longest = durations.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let shortest = durations
                .iter()
                .copied()
                .filter(|d| *d > 0.0)
                .fold(f64::INFINITY, f64::min);

            TestStats {
                test_name: name.to_string(),
                runs,
                total: round2(total),
                mean: round2(total / runs as f64),
                shortest: if shortest.is_finite() { shortest } else { 0.0 },
                longest,
            }
        })
        .collect()
}

/// Number of records per status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: usize,
}

/// Tally raw records by status, most frequent first, then by name.
///
/// Blank statuses are counted as `Unknown`.
pub fn status_counts(records: &[RawRecord]) -> Vec<StatusCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in records {
        let status = match record.status.trim() {
            "" => "Unknown",
            s => s,
        };
        *counts.entry(status.to_string()).or_insert(0) += 1;
    }

    let mut tally: Vec<StatusCount> = counts
        .into_iter()
        .map(|(status, count)| StatusCount { status, count })
        .collect();
    tally.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.status.cmp(&b.status)));
    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn run(name: &str, duration: f64) -> ValidRecord {
        let at = NaiveDateTime::parse_from_str("2025-05-19 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        ValidRecord {
            test_name: name.to_string(),
            start: at,
            end: at,
            duration,
            clamped: false,
        }
    }

    #[test]
    fn test_describe() {
        let stats = describe(&[run("Login", 2.5), run("Logout", 0.75), run("Login", 1.0), run("Login", 0.0)]);

        assert_eq!(stats.len(), 2);
        let login = &stats[0];
        assert_eq!(login.runs, 3);
        assert_eq!(login.total, 3.5);
        assert_eq!(login.mean, 1.17);
        assert_eq!(login.shortest, 1.0);
        assert_eq!(login.longest, 2.5);
        assert_eq!(stats[1].mean, 0.75);
    }

    #[test]
    fn test_shortest_all_zero() {
        let stats = describe(&[run("Noop", 0.0), run("Noop", 0.0)]);
        assert_eq!(stats[0].shortest, 0.0);
        assert_eq!(stats[0].longest, 0.0);
    }

    #[test]
    fn test_status_counts() {
        let mut records = Vec::new();
        for status in ["pass", "fail", "pass", "", "skip", "fail", "pass"] {
            let mut r = RawRecord::new("T", None, None);
            r.status = status.to_string();
            records.push(r);
        }

        let tally = status_counts(&records);
        let flat: Vec<(&str, usize)> = tally.iter().map(|c| (c.status.as_str(), c.count)).collect();
        assert_eq!(flat, vec![("pass", 3), ("fail", 2), ("Unknown", 1), ("skip", 1)]);
    }
}
