//! Summary tables written as CSV.

use std::path::Path;

use super::TableError;
use crate::summary::{StatusCount, TestStats, WideTable};

fn write_rows<I>(path: &Path, headers: &[String], rows: I) -> Result<(), TableError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let csv_err = |source| TableError::Csv {
        path: path.display().to_string(),
        source,
    };

    let mut writer = csv::WriterBuilder::new()
        .flexible(false)
        .from_path(path)
        .map_err(csv_err)?;
    writer.write_record(headers).map_err(csv_err)?;
    for row in rows {
        writer.write_record(&row).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| TableError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Write the wide summary; padded run cells are left empty.
pub fn write_wide(path: &Path, table: &WideTable) -> Result<(), TableError> {
    write_rows(path, &table.headers, table.rows.iter().map(|row| row.cells()))
}

pub fn write_status_counts(path: &Path, counts: &[StatusCount]) -> Result<(), TableError> {
    let headers = vec!["Test Status".to_string(), "Count".to_string()];
    write_rows(
        path,
        &headers,
        counts.iter().map(|c| vec![c.status.clone(), c.count.to_string()]),
    )
}

pub fn write_stats(path: &Path, stats: &[TestStats], unit: &str) -> Result<(), TableError> {
    let headers = vec![
        "Test Name".to_string(),
        "Number of Runs".to_string(),
        format!("Total Duration ({unit})"),
        format!("Average Duration ({unit})"),
        format!("Longest Duration ({unit})"),
        format!("Shortest Duration ({unit})"),
    ];
    write_rows(
        path,
        &headers,
        stats.iter().map(|s| {
            vec![
                s.test_name.clone(),
                s.runs.to_string(),
                s.total.to_string(),
                s.mean.to_string(),
                s.longest.to_string(),
                s.shortest.to_string(),
            ]
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::{pivot, TestDurationSummary};

    #[test]
    fn test_write_wide_pads_with_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");

        let table = pivot(&[
            TestDurationSummary {
                test_name: "Login".to_string(),
                run_count: 2,
                total_duration: 3.5,
                max_duration: 2.5,
                ordered_durations: vec![2.5, 1.0],
            },
            TestDurationSummary {
                test_name: "Logout".to_string(),
                run_count: 1,
                total_duration: 0.75,
                max_duration: 0.75,
                ordered_durations: vec![0.75],
            },
        ]);
        write_wide(&path, &table).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "Test Name,Count,Total_Time,Max_Time,run-1,run-2\n\
             Login,2,3.5,2.5,2.5,1\n\
             Logout,1,0.75,0.75,0.75,\n"
        );
    }

    #[test]
    fn test_write_status_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("status.csv");
        let counts = vec![
            StatusCount { status: "pass".to_string(), count: 3 },
            StatusCount { status: "fail".to_string(), count: 1 },
        ];
        write_status_counts(&path, &counts).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Test Status,Count\npass,3\nfail,1\n");
    }

    #[test]
    fn test_write_stats_headers_carry_unit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        let stats = vec![TestStats {
            test_name: "Login".to_string(),
            runs: 2,
            total: 3.5,
            mean: 1.75,
            shortest: 1.0,
            longest: 2.5,
        }];
        write_stats(&path, &stats, "minutes").unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Test Name,Number of Runs,Total Duration (minutes),"));
        assert!(text.contains("Login,2,3.5,1.75,2.5,1\n"));
    }
}
