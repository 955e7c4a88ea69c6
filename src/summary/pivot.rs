//! Spread each test's duration list into fixed `run-N` columns.

use serde::Serialize;

use super::TestDurationSummary;

/// Leading columns of the wide table, before the `run-N` columns.
pub const FIXED_COLUMNS: [&str; 4] = ["Test Name", "Count", "Total_Time", "Max_Time"];

/// One test's row in the wide table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WideRow {
    pub test_name: String,
    pub run_count: usize,
    pub total_duration: f64,
    pub max_duration: f64,
    /// Exactly `run_columns` cells; tests with fewer runs are padded with `None`.
    pub runs: Vec<Option<f64>>,
}

impl WideRow {
    /// Render the row as text cells, empty for padded runs.
    pub fn cells(&self) -> Vec<String> {
        let mut cells = Vec::with_capacity(FIXED_COLUMNS.len() + self.runs.len());
        cells.push(self.test_name.clone());
        cells.push(self.run_count.to_string());
        cells.push(self.total_duration.to_string());
        cells.push(self.max_duration.to_string());
        cells.extend(
            self.runs
                .iter()
                .map(|cell| cell.map(|d| d.to_string()).unwrap_or_default()),
        );
        cells
    }
}

/// Test summaries reshaped for a tabular writer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WideTable {
    pub headers: Vec<String>,
    pub rows: Vec<WideRow>,
}

impl WideTable {
    /// Number of `run-N` columns.
    pub fn run_columns(&self) -> usize {
        self.headers.len().saturating_sub(FIXED_COLUMNS.len())
    }
}

/// Pivot summaries into a table with `max(run_count)` run columns.
pub fn pivot(summaries: &[TestDurationSummary]) -> WideTable {
    let width = summaries.iter().map(|s| s.run_count).max().unwrap_or(0);

    let mut headers: Vec<String> = FIXED_COLUMNS.iter().map(|c| c.to_string()).collect();
    headers.extend((1..=width).map(|i| format!("run-{i}")));

    let rows = summaries
        .iter()
        .map(|s| {
            let mut runs: Vec<Option<f64>> = s.ordered_durations.iter().copied().map(Some).collect();
            runs.resize(width, None);
            WideRow {
                test_name: s.test_name.clone(),
                run_count: s.run_count,
                total_duration: s.total_duration,
                max_duration: s.max_duration,
                runs,
            }
        })
        .collect();

    WideTable { headers, rows }
}
