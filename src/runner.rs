//! End-to-end flows behind the CLI subcommands.
//!
//! Each flow reads its inputs, runs the summarizer, and writes CSV files
//! only when there is something to write.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::scan::{self, ProcessedSet, ScanOutcome};
use crate::summary::{self, RunOrder, SummaryOutcome};
use crate::table;

/// Run-details CSV written by `extract` and `digest`.
pub const DETAILS_FILE: &str = "test_run_details.csv";
/// Wide summary CSV.
pub const SUMMARY_FILE: &str = "test_duration_summary.csv";
/// Status tally CSV written by `digest`.
pub const STATUS_FILE: &str = "test_status_counts.csv";

/// What a flow wrote, for the CLI to report.
#[derive(Debug)]
pub struct FlowReport {
    pub scan: Option<ScanOutcome>,
    pub summary: Option<SummaryOutcome>,
    pub written: Vec<PathBuf>,
}

/// Load the processed set for `root`, or start empty when reprocessing.
fn starting_set(root: &Path, config: &AppConfig) -> Result<(PathBuf, ProcessedSet)> {
    let log_path = root.join(&config.scan.processed_log);
    if config.scan.reprocess_all {
        return Ok((log_path, ProcessedSet::new()));
    }
    let set = ProcessedSet::load(&log_path)?;
    info!(path = %log_path.display(), entries = set.len(), "loaded processed log");
    Ok((log_path, set))
}

fn scan_folder(root: &Path, config: &AppConfig) -> Result<ScanOutcome> {
    let (log_path, processed) = starting_set(root, config)?;
    let outcome = scan::scan_reports(root, processed, &config.scan)?;
    outcome.processed.save(&log_path)?;
    Ok(outcome)
}

/// Extract every new report under `root` into a run-details CSV.
pub fn extract_folder(root: &Path, output: Option<&Path>, config: &AppConfig) -> Result<FlowReport> {
    let scan = scan_folder(root, config)?;
    let mut written = Vec::new();

    if scan.records.is_empty() {
        warn!(root = %root.display(), "no new test records found, nothing written");
    } else {
        let path = output.map(Path::to_path_buf).unwrap_or_else(|| root.join(DETAILS_FILE));
        table::write_records(&path, &scan.records, &config.columns)
            .with_context(|| format!("failed to write run details: {}", path.display()))?;
        info!(path = %path.display(), records = scan.records.len(), "wrote run details");
        written.push(path);
    }

    Ok(FlowReport {
        scan: Some(scan),
        summary: None,
        written,
    })
}

/// Summarize a run-details CSV into a wide summary CSV.
///
/// The default output sits next to the input.
pub fn summarize_file(input: &Path, output: Option<&Path>, order: RunOrder, config: &AppConfig) -> Result<FlowReport> {
    let records = table::read_records(input, &config.columns)
        .with_context(|| format!("failed to read run details: {}", input.display()))?;
    let outcome = summary::summarize(&records, &config.summary, order);

    let mut written = Vec::new();
    if let SummaryOutcome::Summarized(report) = &outcome {
        let path = output.map(Path::to_path_buf).unwrap_or_else(|| {
            input
                .parent()
                .map(|dir| dir.join(SUMMARY_FILE))
                .unwrap_or_else(|| PathBuf::from(SUMMARY_FILE))
        });
        table::write_wide(&path, &report.table)
            .with_context(|| format!("failed to write summary: {}", path.display()))?;
        info!(path = %path.display(), tests = report.summaries.len(), "wrote duration summary");
        written.push(path);
    }

    Ok(FlowReport {
        scan: None,
        summary: Some(outcome),
        written,
    })
}

/// Extract, summarize and tally statuses for every new report under `root`,
/// writing all outputs into `root`.
pub fn digest_folder(root: &Path, order: RunOrder, config: &AppConfig) -> Result<FlowReport> {
    let scan = scan_folder(root, config)?;
    let mut written = Vec::new();

    if scan.records.is_empty() {
        warn!(root = %root.display(), "no new test records found, nothing written");
        return Ok(FlowReport {
            scan: Some(scan),
            summary: None,
            written,
        });
    }

    let details = root.join(DETAILS_FILE);
    table::write_records(&details, &scan.records, &config.columns)
        .with_context(|| format!("failed to write run details: {}", details.display()))?;
    written.push(details);

    let statuses = root.join(STATUS_FILE);
    table::write_status_counts(&statuses, &summary::status_counts(&scan.records))
        .with_context(|| format!("failed to write status counts: {}", statuses.display()))?;
    written.push(statuses);

    let outcome = summary::summarize(&scan.records, &config.summary, order);
    if let SummaryOutcome::Summarized(report) = &outcome {
        let path = root.join(SUMMARY_FILE);
        table::write_wide(&path, &report.table)
            .with_context(|| format!("failed to write summary: {}", path.display()))?;
        written.push(path);
    }

    info!(root = %root.display(), files = written.len(), "digest complete");
    Ok(FlowReport {
        scan: Some(scan),
        summary: Some(outcome),
        written,
    })
}

/// Per-test descriptive statistics for a run-details CSV.
pub fn stats_file(input: &Path, config: &AppConfig) -> Result<Vec<summary::TestStats>> {
    let records = table::read_records(input, &config.columns)
        .with_context(|| format!("failed to read run details: {}", input.display()))?;
    let (valid, diagnostics) = summary::normalize_all(&records, &config.summary);
    info!(
        accepted = diagnostics.accepted,
        dropped = diagnostics.dropped_total(),
        "normalized test records"
    );
    Ok(summary::describe(&valid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const REPORT: &str = r#"<ul class="test-collection">
<li><span class="test-name">Login</span><span class="test-status">pass</span>
<span class="test-started-time">05/19/2025 10:00:00</span>
<span class="test-ended-time">05/19/2025 10:02:30</span></li>
<li><span class="test-name">Login</span><span class="test-status">fail</span>
<span class="test-started-time">05/19/2025 11:00:00</span>
<span class="test-ended-time"></span>
<table><tr><td class="timestamp">11:00:30</td></tr><tr><td class="timestamp">11:01:00</td></tr></table></li>
<li><span class="test-name">Logout</span><span class="test-status">pass</span>
<span class="test-started-time">05/19/2025 12:00:00</span>
<span class="test-ended-time">05/19/2025 12:00:45</span></li>
</ul>"#;

    #[test]
    fn test_digest_folder_writes_all_outputs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("run.html"), REPORT).unwrap();

        let report = digest_folder(dir.path(), RunOrder::Chronological, &AppConfig::default()).unwrap();
        assert_eq!(report.written.len(), 3);

        let summary = fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap();
        assert_eq!(
            summary,
            "Test Name,Count,Total_Time,Max_Time,run-1,run-2\n\
             Login,2,3.5,2.5,2.5,1\n\
             Logout,1,0.75,0.75,0.75,\n"
        );

        let statuses = fs::read_to_string(dir.path().join(STATUS_FILE)).unwrap();
        assert_eq!(statuses, "Test Status,Count\npass,2\nfail,1\n");

        let log = fs::read_to_string(dir.path().join("processed_files.csv")).unwrap();
        assert_eq!(log, "filename\nrun.html\n");
    }

    #[test]
    fn test_digest_respects_processed_log() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("run.html"), REPORT).unwrap();
        fs::write(dir.path().join("processed_files.csv"), "filename\nrun.html\n").unwrap();

        let mut config = AppConfig::default();
        config.scan.reprocess_all = false;

        let report = digest_folder(dir.path(), RunOrder::Chronological, &config).unwrap();
        assert!(report.written.is_empty());
        assert!(report.summary.is_none());
        assert!(!dir.path().join(SUMMARY_FILE).exists());
    }

    #[test]
    fn test_summarize_file_no_data_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("details.csv");
        fs::write(&input, "Test Name,Test Start Time,Test End Time\nLogin,garbage,\n").unwrap();

        let report = summarize_file(&input, None, RunOrder::Chronological, &AppConfig::default()).unwrap();
        assert!(report.written.is_empty());
        assert!(matches!(report.summary, Some(SummaryOutcome::NoData(_))));
        assert!(!dir.path().join(SUMMARY_FILE).exists());
    }

    #[test]
    fn test_extract_then_summarize_ranked() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("run.html"), REPORT).unwrap();

        let extracted = extract_folder(dir.path(), None, &AppConfig::default()).unwrap();
        let details = extracted.written[0].clone();
        assert_eq!(details, dir.path().join(DETAILS_FILE));

        let out = dir.path().join("ranked.csv");
        summarize_file(&details, Some(&out), RunOrder::Ranked, &AppConfig::default()).unwrap();
        let text = fs::read_to_string(&out).unwrap();
        assert!(text.contains("Login,2,3.5,2.5,2.5,1\n"));
    }

    #[test]
    fn test_stats_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("details.csv");
        fs::write(
            &input,
            "Test Name,Test Start Time,Test End Time\n\
             Login,05/19/2025 10:00:00,05/19/2025 10:02:30\n\
             Login,05/19/2025 11:00:00,05/19/2025 11:01:00\n",
        )
        .unwrap();

        let stats = stats_file(&input, &AppConfig::default()).unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].mean, 1.75);
        assert_eq!(stats[0].shortest, 1.0);
    }
}
