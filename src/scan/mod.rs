//! Report discovery under a folder tree.

pub mod processed;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::ScanConfig;
use crate::report;
use crate::summary::RawRecord;

pub use processed::ProcessedSet;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("report folder {path} does not exist or is not a directory")]
    NotADirectory { path: String },
}

/// A report that could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Records gathered by one scan plus the updated processed set.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub records: Vec<RawRecord>,
    pub processed: ProcessedSet,
    /// Reports parsed during this scan, in walk order.
    pub parsed: Vec<PathBuf>,
    pub skipped: usize,
    pub failures: Vec<ScanFailure>,
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// All files under `root` whose extension is in `extensions`, sorted.
pub fn find_reports(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotADirectory {
            path: root.display().to_string(),
        });
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();
        if entry.file_type().is_file() && has_extension(path, extensions) {
            found.push(path.to_path_buf());
        }
    }

    found.sort();
    Ok(found)
}

/// Extract every report under `root` not already in `processed`.
///
/// A report that fails to read is recorded in `failures` and the walk goes
/// on. A report is added to the processed set only if it yielded records.
/// Skipping consults the incoming set only, so same-named reports in
/// different folders are all read within one scan.
pub fn scan_reports(root: &Path, mut processed: ProcessedSet, config: &ScanConfig) -> Result<ScanOutcome, ScanError> {
    let candidates = find_reports(root, &config.extensions)?;
    let seen = processed.clone();
    info!(root = %root.display(), candidates = candidates.len(), "scanning for reports");

    let mut records = Vec::new();
    let mut parsed = Vec::new();
    let mut failures = Vec::new();
    let mut skipped = 0;

    for path in candidates {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if seen.contains(&name) {
            skipped += 1;
            continue;
        }

        info!(path = %path.display(), "processing report");
        match report::extract_file(&path) {
            Ok(found) => {
                if !found.is_empty() {
                    processed.insert(&name);
                }
                records.extend(found);
                parsed.push(path);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read report");
                failures.push(ScanFailure {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        parsed = parsed.len(),
        skipped,
        failed = failures.len(),
        records = records.len(),
        "scan complete"
    );

    Ok(ScanOutcome {
        records,
        processed,
        parsed,
        skipped,
        failures,
    })
}
