//! Test records extracted from Extent-style HTML reports.
//!
//! Each test is an `<li>` under `<ul class="test-collection">` (older
//! templates use `<li class="test">` directly). Inside, the fields live in
//! `span.test-name`, `span.test-status`, `span.test-started-time`,
//! `span.test-ended-time`, and the step log carries `td.timestamp` cells.

pub mod markup;

use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::summary::RawRecord;
use markup::{Document, Element, Fragment};

/// Placeholder for a missing test name or status.
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to read report {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Read a report file (invalid UTF-8 is replaced, not rejected) and extract
/// its records, tagged with the file name.
pub fn extract_file(path: &Path) -> Result<Vec<RawRecord>, ReportError> {
    let bytes = std::fs::read(path).map_err(|source| ReportError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let html = String::from_utf8_lossy(&bytes);
    let source = path.file_name().map(|n| n.to_string_lossy().into_owned());

    let records = extract_records(&html, source.as_deref());
    debug!(path = %path.display(), records = records.len(), "extracted report");
    Ok(records)
}

/// Extract one record per test container in `html`.
pub fn extract_records(html: &str, source: Option<&str>) -> Vec<RawRecord> {
    let doc = Document::new(html);
    let root = doc.root();

    let collections = root.elements("ul", Some("test-collection"));
    if collections.is_empty() {
        return root
            .elements("li", Some("test"))
            .iter()
            .map(|test| read_test(root.inner(test), source))
            .collect();
    }

    let mut records = Vec::new();
    for collection in &collections {
        let scope = root.inner(collection);
        records.extend(
            scope
                .elements("li", None)
                .iter()
                .map(|test| read_test(scope.inner(test), source)),
        );
    }
    records
}

fn read_test(test: Fragment<'_>, source: Option<&str>) -> RawRecord {
    let text_of = |class: &str| -> Option<String> {
        test.first("span", Some(class))
            .map(|el| test.text(&el))
            .filter(|t| !t.is_empty())
    };

    let test_name = text_of("test-name").unwrap_or_else(|| UNKNOWN.to_string());
    let status = text_of("test-status").unwrap_or_else(|| UNKNOWN.to_string());
    let start_time = text_of("test-started-time").or_else(|| labelled_value(test, "Start Time"));
    let end_time = text_of("test-ended-time").or_else(|| labelled_value(test, "End Time"));

    let step_timestamps = test
        .elements("td", Some("timestamp"))
        .iter()
        .map(|el| test.text(el))
        .filter(|t| !t.is_empty())
        .collect();

    RawRecord {
        test_name,
        status,
        start_time,
        end_time,
        step_timestamps,
        source: source.map(str::to_string),
    }
}

/// Text of the span following a `<span>Label</span>` caption.
fn labelled_value(test: Fragment<'_>, label: &str) -> Option<String> {
    let spans: Vec<Element> = test.elements("span", None);
    let at = spans
        .iter()
        .position(|el| test.text(el).eq_ignore_ascii_case(label))?;
    spans
        .get(at + 1)
        .map(|el| test.text(el))
        .filter(|t| !t.is_empty())
}
