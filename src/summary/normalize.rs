//! Timestamp parsing and per-record duration.

use chrono::NaiveDateTime;

use super::{non_blank, DropReason, RawRecord, ValidRecord};
use crate::config::SummaryConfig;

/// Round to two decimal places, folding `-0.0` into `0.0`.
pub fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Rebuild an end time from the last step timestamp and the date token of
/// `start`.
///
/// Only applies when `start` is exactly `<date> <time>`; anything else has no
/// date portion we can trust.
pub fn derive_end_time(start: &str, step_timestamps: &[String]) -> Option<String> {
    let mut tokens = start.split_whitespace();
    let date = tokens.next()?;
    tokens.next()?;
    if tokens.next().is_some() {
        return None;
    }

    let last_step = step_timestamps
        .iter()
        .rev()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())?;

    Some(format!("{date} {last_step}"))
}

fn parse_timestamp(value: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), format).ok()
}

/// Validate one record and compute its duration.
///
/// Missing or unparsable timestamps drop the record. A negative duration is
/// clamped to zero when the config asks for it, then rounded to two decimals.
pub fn normalize(record: &RawRecord, config: &SummaryConfig) -> Result<ValidRecord, DropReason> {
    let test_name = record.test_name.trim();
    if test_name.is_empty() {
        return Err(DropReason::MissingName);
    }

    let start_str = non_blank(record.start_time.as_deref()).ok_or(DropReason::MissingStart)?;
    let end_str = record.effective_end_time().ok_or(DropReason::MissingEnd)?;

    let start = parse_timestamp(start_str, &config.timestamp_format).ok_or(DropReason::MalformedStart)?;
    let end = parse_timestamp(&end_str, &config.timestamp_format).ok_or(DropReason::MalformedEnd)?;

    let raw = config
        .duration_unit
        .from_millis(end.signed_duration_since(start).num_milliseconds());
    let clamped = config.clamp_negative_durations && raw < 0.0;
    let duration = if clamped { 0.0 } else { round2(raw) };

    Ok(ValidRecord {
        test_name: test_name.to_string(),
        start,
        end,
        duration,
        clamped,
    })
}
