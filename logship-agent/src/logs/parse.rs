//! Dual-format access-log line parsing.
//!
//! Lines starting with `{` decode as JSON objects; everything else is
//! matched against a fixed Common Log Format shape. A line matching
//! neither yields no record; it stays in raw line output upstream but is
//! excluded from structured views.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use thiserror::Error;

use logship_protocol::record::AccessLogRecord;

/// CLF shape: client, user, timestamp, request triple, status, size,
/// referer, user agent, request count, router, service URL, duration in
/// milliseconds.
static CLF_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(\S+) - (\S+) \[([^\]]+)\] "(\S+) (\S+) (\S+)" (\d+) (\d+) "([^"]*)" "([^"]*)" (\d+) "([^"]*)" "([^"]*)" (\d+)ms"#,
    )
    .unwrap()
});

const CLF_TIME_LAYOUT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Why a single line failed to parse.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid JSON log line: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse one raw line into a structured record.
///
/// `Ok(None)` means the line is empty or matches no known format; an
/// `Err` is a malformed JSON line. Batch callers treat both the same way:
/// the line is omitted from structured output.
pub fn parse_line(line: &str) -> std::result::Result<Option<AccessLogRecord>, ParseError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    if trimmed.starts_with('{') {
        let record: AccessLogRecord = serde_json::from_str(trimmed)?;
        return Ok(Some(record));
    }

    Ok(parse_clf(trimmed))
}

fn parse_clf(line: &str) -> Option<AccessLogRecord> {
    let caps = CLF_REGEX.captures(line)?;

    let timestamp = DateTime::parse_from_str(&caps[3], CLF_TIME_LAYOUT)
        .ok()
        .map(|t| t.with_timezone(&Utc));
    let status: u16 = caps[7].parse().unwrap_or_default();
    let content_size: i64 = caps[8].parse().unwrap_or_default();
    let request_count: u32 = caps[11].parse().unwrap_or_default();
    let duration_ms: i64 = caps[14].parse().unwrap_or_default();

    Some(AccessLogRecord {
        client_host: caps[1].to_string(),
        client_username: caps[2].to_string(),
        request_method: caps[4].to_string(),
        request_path: caps[5].to_string(),
        request_protocol: caps[6].to_string(),
        // CLF carries one status and size; mirror them into both the
        // origin and downstream fields like the JSON form fills them
        origin_status: status,
        downstream_status: status,
        origin_content_size: content_size,
        downstream_content_size: content_size,
        request_referer: caps[9].to_string(),
        request_user_agent: caps[10].to_string(),
        request_count,
        router_name: caps[12].to_string(),
        service_url: caps[13].to_string(),
        duration: duration_ms * 1_000_000,
        start_utc: timestamp,
        start_local: timestamp,
        ..AccessLogRecord::default()
    })
}

/// Parse a batch of lines, preserving input order.
///
/// Unparseable lines are dropped, so the output may legitimately be
/// shorter than the input.
pub fn parse_lines(lines: &[String]) -> Vec<AccessLogRecord> {
    let mut records = Vec::with_capacity(lines.len());
    for line in lines {
        if let Ok(Some(record)) = parse_line(line) {
            records.push(record);
        }
    }
    records
}
