//! Integration tests for tail-mode (backward) reads.

use logship_agent::logs::{read_log, tail_file};
use logship_protocol::types::TAIL_POSITION;
use logship_tests::{numbered_lines, write_numbered};
use tempfile::TempDir;

/// Tail mode on a file with more than 1000 non-empty lines returns exactly
/// the last 1000, in original order.
#[test]
fn test_tail_sentinel_returns_last_1000_lines() {
    let dir = TempDir::new().unwrap();
    let path = write_numbered(dir.path(), "access.log", 2500);

    let result = read_log(&path, TAIL_POSITION).unwrap();
    assert_eq!(result.logs.len(), 1000);

    let expected: Vec<String> = numbered_lines(2500)[1500..].to_vec();
    assert_eq!(result.logs, expected);

    // Returned offset is the file size, so the next poll resumes at EOF
    let size = std::fs::metadata(&path).unwrap().len() as i64;
    assert_eq!(result.positions[0].position, size);
}

/// A file with fewer lines than requested returns all of them in order.
#[test]
fn test_tail_of_short_file_returns_all_lines() {
    let dir = TempDir::new().unwrap();
    let path = write_numbered(dir.path(), "access.log", 17);

    let result = read_log(&path, TAIL_POSITION).unwrap();
    assert_eq!(result.logs, numbered_lines(17));
}

/// Empty lines never count toward the requested line count.
#[test]
fn test_tail_counts_only_non_empty_lines() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("access.log");
    let mut content = String::new();
    for i in 0..20 {
        content.push_str(&format!("line-{}\n\n\n", i));
    }
    std::fs::write(&path, content).unwrap();

    let result = tail_file(&path, 5).unwrap();
    assert_eq!(
        result.logs,
        vec!["line-15", "line-16", "line-17", "line-18", "line-19"]
    );
}

/// Tailing a small count from a large file stays fast because only the
/// needed chunks are read. This is a correctness proxy for the linearity
/// guarantee: the result must be identical no matter how large the file is.
#[test]
fn test_tail_of_large_file_with_small_count() {
    let dir = TempDir::new().unwrap();
    // ~6MB of lines, far more than the 8KB chunk size
    let path = write_numbered(dir.path(), "access.log", 500_000);

    let result = tail_file(&path, 25).unwrap();
    assert_eq!(result.logs.len(), 25);
    assert_eq!(result.logs[0], "line-499975");
    assert_eq!(result.logs[24], "line-499999");
}

/// Tail-then-poll handoff: the offset returned by a tail read continues
/// cleanly into incremental reads.
#[test]
fn test_tail_offset_chains_into_incremental_reads() {
    let dir = TempDir::new().unwrap();
    let path = write_numbered(dir.path(), "access.log", 10);

    let tailed = read_log(&path, TAIL_POSITION).unwrap();
    let offset = tailed.positions[0].position;

    logship_tests::append_lines(&path, &["fresh-1", "fresh-2"]);

    let next = read_log(&path, offset).unwrap();
    assert_eq!(next.logs, vec!["fresh-1", "fresh-2"]);
}
