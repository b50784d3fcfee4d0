//! Forward incremental reads over a single log file.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use flate2::read::GzDecoder;

use logship_protocol::types::{LogResult, Position, TAIL_POSITION};

use super::{
    is_compressed_file, tail_file, DEFAULT_STREAM_BATCH_LINES, DEFAULT_STREAM_MAX_BYTES,
    DEFAULT_TAIL_LINES,
};
use crate::errors::{AgentError, Result};

/// Read one file starting at `position`.
///
/// `-1` serves the most recent content (the last 1000 non-empty lines); an
/// offset at or past the end of the file is the no-new-data case, not an
/// error. Compressed (`.gz`) files are decompressed whole and carry no
/// offset: every read of them returns position 0.
pub fn read_log(path: &Path, position: i64) -> Result<LogResult> {
    let compressed = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(is_compressed_file);

    if compressed {
        read_compressed(path)
    } else {
        read_log_file(path, position)
    }
}

fn read_log_file(path: &Path, position: i64) -> Result<LogResult> {
    let meta = std::fs::metadata(path).map_err(|e| AgentError::from_io(path, e))?;
    let file_size = meta.len() as i64;

    if position == TAIL_POSITION {
        return tail_file(path, DEFAULT_TAIL_LINES);
    }

    // Nothing new since the caller's offset
    if position >= file_size {
        return Ok(LogResult {
            logs: Vec::new(),
            positions: vec![Position::new(file_size)],
        });
    }

    let mut file = File::open(path).map_err(|e| AgentError::from_io(path, e))?;
    let start = position.max(0);
    if start > 0 {
        file.seek(SeekFrom::Start(start as u64))
            .map_err(|e| AgentError::from_io(path, e))?;
    }

    let mut reader = BufReader::with_capacity(64 * 1024, file);
    let mut logs = Vec::with_capacity(256);
    let mut consumed = start;
    let mut line_buf = String::with_capacity(256);

    loop {
        line_buf.clear();
        let n = reader
            .read_line(&mut line_buf)
            .map_err(|e| AgentError::from_io(path, e))?;
        if n == 0 {
            break;
        }
        if !line_buf.ends_with('\n') {
            // Unterminated tail of the file: not yet complete, leave it
            // for the next read. The offset stays before it.
            break;
        }
        consumed += n as i64;

        let line = line_buf.trim_end_matches('\n').trim_end_matches('\r');
        if !line.is_empty() {
            logs.push(line.to_string());
        }
    }

    Ok(LogResult {
        logs,
        positions: vec![Position::new(consumed)],
    })
}

/// Bounded forward read used by the streaming batcher.
///
/// Reads at most `max_lines` complete lines and roughly `max_bytes` of
/// line content from `position`, returning the lines plus the offset of
/// the first unconsumed byte. The offset never moves past a line that was
/// not returned, so nothing read here is ever re-read or lost between
/// ticks.
pub fn stream_read(
    path: &Path,
    position: i64,
    max_lines: usize,
    max_bytes: usize,
) -> Result<(Vec<String>, i64)> {
    let max_lines = if max_lines == 0 {
        DEFAULT_STREAM_BATCH_LINES
    } else {
        max_lines
    };
    let max_bytes = if max_bytes == 0 {
        DEFAULT_STREAM_MAX_BYTES
    } else {
        max_bytes
    };

    let meta = std::fs::metadata(path).map_err(|e| AgentError::from_io(path, e))?;
    let file_size = meta.len() as i64;

    if position >= file_size {
        return Ok((Vec::new(), file_size));
    }

    let mut file = File::open(path).map_err(|e| AgentError::from_io(path, e))?;
    let start = position.max(0);
    if start > 0 {
        file.seek(SeekFrom::Start(start as u64))
            .map_err(|e| AgentError::from_io(path, e))?;
    }

    let mut reader = BufReader::with_capacity(64 * 1024, file);
    let mut lines = Vec::with_capacity(max_lines.min(1024));
    let mut consumed = start;
    let mut bytes_used = 0usize;
    let mut line_buf = String::with_capacity(256);

    while lines.len() < max_lines && bytes_used < max_bytes {
        line_buf.clear();
        let n = reader
            .read_line(&mut line_buf)
            .map_err(|e| AgentError::from_io(path, e))?;
        if n == 0 {
            break;
        }
        if !line_buf.ends_with('\n') {
            break;
        }

        let line = line_buf.trim_end_matches('\n').trim_end_matches('\r');
        if !line.is_empty() {
            let entry_size = line.len() + 1;
            // Stop before a line the budget cannot hold; it stays
            // unconsumed for the next tick. A single oversized line is
            // still delivered so the stream keeps making progress.
            if bytes_used + entry_size > max_bytes && !lines.is_empty() {
                break;
            }
            lines.push(line.to_string());
            bytes_used += entry_size;
        }
        consumed += n as i64;
    }

    Ok((lines, consumed))
}

/// Decompress a `.gz` log file fully into memory and split it into lines.
fn read_compressed(path: &Path) -> Result<LogResult> {
    let file = File::open(path).map_err(|e| AgentError::from_io(path, e))?;
    let mut decoder = GzDecoder::new(file);
    let mut content = String::new();
    decoder
        .read_to_string(&mut content)
        .map_err(|e| AgentError::from_io(path, e))?;

    let logs = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.to_string())
        .collect();

    Ok(LogResult {
        logs,
        positions: vec![Position::new(0)],
    })
}
