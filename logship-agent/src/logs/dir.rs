//! Directory-of-files reads with per-file offsets.

use std::collections::HashMap;
use std::path::Path;

use tracing::warn;

use logship_protocol::types::{LogResult, Position};

use super::{is_compressed_file, is_log_file, read_log, tail_file, LogClass, DEFAULT_TAIL_LINES};
use crate::errors::{AgentError, Result};

/// Read the selected class of log files directly under `path`.
///
/// Files are processed in ascending filename order so concatenation is
/// deterministic regardless of OS enumeration order. With no `positions`
/// this is a first/tail request: only the most recent file is read, in
/// tail mode. Otherwise each file is read at its offset from `positions`
/// (keyed by filename, default 0), and unreadable files are skipped with a
/// warning rather than failing the whole request.
pub fn read_directory(
    path: &Path,
    positions: &[Position],
    class: LogClass,
    include_compressed: bool,
) -> Result<LogResult> {
    let entries = std::fs::read_dir(path).map_err(|e| AgentError::from_io(path, e))?;

    let mut names: Vec<String> = Vec::new();
    for entry in entries.flatten() {
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let selected = is_log_file(&name) || (include_compressed && is_compressed_file(&name));
        if selected && class.matches(&name) {
            names.push(name);
        }
    }
    names.sort();

    if names.is_empty() {
        return Ok(LogResult::default());
    }

    // First contact: serve the newest file's tail and let the client
    // bootstrap per-file offsets from the response.
    if positions.is_empty() {
        let last = &names[names.len() - 1];
        match tail_file(&path.join(last), DEFAULT_TAIL_LINES) {
            Ok(mut result) => {
                for position in &mut result.positions {
                    position.filename = Some(last.clone());
                }
                return Ok(result);
            }
            Err(e) => {
                warn!("Tail of newest log file '{}' failed: {}", last, e);
                // Fall through to the per-file loop from offset 0
            }
        }
    }

    let offsets: HashMap<&str, i64> = positions
        .iter()
        .filter_map(|p| p.filename.as_deref().map(|f| (f, p.position)))
        .collect();

    let mut logs = Vec::with_capacity(1024);
    let mut new_positions = Vec::with_capacity(names.len());

    for name in &names {
        let full = path.join(name);
        let offset = offsets.get(name.as_str()).copied().unwrap_or(0);

        match read_log(&full, offset) {
            Ok(result) => {
                logs.extend(result.logs);
                if let Some(position) = result.positions.first() {
                    new_positions.push(Position::for_file(position.position, name.clone()));
                }
            }
            Err(e) => {
                warn!("Skipping unreadable log file {:?}: {}", full, e);
            }
        }
    }

    Ok(LogResult {
        logs,
        positions: new_positions,
    })
}
