//! Size summaries for log files.

use std::path::Path;

use logship_protocol::types::{LogFileSize, LogFilesSummary, LogSizesResult};

use crate::errors::{AgentError, Result};

/// Per-file sizes and aggregate statistics for `path` (file or directory).
///
/// Derived and stateless: recomputed on each call.
pub fn log_sizes(path: &Path) -> Result<LogSizesResult> {
    let meta = std::fs::metadata(path).map_err(|e| AgentError::from_io(path, e))?;

    let mut result = LogSizesResult::default();

    if meta.is_dir() {
        let entries = std::fs::read_dir(path).map_err(|e| AgentError::from_io(path, e))?;
        for entry in entries.flatten() {
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            record_file(&mut result, name, meta.len());
        }
    } else {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        record_file(&mut result, name, meta.len());
    }

    Ok(result)
}

fn record_file(result: &mut LogSizesResult, name: String, size: u64) {
    let extension = Path::new(&name)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    result.summary.total_size += size;
    result.summary.total_files += 1;

    match extension.as_str() {
        ".log" => {
            result.summary.log_files_size += size;
            result.summary.log_files_count += 1;
        }
        ".gz" => {
            result.summary.compressed_files_size += size;
            result.summary.compressed_files_count += 1;
        }
        _ => {}
    }

    result.files.push(LogFileSize {
        name,
        size,
        extension,
    });
}
