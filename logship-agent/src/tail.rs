//! Request-level façade over the readers and the position store.
//!
//! Handlers hand in a [`ReadRequest`]; the orchestrator resolves the
//! effective offset (tracked, explicit, or tail-from-end), dispatches to
//! the single-file or directory reader, writes new offsets back to the
//! store, and trims the result to the requested line count.

use std::path::Path;
use std::sync::Arc;

use logship_protocol::types::{
    LogResult, LogSizesResult, PathKind, PathStatus, Position, ReadRequest, DEFAULT_ACCESS_LINES,
    DEFAULT_ERROR_LINES, TAIL_POSITION, TRACKED_POSITION,
};

use crate::errors::{AgentError, Result};
use crate::logs::{log_sizes, read_directory, read_log, LogClass};
use crate::positions::PositionStore;

pub struct TailOrchestrator {
    positions: Arc<PositionStore>,
}

impl TailOrchestrator {
    pub fn new(positions: Arc<PositionStore>) -> Self {
        Self { positions }
    }

    pub fn positions(&self) -> &Arc<PositionStore> {
        &self.positions
    }

    /// Access-log read: `.log` files whose name does not contain "error".
    pub fn read_access(&self, path: &Path, req: &ReadRequest) -> Result<LogResult> {
        self.read_class(path, req, LogClass::Access, DEFAULT_ACCESS_LINES)
    }

    /// Error-log read: files whose name contains "error".
    pub fn read_error(&self, path: &Path, req: &ReadRequest) -> Result<LogResult> {
        self.read_class(path, req, LogClass::Error, DEFAULT_ERROR_LINES)
    }

    fn read_class(
        &self,
        path: &Path,
        req: &ReadRequest,
        class: LogClass,
        default_lines: usize,
    ) -> Result<LogResult> {
        let meta = std::fs::metadata(path).map_err(|e| AgentError::from_io(path, e))?;
        let lines = req.lines.unwrap_or(default_lines);

        let mut result = if meta.is_dir() {
            if req.tail || req.position == TRACKED_POSITION {
                // First/tail request: no per-file offsets yet
                read_directory(path, &[], class, false)?
            } else {
                read_directory(path, &[Position::new(req.position)], class, false)?
            }
        } else {
            let key = path.to_string_lossy();
            // `tail` wins over everything, including a tracked position
            let effective = if req.tail || req.position == TAIL_POSITION {
                TAIL_POSITION
            } else if req.position == TRACKED_POSITION {
                self.positions.get(&key)
            } else {
                req.position
            };

            let result = read_log(path, effective)?;
            if let Some(position) = result.positions.first() {
                self.positions.set(&key, position.position);
            }
            result
        };

        // Keep only the most recent `lines` entries
        if result.logs.len() > lines {
            let start = result.logs.len() - lines;
            result.logs.drain(..start);
        }
        Ok(result)
    }

    /// Read one named file under a directory root.
    ///
    /// Positions are explicit here (tracked state is not consulted), and
    /// the result is trimmed to the first `lines` entries.
    pub fn read_file(&self, dir: &Path, filename: &str, req: &ReadRequest) -> Result<LogResult> {
        let full = dir.join(filename);
        let position = if req.position == TRACKED_POSITION {
            0
        } else {
            req.position
        };

        let mut result = read_log(&full, position)?;
        result.logs.truncate(req.lines.unwrap_or(DEFAULT_ERROR_LINES));
        Ok(result)
    }

    /// Size summary for a configured path.
    pub fn sizes(&self, path: &Path) -> Result<LogSizesResult> {
        log_sizes(path)
    }

    /// Filesystem status for a configured path, for status endpoints.
    pub fn path_status(&self, path: &Path) -> PathStatus {
        let display = path.to_string_lossy().into_owned();
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_dir() => PathStatus {
                path: display,
                exists: true,
                kind: PathKind::Directory,
                size: None,
            },
            Ok(meta) => PathStatus {
                path: display,
                exists: true,
                kind: PathKind::File,
                size: Some(meta.len()),
            },
            Err(_) => PathStatus {
                path: display,
                exists: false,
                kind: PathKind::Missing,
                size: None,
            },
        }
    }
}
