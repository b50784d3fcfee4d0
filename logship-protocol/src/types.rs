use serde::{Deserialize, Serialize};

/// Position sentinel: no known offset, serve the most recent content.
pub const TAIL_POSITION: i64 = -1;

/// Request-level sentinel: use the position the agent tracks for this path.
/// Never persisted.
pub const TRACKED_POSITION: i64 = -2;

/// Default line cap for access-log reads.
pub const DEFAULT_ACCESS_LINES: usize = 1000;

/// Default line cap for error-log and named-file reads.
pub const DEFAULT_ERROR_LINES: usize = 100;

/// A byte offset into a log file marking how far a consumer has read.
///
/// `filename` is set only for directory reads, where each file carries its
/// own offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub position: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl Position {
    pub fn new(position: i64) -> Self {
        Self {
            position,
            filename: None,
        }
    }

    /// Position tagged with the file it belongs to (directory mode).
    pub fn for_file(position: i64, filename: impl Into<String>) -> Self {
        Self {
            position,
            filename: Some(filename.into()),
        }
    }
}

/// The outcome of a read: raw lines in file order (oldest first) plus the
/// offsets to resume from.
///
/// Single-file reads return exactly one position; directory reads return
/// one per file that was read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogResult {
    pub logs: Vec<String>,
    pub positions: Vec<Position>,
}

/// Parameters of a one-shot read, as a transport layer would decode them.
///
/// `lines` of `None` means "use the endpoint default" (1000 for access
/// logs, 100 for error and named-file reads).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadRequest {
    /// `-2` = tracked position, `-1` = tail mode, `>= 0` = explicit offset.
    #[serde(default = "default_position")]
    pub position: i64,
    #[serde(default)]
    pub lines: Option<usize>,
    /// Force tail-from-end regardless of the tracked position.
    #[serde(default)]
    pub tail: bool,
}

fn default_position() -> i64 {
    TRACKED_POSITION
}

impl Default for ReadRequest {
    fn default() -> Self {
        Self {
            position: TRACKED_POSITION,
            lines: None,
            tail: false,
        }
    }
}

impl ReadRequest {
    /// Read from an explicit byte offset.
    pub fn at(position: i64) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Force tail mode.
    pub fn tail() -> Self {
        Self {
            tail: true,
            ..Self::default()
        }
    }
}

/// Size information for one log file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFileSize {
    pub name: String,
    pub size: u64,
    pub extension: String,
}

/// Aggregate size statistics over a set of log files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFilesSummary {
    pub total_size: u64,
    pub log_files_size: u64,
    pub compressed_files_size: u64,
    pub total_files: usize,
    pub log_files_count: usize,
    pub compressed_files_count: usize,
}

/// Result of analyzing log file sizes for a path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSizesResult {
    pub files: Vec<LogFileSize>,
    pub summary: LogFilesSummary,
}

/// What a configured log path currently points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    File,
    Directory,
    Missing,
}

/// Filesystem status for a configured path, for status endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStatus {
    pub path: String,
    pub exists: bool,
    pub kind: PathKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}
