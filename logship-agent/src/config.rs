use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for the tailing engine.
///
/// Values are plain data: whatever loads them (environment variables, a
/// config file) lives outside this crate and hands a finished
/// `AgentConfig` in.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Access log target: a single file or a directory of `.log`/`.gz`
    /// files.
    pub access_path: PathBuf,
    /// Error log target.
    pub error_path: PathBuf,
    /// Durable position snapshot; `None` keeps positions in memory only.
    #[serde(default)]
    pub position_file: Option<PathBuf>,
    #[serde(default)]
    pub stream: StreamConfig,
}

/// Limits for streaming connections.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    /// Maximum lines read from the file per tick.
    #[serde(default = "default_batch_lines")]
    pub batch_lines: usize,
    /// Milliseconds between ticks.
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
    /// Maximum concurrently active streams.
    #[serde(default = "default_max_clients")]
    pub max_clients: usize,
    /// Hard wall-clock cap on one stream, in seconds.
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u64,
    /// Byte budget for one outgoing batch, measured on the framed wire
    /// text.
    #[serde(default = "default_max_bytes_per_batch")]
    pub max_bytes_per_batch: usize,
}

fn default_batch_lines() -> usize {
    400
}

fn default_flush_interval_ms() -> u64 {
    1000
}

fn default_max_clients() -> usize {
    50
}

fn default_max_duration_secs() -> u64 {
    300
}

fn default_max_bytes_per_batch() -> usize {
    512 * 1024
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            batch_lines: default_batch_lines(),
            flush_interval_ms: default_flush_interval_ms(),
            max_clients: default_max_clients(),
            max_duration_secs: default_max_duration_secs(),
            max_bytes_per_batch: default_max_bytes_per_batch(),
        }
    }
}

impl StreamConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration_secs)
    }
}
