use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Log path not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Too many streaming clients ({active}/{max})")]
    StreamCapacity { active: usize, max: usize },

    #[error("Stream cancelled by consumer")]
    Cancelled,

    #[error("Position persistence failed: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AgentError>;

impl AgentError {
    /// Classify an I/O failure on `path`, keeping NotFound distinct so it
    /// is never downgraded to an empty result.
    pub fn from_io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            AgentError::NotFound(path.to_path_buf())
        } else {
            AgentError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// Streaming admission rejection: the caller should retry later.
    pub fn is_capacity(&self) -> bool {
        matches!(self, AgentError::StreamCapacity { .. })
    }

    /// Consumer went away: a normal terminal condition, not a fault.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AgentError::Cancelled)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AgentError::NotFound(_))
    }
}
