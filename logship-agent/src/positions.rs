//! Durable tracking of per-file read offsets.
//!
//! The in-memory map is the only mutable state shared across concurrent
//! requests; all access goes through one reader/writer lock. Durable saves
//! run on a dedicated background task so [`PositionStore::set`] never
//! blocks on disk I/O, and concurrent triggers coalesce: the saver always
//! writes the current full snapshot, never a queue of deltas.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use logship_protocol::types::TAIL_POSITION;

use crate::errors::{AgentError, Result};

struct Inner {
    positions: RwLock<HashMap<String, i64>>,
    file: Option<PathBuf>,
}

struct Saver {
    trigger: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

/// Maps absolute file paths to the last byte offset served to a consumer.
pub struct PositionStore {
    inner: Arc<Inner>,
    saver: Mutex<Option<Saver>>,
}

impl PositionStore {
    /// Open the store, loading the snapshot from `file` if it exists.
    ///
    /// A missing snapshot file is not an error; a corrupt one is logged and
    /// replaced by an empty map. With a file configured, a background saver
    /// task is spawned (requires a tokio runtime).
    pub fn open(file: Option<PathBuf>) -> Self {
        let positions = match &file {
            Some(path) => load_snapshot(path),
            None => HashMap::new(),
        };

        let inner = Arc::new(Inner {
            positions: RwLock::new(positions),
            file,
        });

        let saver = inner.file.as_ref().map(|_| {
            // Capacity 1: a trigger arriving while a save is pending folds
            // into that save's snapshot.
            let (trigger, mut rx) = mpsc::channel::<()>(1);
            let task_inner = Arc::clone(&inner);
            let task = tokio::spawn(async move {
                while rx.recv().await.is_some() {
                    if let Err(e) = task_inner.save() {
                        warn!("Failed to save positions: {}", e);
                    }
                }
            });
            Saver { trigger, task }
        });

        Self {
            inner,
            saver: Mutex::new(saver),
        }
    }

    /// Store with no durable backing. Positions last for the process
    /// lifetime only; no runtime is required.
    pub fn in_memory() -> Self {
        Self::open(None)
    }

    /// The tracked offset for `path`, or `-1` (tail mode) if unknown.
    pub fn get(&self, path: &str) -> i64 {
        let positions = self
            .inner
            .positions
            .read()
            .unwrap_or_else(|e| e.into_inner());
        positions.get(path).copied().unwrap_or(TAIL_POSITION)
    }

    /// Record a new offset and trigger a durable save.
    ///
    /// Returns as soon as the in-memory map is updated; the save proceeds
    /// on the background task and its failure is logged, never surfaced.
    pub fn set(&self, path: &str, position: i64) {
        {
            let mut positions = self
                .inner
                .positions
                .write()
                .unwrap_or_else(|e| e.into_inner());
            positions.insert(path.to_string(), position);
        }

        let saver = self.saver.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(saver) = saver.as_ref() {
            // Full channel means a save is already pending; it will pick
            // up this mutation from the snapshot.
            let _ = saver.trigger.try_send(());
        }
    }

    /// Copy of the current map, for status reporting and tests.
    pub fn snapshot(&self) -> HashMap<String, i64> {
        self.inner
            .positions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Synchronous save of the current snapshot. Normally saves happen on
    /// the background task; this exists for callers that need a known-good
    /// file on disk right now.
    pub fn save_now(&self) -> Result<()> {
        self.inner.save()
    }

    /// Orderly shutdown: stop accepting save triggers, then wait for the
    /// saver to finish at most one in-flight save.
    pub async fn shutdown(&self) {
        let saver = self
            .saver
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(Saver { trigger, task }) = saver {
            drop(trigger);
            if let Err(e) = task.await {
                warn!("Position saver task failed: {}", e);
            }
        }
    }
}

impl Inner {
    /// Serialize the full current map and atomically replace the snapshot
    /// file. On failure the previous file is left intact.
    fn save(&self) -> Result<()> {
        let Some(path) = &self.file else {
            return Ok(());
        };

        let snapshot = {
            self.positions
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .clone()
        };
        let content = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| AgentError::Persistence(format!("serialize: {}", e)))?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| {
            AgentError::Persistence(format!("create '{}': {}", dir.display(), e))
        })?;

        // Write-then-rename so a crash mid-write never corrupts the
        // previous snapshot.
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
            AgentError::Persistence(format!("temp file in '{}': {}", dir.display(), e))
        })?;
        tmp.write_all(content.as_bytes())
            .map_err(|e| AgentError::Persistence(format!("write: {}", e)))?;
        tmp.persist(path)
            .map_err(|e| AgentError::Persistence(format!("persist '{}': {}", path.display(), e)))?;

        debug!("Saved {} position(s) to {:?}", snapshot.len(), path);
        Ok(())
    }
}

fn load_snapshot(path: &Path) -> HashMap<String, i64> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Position file does not exist yet: {:?}", path);
            return HashMap::new();
        }
        Err(e) => {
            warn!("Could not read position file {:?}: {}", path, e);
            return HashMap::new();
        }
    };

    match serde_json::from_str::<HashMap<String, i64>>(&content) {
        Ok(positions) => {
            debug!("Loaded {} position(s) from {:?}", positions.len(), path);
            positions
        }
        Err(e) => {
            warn!("Position file {:?} is corrupt, starting empty: {}", path, e);
            HashMap::new()
        }
    }
}
