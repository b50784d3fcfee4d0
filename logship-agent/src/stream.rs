//! Per-connection streaming of new log lines in bounded batches.
//!
//! A stream is one long-lived loop: admitted against a connection cap,
//! then ticking on a fixed interval, reading new lines since the tracked
//! position, packing them into byte-budgeted frames, and pushing them to a
//! single consumer until cancellation, a hard duration limit, or an error.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{interval, sleep_until, Instant};
use tracing::{debug, warn};

use logship_protocol::frame::{StreamFrame, KEEP_ALIVE, STREAM_START};

use crate::config::StreamConfig;
use crate::errors::{AgentError, Result};
use crate::logs::stream_read;
use crate::positions::PositionStore;

/// Why a stream ended normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The hard wall-clock limit elapsed; a terminal frame was sent.
    TimedOut,
    /// The consumer went away; there is nobody left to tell.
    Cancelled,
}

/// Connection-level backpressure: counts active streams against a cap.
pub struct StreamSupervisor {
    active: AtomicUsize,
    max: usize,
}

impl StreamSupervisor {
    pub fn new(max: usize) -> Self {
        Self {
            active: AtomicUsize::new(0),
            max,
        }
    }

    /// Admit one stream, or fail fast once the cap is reached.
    pub fn try_acquire(self: &Arc<Self>) -> Result<StreamPermit> {
        let mut current = self.active.load(Ordering::Relaxed);
        loop {
            if current >= self.max {
                return Err(AgentError::StreamCapacity {
                    active: current,
                    max: self.max,
                });
            }
            match self.active.compare_exchange(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    return Ok(StreamPermit {
                        supervisor: Arc::clone(self),
                    })
                }
                Err(observed) => current = observed,
            }
        }
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }
}

/// An admission slot. Dropping it releases the slot, so every exit path
/// out of a stream decrements the counter.
pub struct StreamPermit {
    supervisor: Arc<StreamSupervisor>,
}

impl std::fmt::Debug for StreamPermit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamPermit").finish_non_exhaustive()
    }
}

impl Drop for StreamPermit {
    fn drop(&mut self) {
        self.supervisor.active.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Streams new lines from one file to a single consumer.
pub struct LogStreamer {
    positions: Arc<PositionStore>,
    supervisor: Arc<StreamSupervisor>,
    config: StreamConfig,
}

impl LogStreamer {
    pub fn new(
        positions: Arc<PositionStore>,
        supervisor: Arc<StreamSupervisor>,
        config: StreamConfig,
    ) -> Self {
        Self {
            positions,
            supervisor,
            config,
        }
    }

    /// Run one streaming connection until timeout, cancellation, or error.
    ///
    /// Frames go into `sink`; the transport owns the receiving end, and
    /// dropping it cancels the stream no later than the next tick. The
    /// tracked position for `path` advances after every flushed batch.
    pub async fn run(&self, path: &Path, sink: mpsc::Sender<StreamFrame>) -> Result<StreamOutcome> {
        let _permit = self.supervisor.try_acquire()?;

        if sink.send(StreamFrame::Comment(STREAM_START)).await.is_err() {
            return Ok(StreamOutcome::Cancelled);
        }

        let key = path.to_string_lossy().into_owned();
        let mut position = self.positions.get(&key);

        let deadline = Instant::now() + self.config.max_duration();
        let mut ticker = interval(self.config.flush_interval());

        loop {
            tokio::select! {
                _ = sink.closed() => {
                    debug!("Stream consumer for {:?} disconnected", path);
                    return Ok(StreamOutcome::Cancelled);
                }
                _ = sleep_until(deadline) => {
                    let _ = sink.send(StreamFrame::End("stream timeout".into())).await;
                    return Ok(StreamOutcome::TimedOut);
                }
                _ = ticker.tick() => {
                    let (lines, next) = match stream_read(
                        path,
                        position,
                        self.config.batch_lines,
                        self.config.max_bytes_per_batch,
                    ) {
                        Ok(read) => read,
                        Err(e) => {
                            warn!("Stream read failed on {:?}: {}", path, e);
                            let _ = sink.send(StreamFrame::End(e.to_string())).await;
                            return Err(e);
                        }
                    };

                    let frame = if lines.is_empty() {
                        StreamFrame::Comment(KEEP_ALIVE)
                    } else {
                        self.pack(lines)
                    };
                    if sink.send(frame).await.is_err() {
                        return Ok(StreamOutcome::Cancelled);
                    }

                    position = next;
                    self.positions.set(&key, next);
                }
            }
        }
    }

    /// Pack lines into one data frame whose framed size stays within the
    /// byte budget. Lines that do not fit were already consumed from the
    /// file this tick; they are dropped with a logged truncation notice
    /// rather than retransmitted.
    fn pack(&self, lines: Vec<String>) -> StreamFrame {
        let budget = self.config.max_bytes_per_batch;
        let total = lines.len();
        let mut kept = Vec::with_capacity(total);
        let mut used = 0usize;

        for line in lines {
            let entry = StreamFrame::framed_len(&line);
            if used + entry > budget {
                break;
            }
            used += entry;
            kept.push(line);
        }

        if kept.len() < total {
            warn!(
                "Stream batch truncated at {} bytes ({} of {} lines kept)",
                used,
                kept.len(),
                total
            );
        }

        StreamFrame::Data(kept)
    }
}
