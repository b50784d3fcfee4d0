//! Integration tests for the streaming batcher.

use logship_agent::{LogStreamer, PositionStore, StreamConfig, StreamOutcome, StreamSupervisor};
use logship_protocol::frame::{StreamFrame, KEEP_ALIVE, STREAM_START};
use logship_tests::{append_lines, write_lines};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::mpsc;

fn fast_config() -> StreamConfig {
    StreamConfig {
        batch_lines: 100,
        flush_interval_ms: 200,
        max_clients: 3,
        max_duration_secs: 3600,
        max_bytes_per_batch: 64 * 1024,
    }
}

struct StreamHarness {
    streamer: Arc<LogStreamer>,
    positions: Arc<PositionStore>,
    supervisor: Arc<StreamSupervisor>,
}

fn harness(config: StreamConfig) -> StreamHarness {
    logship_tests::init_tracing();
    let positions = Arc::new(PositionStore::in_memory());
    let supervisor = Arc::new(StreamSupervisor::new(config.max_clients));
    let streamer = Arc::new(LogStreamer::new(
        Arc::clone(&positions),
        Arc::clone(&supervisor),
        config,
    ));
    StreamHarness {
        streamer,
        positions,
        supervisor,
    }
}

fn spawn_stream(
    streamer: &Arc<LogStreamer>,
    path: &PathBuf,
    buffer: usize,
) -> (
    mpsc::Receiver<StreamFrame>,
    tokio::task::JoinHandle<logship_agent::Result<StreamOutcome>>,
) {
    let (tx, rx) = mpsc::channel(buffer);
    let handle = tokio::spawn({
        let streamer = Arc::clone(streamer);
        let path = path.clone();
        async move { streamer.run(&path, tx).await }
    });
    (rx, handle)
}

async fn next_data_frame(rx: &mut mpsc::Receiver<StreamFrame>) -> Vec<String> {
    for _ in 0..100 {
        match rx.recv().await {
            Some(StreamFrame::Data(lines)) if !lines.is_empty() => return lines,
            Some(StreamFrame::Comment(_)) | Some(StreamFrame::Data(_)) => continue,
            other => panic!("Stream ended early: {:?}", other),
        }
    }
    panic!("No data frame arrived");
}

// ============================================================================
// Capacity
// ============================================================================

/// With a limit of N, the (N+1)-th stream is rejected with a capacity
/// error and the N running streams keep going.
#[tokio::test(start_paused = true)]
async fn test_stream_capacity_rejects_excess_clients() {
    let dir = TempDir::new().unwrap();
    // Separate files so each stream has its own tracked position
    let path_a = write_lines(dir.path(), "access.log", &["seed-a"]);
    let path_b = write_lines(dir.path(), "other.log", &["seed-b"]);

    let h = harness(StreamConfig {
        max_clients: 2,
        ..fast_config()
    });
    h.positions.set(&path_a.to_string_lossy(), 0);
    h.positions.set(&path_b.to_string_lossy(), 0);

    let (mut rx1, handle1) = spawn_stream(&h.streamer, &path_a, 64);
    let (mut rx2, handle2) = spawn_stream(&h.streamer, &path_b, 64);

    // Both streams are up once their start frames arrive
    assert_eq!(rx1.recv().await.unwrap(), StreamFrame::Comment(STREAM_START));
    assert_eq!(rx2.recv().await.unwrap(), StreamFrame::Comment(STREAM_START));
    assert_eq!(h.supervisor.active(), 2);

    let (mut rx3, handle3) = spawn_stream(&h.streamer, &path_a, 64);
    let err = handle3.await.unwrap().unwrap_err();
    assert!(err.is_capacity());
    assert!(rx3.recv().await.is_none(), "Rejected stream must emit nothing");

    // The running streams are unaffected: they still deliver their data
    assert_eq!(
        rx1.recv().await.unwrap(),
        StreamFrame::Data(vec!["seed-a".into()])
    );
    assert_eq!(
        rx2.recv().await.unwrap(),
        StreamFrame::Data(vec!["seed-b".into()])
    );

    drop(rx1);
    drop(rx2);
    assert_eq!(handle1.await.unwrap().unwrap(), StreamOutcome::Cancelled);
    assert_eq!(handle2.await.unwrap().unwrap(), StreamOutcome::Cancelled);
    assert_eq!(h.supervisor.active(), 0);
}

// ============================================================================
// Byte budget
// ============================================================================

/// A run of lines whose framed size exceeds the budget yields a frame that
/// is a strict prefix within the budget.
#[tokio::test(start_paused = true)]
async fn test_batch_byte_budget_yields_strict_prefix() {
    let dir = TempDir::new().unwrap();
    let lines: Vec<String> = (0..20).map(|i| format!("{}-{:02}", "p".repeat(40), i)).collect();
    let refs: Vec<&str> = lines.iter().map(|s| s.as_str()).collect();
    let path = write_lines(dir.path(), "access.log", &refs);

    let budget = 200;
    let h = harness(StreamConfig {
        max_bytes_per_batch: budget,
        ..fast_config()
    });
    h.positions.set(&path.to_string_lossy(), 0);

    let (mut rx, handle) = spawn_stream(&h.streamer, &path, 64);
    assert_eq!(rx.recv().await.unwrap(), StreamFrame::Comment(STREAM_START));

    let first = next_data_frame(&mut rx).await;
    assert!(!first.is_empty());
    assert!(first.len() < lines.len());
    assert_eq!(first, lines[..first.len()], "Frame must be a strict prefix");
    let framed: usize = first.iter().map(|l| StreamFrame::framed_len(l)).sum();
    assert!(framed <= budget, "Framed size {} exceeds budget {}", framed, budget);

    drop(rx);
    assert_eq!(handle.await.unwrap().unwrap(), StreamOutcome::Cancelled);
}

// ============================================================================
// Live tailing
// ============================================================================

/// Lines appended while a stream is running arrive in later batches, with
/// keep-alives covering the idle ticks, and the tracked position follows.
#[tokio::test(start_paused = true)]
async fn test_appended_lines_flow_through_stream() {
    let dir = TempDir::new().unwrap();
    let path = write_lines(dir.path(), "access.log", &["boot"]);

    let h = harness(fast_config());
    let key = path.to_string_lossy().into_owned();
    h.positions.set(&key, 0);

    let (mut rx, handle) = spawn_stream(&h.streamer, &path, 64);
    assert_eq!(rx.recv().await.unwrap(), StreamFrame::Comment(STREAM_START));
    assert_eq!(next_data_frame(&mut rx).await, vec!["boot"]);

    append_lines(&path, &["update-1", "update-2"]);
    assert_eq!(
        next_data_frame(&mut rx).await,
        vec!["update-1", "update-2"]
    );

    // Idle now: the next frames are keep-alive comments
    assert_eq!(rx.recv().await.unwrap(), StreamFrame::Comment(KEEP_ALIVE));

    drop(rx);
    assert_eq!(handle.await.unwrap().unwrap(), StreamOutcome::Cancelled);

    let size = std::fs::metadata(&path).unwrap().len() as i64;
    assert_eq!(h.positions.get(&key), size);
}

/// The stream ends with a terminal frame once the hard duration cap
/// elapses, regardless of activity.
#[tokio::test(start_paused = true)]
async fn test_stream_hits_hard_duration_limit() {
    let dir = TempDir::new().unwrap();
    let path = write_lines(dir.path(), "access.log", &[]);

    let h = harness(StreamConfig {
        max_duration_secs: 2,
        ..fast_config()
    });
    h.positions.set(&path.to_string_lossy(), 0);

    let (mut rx, handle) = spawn_stream(&h.streamer, &path, 128);
    assert_eq!(handle.await.unwrap().unwrap(), StreamOutcome::TimedOut);

    let mut last = None;
    while let Ok(frame) = rx.try_recv() {
        last = Some(frame);
    }
    assert_eq!(last, Some(StreamFrame::End("stream timeout".into())));
}

/// Frames encode to the documented SSE wire shapes end to end.
#[tokio::test(start_paused = true)]
async fn test_stream_frames_encode_as_sse() {
    let dir = TempDir::new().unwrap();
    let path = write_lines(dir.path(), "access.log", &["hello"]);

    let h = harness(fast_config());
    h.positions.set(&path.to_string_lossy(), 0);

    let (mut rx, handle) = spawn_stream(&h.streamer, &path, 64);

    let start = rx.recv().await.unwrap();
    assert_eq!(start.encode(), ": stream-start\n\n");

    let data = next_data_frame(&mut rx).await;
    assert_eq!(StreamFrame::Data(data).encode(), "data: hello\n\n");

    drop(rx);
    assert_eq!(handle.await.unwrap().unwrap(), StreamOutcome::Cancelled);
}
