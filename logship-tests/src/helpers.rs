use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Once;

static TRACING: Once = Once::new();

/// Install a fmt subscriber once so `RUST_LOG=debug cargo test` shows the
/// agent's tracing output. Safe to call from every test.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Write `lines` to `dir/name`, newline-terminated. Returns the full path.
pub fn write_lines(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let content: String = lines.iter().map(|l| format!("{}\n", l)).collect();
    std::fs::write(&path, content).expect("Failed to write test log file");
    path
}

/// `count` distinct numbered lines, `line-00000` style.
pub fn numbered_lines(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("line-{:05}", i)).collect()
}

/// Write `count` numbered lines to `dir/name`. Returns the full path.
pub fn write_numbered(dir: &Path, name: &str, count: usize) -> PathBuf {
    let path = dir.join(name);
    let content: String = numbered_lines(count)
        .iter()
        .map(|l| format!("{}\n", l))
        .collect();
    std::fs::write(&path, content).expect("Failed to write test log file");
    path
}

/// Append `lines` to an existing file, newline-terminated.
pub fn append_lines(path: &Path, lines: &[&str]) {
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(path)
        .expect("Failed to open test log file for append");
    for line in lines {
        writeln!(file, "{}", line).expect("Failed to append test log line");
    }
}
