//! Backward tail reads: the last N lines without scanning the whole file.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use logship_protocol::types::{LogResult, Position};

use super::TAIL_CHUNK_SIZE;
use crate::errors::{AgentError, Result};

/// Reads non-empty lines from the end of a file toward the start.
///
/// Fixed-size chunks are read backward from EOF; a partial line at a chunk
/// boundary is carried into the next chunk. Lines come out newest first,
/// so total work is proportional to the bytes actually needed, not the
/// file size.
pub struct ReverseLineReader {
    file: File,
    /// We read backward from here; 0 means the start has been reached.
    pos: u64,
    chunk_buf: Vec<u8>,
    /// Lines extracted from the current chunk, ordered so `pop()` yields
    /// the newest remaining line.
    pending_lines: Vec<String>,
    /// Partial line at the current chunk's start, completed by the next
    /// (earlier) chunk.
    leftover: Vec<u8>,
    chunk_size: usize,
}

impl ReverseLineReader {
    pub fn new(file: File) -> std::io::Result<Self> {
        let file_size = file.metadata()?.len();
        Ok(Self {
            file,
            pos: file_size,
            chunk_buf: Vec::with_capacity(TAIL_CHUNK_SIZE),
            pending_lines: Vec::new(),
            leftover: Vec::new(),
            chunk_size: TAIL_CHUNK_SIZE,
        })
    }

    /// The next line going backward through the file, or `None` once the
    /// start has been passed.
    pub fn next_line(&mut self) -> std::io::Result<Option<String>> {
        loop {
            if let Some(line) = self.pending_lines.pop() {
                return Ok(Some(line));
            }

            if self.pos == 0 && self.leftover.is_empty() {
                return Ok(None);
            }

            self.read_chunk_backwards()?;
        }
    }

    fn read_chunk_backwards(&mut self) -> std::io::Result<()> {
        let read_size = std::cmp::min(self.pos as usize, self.chunk_size);

        if read_size > 0 {
            let new_pos = self.pos - read_size as u64;
            self.file.seek(SeekFrom::Start(new_pos))?;

            self.chunk_buf.clear();
            self.chunk_buf.resize(read_size, 0);
            self.file.read_exact(&mut self.chunk_buf)?;

            self.pos = new_pos;
        } else {
            self.chunk_buf.clear();
        }

        // The leftover is the continuation of this chunk's final bytes
        if !self.leftover.is_empty() {
            self.chunk_buf.append(&mut self.leftover);
        }

        self.extract_lines_from_chunk();
        Ok(())
    }

    fn extract_lines_from_chunk(&mut self) {
        let mut lines: Vec<String> = Vec::new();
        let mut end = self.chunk_buf.len();

        let mut search_end = end;
        while let Some(newline_pos) = memchr::memrchr(b'\n', &self.chunk_buf[..search_end]) {
            if newline_pos + 1 < end {
                push_line(&mut lines, &self.chunk_buf[newline_pos + 1..end]);
            }
            end = newline_pos;
            search_end = newline_pos;
        }

        // Whatever precedes the first newline is complete only if this
        // chunk starts at the beginning of the file
        if self.pos == 0 {
            if end > 0 {
                push_line(&mut lines, &self.chunk_buf[..end]);
            }
        } else {
            self.leftover = self.chunk_buf[..end].to_vec();
        }

        // Extracted newest-last; reverse so pop() returns newest first
        lines.reverse();
        self.pending_lines = lines;
    }
}

fn push_line(lines: &mut Vec<String>, bytes: &[u8]) {
    if let Ok(line) = std::str::from_utf8(bytes) {
        let line = line.trim_end_matches('\r');
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }
}

/// The last `num_lines` non-empty lines of `path`, in original order.
///
/// Lines are collected newest-first from the reverse reader and reversed
/// once at the end. The returned position is the file size at read time.
pub fn tail_file(path: &Path, num_lines: usize) -> Result<LogResult> {
    let file = File::open(path).map_err(|e| AgentError::from_io(path, e))?;
    let file_size = file.metadata().map_err(|e| AgentError::from_io(path, e))?.len();

    let mut reader = ReverseLineReader::new(file).map_err(|e| AgentError::from_io(path, e))?;
    let mut logs = Vec::with_capacity(num_lines.min(4096));

    while logs.len() < num_lines {
        match reader.next_line().map_err(|e| AgentError::from_io(path, e))? {
            Some(line) => logs.push(line),
            None => break,
        }
    }

    logs.reverse();

    Ok(LogResult {
        logs,
        positions: vec![Position::new(file_size as i64)],
    })
}
