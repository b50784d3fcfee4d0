//! Server-push stream framing.
//!
//! Frames follow the text/event-stream convention: comment frames for
//! keep-alive, one `data:` field per log line, and an `end` event as the
//! terminal frame. Transport headers (content type, no-cache, keep-alive)
//! are the responsibility of the layer that owns the connection.

/// Comment emitted once when a stream is admitted.
pub const STREAM_START: &str = "stream-start";

/// Comment emitted on ticks that found no new lines.
pub const KEEP_ALIVE: &str = "keep-alive";

/// One unit emitted on a streaming connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    /// Keep-alive / informational comment; carries no data.
    Comment(&'static str),
    /// A batch of log lines, one data field per line.
    Data(Vec<String>),
    /// Terminal frame naming why the stream ended.
    End(String),
}

impl StreamFrame {
    /// Exact encoded size in bytes of one line within a [`StreamFrame::Data`]
    /// frame (`data: <line>\n\n`). Lets callers pack to a byte budget
    /// without encoding twice.
    pub fn framed_len(line: &str) -> usize {
        "data: ".len() + line.len() + 2
    }

    /// Render the frame as wire text.
    pub fn encode(&self) -> String {
        match self {
            StreamFrame::Comment(comment) => format!(": {}\n\n", comment),
            StreamFrame::Data(lines) => {
                let capacity = lines.iter().map(|l| Self::framed_len(l)).sum();
                let mut out = String::with_capacity(capacity);
                for line in lines {
                    out.push_str("data: ");
                    out.push_str(line);
                    out.push_str("\n\n");
                }
                out
            }
            StreamFrame::End(reason) => format!("event: end\ndata: {}\n\n", reason),
        }
    }

    /// Whether this frame terminates the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamFrame::End(_))
    }
}
