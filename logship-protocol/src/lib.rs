//! Wire-visible types for the logship agent.
//!
//! This crate holds everything a transport layer needs to talk about the
//! tailing engine without depending on it: read positions and results,
//! file-size summaries, the structured access-log record, request
//! parameters, and the server-push stream framing.

pub mod frame;
pub mod record;
pub mod types;
