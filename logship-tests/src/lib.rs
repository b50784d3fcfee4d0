//! Test utilities for the logship workspace.
//!
//! Helpers for writing and growing log files under temporary directories,
//! shared by the integration tests.

pub mod helpers;

pub use helpers::{append_lines, init_tracing, numbered_lines, write_lines, write_numbered};
