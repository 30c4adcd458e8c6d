//! The appbridge executor: reads one JSON request from stdin, renders or
//! accepts an AppleScript, runs it through `osascript`, and writes exactly
//! one JSON response to stdout. Stderr carries diagnostics only.

pub mod engine;
mod error;
pub mod handler;
pub mod json_escape;
pub mod targeting;
pub mod templates;

pub use error::ExecutorError;
