//! Control plane for the appbridge automation bridge.
//!
//! This crate decides, per tool call, whether an operation is allowed
//! (mode + policy), whether it needs interactive confirmation, renders the
//! call into an executor request via the adapter contract, and relays the
//! out-of-process executor's result back with normalized error semantics.

pub mod adapters;
pub mod config;
pub mod confirmation;
pub mod dispatch;
mod error;
pub mod exec;
pub mod logging;
pub mod mode;
pub mod policy;

pub use error::BridgeError;
pub use error::Result;
