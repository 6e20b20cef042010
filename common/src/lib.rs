//! Shared data model for the lanscope workspace.
//!
//! Everything the engine, the analyzer and the presentation layer agree on
//! lives here: scan parameters and their validation, the target grammar,
//! the per-host evidence record, the session aggregate and the error
//! taxonomy. This crate holds no I/O and no scheduling logic.

pub mod config;
pub mod error;
pub mod network;
pub mod session;

pub use error::ScanError;
