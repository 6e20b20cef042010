use thiserror::Error;

use crate::session::SessionId;

/// Session-level failures surfaced to the caller.
///
/// Per-target and per-probe failures never appear here: an unreachable host
/// is recorded as `is_alive = false` and a failed lookup as an absent field.
/// Only conditions that prevent a session from starting, or that make a
/// requested session unusable, are errors.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("invalid scan parameters: {0}")]
    InvalidParameters(String),

    #[error("probing capability unavailable: {0}")]
    ProbeCapabilityUnavailable(String),

    #[error("no session with id {0}")]
    SessionNotFound(SessionId),

    #[error("session {0} has not finished yet")]
    SessionNotFinished(SessionId),

    #[error("history store error: {0}")]
    History(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
