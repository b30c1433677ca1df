//! Failure taxonomy for live probes.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Why a probe did not complete.
///
/// Checkers turn these into check results; they never reach the caller.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Connection refused")]
    Refused,

    #[error("Timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Network error: {0}")]
    Io(#[from] io::Error),

    #[error("Peer unexpectedly closed connection")]
    PeerClosed,

    #[error("TLS handshake failed: {0}")]
    Tls(io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("Invalid request: {0}")]
    Request(String),
}

impl ProbeError {
    /// True for failures where nothing answered at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, ProbeError::Refused | ProbeError::TimedOut(_))
    }
}
