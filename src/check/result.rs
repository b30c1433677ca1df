//! Check results.
//!
//! Every protocol reports in HTTP status vocabulary so callers share one
//! set of codes.

use bytes::Bytes;

use crate::spool::ServiceStatus;

/// Service is up.
pub const UP: u16 = 200;
/// Service answered, or was overridden, as down.
pub const DOWN: u16 = 503;
/// No answer was obtained at all (HTTP/HTTPS only).
pub const UNREACHABLE: u16 = 599;

/// Human-readable detail attached to a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInfo {
    Empty,
    /// Diagnostic text from a checker.
    Reason(String),
    /// Override store lookup that produced the result.
    Override(ServiceStatus),
    /// Raw body of a real HTTP response.
    Body(Bytes),
}

/// `(code, info)` produced once per check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub code: u16,
    pub info: CheckInfo,
}

impl CheckResult {
    pub fn new(code: u16, info: CheckInfo) -> Self {
        Self { code, info }
    }

    pub fn up() -> Self {
        Self::new(UP, CheckInfo::Empty)
    }

    pub fn down(reason: impl Into<String>) -> Self {
        Self::new(DOWN, CheckInfo::Reason(reason.into()))
    }

    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self::new(UNREACHABLE, CheckInfo::Reason(reason.into()))
    }

    /// Result of an override lookup: 200 when up, 503 when down.
    pub fn from_override(status: ServiceStatus) -> Self {
        let code = if status.is_up() { UP } else { DOWN };
        Self::new(code, CheckInfo::Override(status))
    }

    /// Upstream HTTP response, passed through untouched.
    pub fn passthrough(code: u16, body: Bytes) -> Self {
        Self::new(code, CheckInfo::Body(body))
    }

    pub fn is_up(&self) -> bool {
        self.code == UP
    }
}
