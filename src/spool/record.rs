//! Override records and service identifiers.

/// Reserved service identifier for the host-wide override.
pub const ALL_SERVICES: &str = "all";

/// Persisted override state for one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideState {
    /// No record exists.
    Up,
    /// A record exists; the service is forced down.
    Down { reason: String },
}

/// Result of looking up a service in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceStatus {
    pub service: String,
    pub state: OverrideState,
}

impl ServiceStatus {
    pub fn up(service: &str) -> Self {
        Self {
            service: service.to_string(),
            state: OverrideState::Up,
        }
    }

    pub fn down(service: &str, reason: impl Into<String>) -> Self {
        Self {
            service: service.to_string(),
            state: OverrideState::Down {
                reason: reason.into(),
            },
        }
    }

    pub fn is_up(&self) -> bool {
        matches!(self.state, OverrideState::Up)
    }

    /// The stored reason, or an empty string when up.
    pub fn reason(&self) -> &str {
        match &self.state {
            OverrideState::Up => "",
            OverrideState::Down { reason } => reason,
        }
    }

    /// `{"service": .., "reason": ..}` as reported to callers.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "service": self.service,
            "reason": self.reason(),
        })
    }
}

/// Returns true if `service` can be used as a record file name.
///
/// The name must stay a single path component under the root.
pub fn is_valid_service(service: &str) -> bool {
    !service.is_empty()
        && service != "."
        && service != ".."
        && !service.contains('/')
        && !service.contains('\0')
}
