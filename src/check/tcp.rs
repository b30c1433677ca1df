//! Bare TCP connect check.

use crate::check::result::CheckResult;
use crate::check::target::CheckTarget;
use crate::net::Connector;

/// Up if a connection can be opened; no bytes are exchanged.
///
/// Connect failures are 503 here, not 599: at this layer "nothing
/// answered" and "down" are the same signal.
#[derive(Debug, Clone, Copy)]
pub struct TcpChecker {
    connector: Connector,
}

impl TcpChecker {
    pub fn new(connector: Connector) -> Self {
        Self { connector }
    }

    pub async fn check(&self, target: &CheckTarget) -> CheckResult {
        match self.connector.connect(target.port).await {
            Ok(stream) => {
                drop(stream);
                CheckResult::up()
            }
            Err(e) => {
                tracing::warn!(service = %target.service, port = target.port, error = %e, "TCP check failed");
                CheckResult::down(e.to_string())
            }
        }
    }
}
