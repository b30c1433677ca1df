//! SMTP liveness check.
//!
//! # State machine
//! ```text
//! Connect → AwaitBanner → SendQuit → AwaitGoodbye → Close
//!    │           │            │            │
//!    └───────────┴────────────┴────────────┴──→ 503 with reason
//! ```
//!
//! Banner and goodbye are each one complete line; their codes and text
//! are not checked. A multi-line banner is read as its first line.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufStream};
use tokio::net::TcpStream;

use crate::check::result::CheckResult;
use crate::check::target::CheckTarget;
use crate::net::{Connector, ProbeError};

const QUIT: &[u8] = b"QUIT\r\n";

#[derive(Debug, Clone, Copy)]
pub struct SmtpChecker {
    connector: Connector,
}

impl SmtpChecker {
    pub fn new(connector: Connector) -> Self {
        Self { connector }
    }

    /// Failures of any kind, including connect and timeout, are 503.
    pub async fn check(&self, target: &CheckTarget) -> CheckResult {
        match self.connector.run(target.port, handshake).await {
            Ok(()) => CheckResult::up(),
            Err(e) => {
                tracing::warn!(service = %target.service, port = target.port, error = %e, "SMTP check failed");
                CheckResult::down(e.to_string())
            }
        }
    }
}

async fn handshake(stream: TcpStream) -> Result<(), ProbeError> {
    let mut stream = BufStream::new(stream);

    read_line(&mut stream).await?;

    stream.write_all(QUIT).await?;
    stream.flush().await?;

    read_line(&mut stream).await?;

    let _ = stream.shutdown().await;
    Ok(())
}

/// Read one `\n`-terminated line. Its content is not inspected.
async fn read_line<R>(reader: &mut R) -> Result<(), ProbeError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    reader.read_until(b'\n', &mut line).await?;
    if !line.ends_with(b"\n") {
        return Err(ProbeError::PeerClosed);
    }
    Ok(())
}
