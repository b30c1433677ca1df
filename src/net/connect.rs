//! Bounded-time connections to local services.
//!
//! # Responsibilities
//! - Connect to `127.0.0.1:<port>`
//! - Run a protocol session over the stream under a single deadline
//! - Classify refused vs timed out vs other I/O failure

use std::future::Future;
use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use tokio::net::TcpStream;

use crate::net::error::ProbeError;

/// Every probe targets the local host.
pub const PROBE_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Opens probe connections with a fixed timeout.
#[derive(Debug, Clone, Copy)]
pub struct Connector {
    timeout: Duration,
}

impl Connector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Connect to `port` and run `session` over the stream.
    ///
    /// Connect and session share one deadline. When it passes, the
    /// session future is dropped together with the stream, so any pending
    /// read or write is abandoned and the socket closed.
    pub async fn run<T, F, Fut>(&self, port: u16, session: F) -> Result<T, ProbeError>
    where
        F: FnOnce(TcpStream) -> Fut,
        Fut: Future<Output = Result<T, ProbeError>>,
    {
        let work = async move {
            let stream = TcpStream::connect((PROBE_HOST, port))
                .await
                .map_err(classify_connect_error)?;
            session(stream).await
        };

        match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(port, timeout = ?self.timeout, "Probe timed out");
                Err(ProbeError::TimedOut(self.timeout))
            }
        }
    }

    /// Connect only, then hand back the open stream.
    pub async fn connect(&self, port: u16) -> Result<TcpStream, ProbeError> {
        self.run(port, |stream| async move { Ok(stream) }).await
    }
}

fn classify_connect_error(e: io::Error) -> ProbeError {
    match e.kind() {
        io::ErrorKind::ConnectionRefused => ProbeError::Refused,
        _ => ProbeError::Io(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::{TcpListener, TcpSocket};

    /// A port that is bound but not listening, so connects are refused.
    fn unlistened_port() -> (TcpSocket, u16) {
        let socket = TcpSocket::new_v4().unwrap();
        socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let port = socket.local_addr().unwrap().port();
        (socket, port)
    }

    #[tokio::test]
    async fn connects_to_listening_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let connector = Connector::new(Duration::from_secs(2));
        let stream = connector.connect(port).await.unwrap();
        assert_eq!(stream.peer_addr().unwrap().port(), port);
    }

    #[tokio::test]
    async fn refused_is_classified() {
        let (_socket, port) = unlistened_port();

        let connector = Connector::new(Duration::from_secs(2));
        let err = connector.connect(port).await.unwrap_err();
        assert!(matches!(err, ProbeError::Refused), "got {err:?}");
    }

    #[tokio::test]
    async fn session_error_is_passed_through() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let connector = Connector::new(Duration::from_secs(2));
        let err = connector
            .run(port, |_stream| async move { Err::<(), _>(ProbeError::PeerClosed) })
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::PeerClosed));
    }

    #[tokio::test]
    async fn timeout_covers_session_and_closes_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let connector = Connector::new(Duration::from_millis(200));
        let probe = tokio::spawn(async move {
            connector
                .run(port, |_stream| std::future::pending::<Result<(), ProbeError>>())
                .await
        });

        let (mut accepted, _) = listener.accept().await.unwrap();
        let err = probe.await.unwrap().unwrap_err();
        assert!(matches!(err, ProbeError::TimedOut(_)), "got {err:?}");

        // The probe side hung up when the deadline passed.
        let mut buf = [0u8; 1];
        let n = accepted.read(&mut buf).await.unwrap();
        assert_eq!(n, 0);
    }
}
