//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use hacheck::config::HacheckConfig;
use hacheck::lifecycle::startup::prepare;
use hacheck::lifecycle::Shutdown;
use hacheck::spool::Spool;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// A running daemon with a throwaway override store.
pub struct TestDaemon {
    pub addr: SocketAddr,
    pub spool: Spool,
    pub shutdown: Shutdown,
    _dir: TempDir,
}

impl TestDaemon {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start hacheck on an ephemeral port. `tweak` adjusts the config first.
pub async fn start_hacheck(tweak: impl FnOnce(&mut HacheckConfig)) -> TestDaemon {
    let dir = tempfile::tempdir().unwrap();
    let mut config = HacheckConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.spool.root = dir.path().join("spool");
    config.checks.timeout_secs = 2;
    tweak(&mut config);

    let prepared = prepare(&config).await.unwrap();
    let addr = prepared.listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    tokio::spawn(prepared.server.run(prepared.listener, shutdown.clone()));

    TestDaemon {
        addr,
        spool: Spool::configure(&config.spool.root).unwrap(),
        shutdown,
        _dir: dir,
    }
}

/// Bind an ephemeral loopback port.
pub async fn bind_local() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

/// Start a mock HTTP backend. `f` receives the raw request head and
/// returns the status code and body to answer with.
pub async fn start_programmable_backend<F, Fut>(f: F) -> u16
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let (listener, port) = bind_local().await;
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let head = read_request_head(&mut socket).await;
                let (status, body) = f(head).await;
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    reason_phrase(status),
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    port
}

/// Start a mock HTTP backend that always answers `status` with `body`.
pub async fn start_mock_backend(status: u16, body: &'static str) -> u16 {
    start_programmable_backend(move |_| async move { (status, body.to_string()) }).await
}

/// Start a minimal SMTP server: banner, then `221` after `QUIT`.
pub async fn start_smtp_backend() -> u16 {
    let (listener, port) = bind_local().await;
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut stream = BufReader::new(socket);
                let _ = stream.write_all(b"220 mx.test ESMTP\r\n").await;
                let mut line = String::new();
                let _ = stream.read_line(&mut line).await;
                let _ = stream.write_all(b"221 Bye\r\n").await;
            });
        }
    });
    port
}

/// A port with nothing listening on it.
pub async fn closed_port() -> u16 {
    let (listener, port) = bind_local().await;
    drop(listener);
    port
}

async fn read_request_head(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}
