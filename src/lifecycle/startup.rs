//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Bind the listener last, once checks can be answered
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently

use std::net::SocketAddr;

use metrics_exporter_prometheus::BuildError;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::check::{Dispatcher, SetupError};
use crate::config::HacheckConfig;
use crate::http::HttpServer;
use crate::observability::metrics::init_metrics;
use crate::spool::{ConfigurationError, Spool};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("override store: {0}")]
    Spool(#[from] ConfigurationError),

    #[error("checkers: {0}")]
    Checkers(#[from] SetupError),

    #[error("metrics exporter: {0}")]
    Metrics(#[from] BuildError),

    #[error("invalid address {0:?}")]
    Address(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
}

/// Everything needed to start serving.
pub struct Prepared {
    pub server: HttpServer,
    pub listener: TcpListener,
}

/// Bring up the daemon's subsystems from a validated configuration.
pub async fn prepare(config: &HacheckConfig) -> Result<Prepared, StartupError> {
    if config.observability.metrics_enabled {
        init_metrics(parse_addr(&config.observability.metrics_address)?)?;
    }

    let spool = Spool::configure(&config.spool.root)?;
    tracing::info!(root = %spool.root().display(), "Override store ready");

    let dispatcher = Dispatcher::from_config(spool, &config.checks)?;
    let server = HttpServer::new(dispatcher, &config.checks);

    let addr = parse_addr(&config.listener.bind_address)?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;

    Ok(Prepared { server, listener })
}

fn parse_addr(value: &str) -> Result<SocketAddr, StartupError> {
    value
        .parse()
        .map_err(|_| StartupError::Address(value.to_string()))
}
