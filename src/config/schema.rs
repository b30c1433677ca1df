//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the daemon.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for hacheck.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HacheckConfig {
    /// Front-end listener.
    pub listener: ListenerConfig,

    /// Override store location.
    pub spool: SpoolConfig,

    /// Live probe settings.
    pub checks: ChecksConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:3333").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3333".to_string(),
        }
    }
}

/// Override store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SpoolConfig {
    /// Directory holding one file per service that is marked down.
    pub root: PathBuf,
}

impl Default for SpoolConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/var/spool/hacheck"),
        }
    }
}

/// Live protocol check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChecksConfig {
    /// Deadline for connect plus handshake, in seconds.
    pub timeout_secs: u64,

    /// Header carrying the checked service's name to HTTP(S) backends.
    pub service_name_header: Option<String>,

    /// User-Agent sent on HTTP(S) probes.
    pub user_agent: String,

    /// Inbound request headers copied onto HTTP(S) probes.
    pub forward_headers: Vec<String>,

    /// TLS settings for HTTPS probes.
    pub tls: ProbeTlsConfig,
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            service_name_header: None,
            user_agent: concat!("hacheck/", env!("CARGO_PKG_VERSION")).to_string(),
            forward_headers: Vec::new(),
            tls: ProbeTlsConfig::default(),
        }
    }
}

/// TLS settings for HTTPS probes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeTlsConfig {
    /// Verify the backend's certificate chain and name.
    pub verify: bool,

    /// Extra PEM bundle trusted in addition to the built-in roots.
    pub ca_path: Option<PathBuf>,

    /// Name presented via SNI and checked against the certificate.
    pub server_name: String,
}

impl Default for ProbeTlsConfig {
    fn default() -> Self {
        Self {
            verify: true,
            ca_path: None,
            server_name: "localhost".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log level when `RUST_LOG` is unset.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Prometheus endpoint address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9333".to_string(),
        }
    }
}
