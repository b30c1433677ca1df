//! hacheck daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!     Load balancer                ┌──────────────────────────────────────────────┐
//!     GET /{proto}/{svc}/{port}    │                   HACHECK                     │
//!     ─────────────────────────────┼─▶ http (axum) ──▶ check::Dispatcher           │
//!                                  │                     │                         │
//!                                  │                     ├─▶ spool  (overrides)    │
//!                                  │                     │                         │
//!                                  │                     └─▶ http / tcp / smtp ────┼──▶ 127.0.0.1:port
//!     ◀────────────────────────────┼── code + body                                 │
//!                                  │                                               │
//!                                  │  config · observability · lifecycle           │
//!                                  └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use hacheck::config::{load_config, validate_config, ConfigError, HacheckConfig};
use hacheck::lifecycle::signals::spawn_signal_handler;
use hacheck::lifecycle::startup::prepare;
use hacheck::lifecycle::Shutdown;
use hacheck::observability::logging;

#[derive(Parser)]
#[command(name = "hacheck")]
#[command(about = "Host-local health-check daemon", version)]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "HACHECK_CONFIG")]
    config: Option<PathBuf>,

    /// Address to serve checks on.
    #[arg(long, env = "HACHECK_BIND")]
    bind: Option<String>,

    /// Override store directory.
    #[arg(long, env = "HACHECK_SPOOL_ROOT")]
    spool_root: Option<PathBuf>,

    /// Probe deadline in seconds.
    #[arg(long, env = "HACHECK_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Header naming the checked service on HTTP(S) probes.
    #[arg(long, env = "HACHECK_SERVICE_NAME_HEADER")]
    service_name_header: Option<String>,
}

impl Args {
    fn apply(self, config: &mut HacheckConfig) {
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(root) = self.spool_root {
            config.spool.root = root;
        }
        if let Some(secs) = self.timeout_secs {
            config.checks.timeout_secs = secs;
        }
        if let Some(header) = self.service_name_header {
            config.checks.service_name_header = Some(header);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = Args::parse();

    let mut config = match args.config.take() {
        Some(path) => load_config(&path)?,
        None => HacheckConfig::default(),
    };
    args.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "hacheck starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        spool_root = %config.spool.root.display(),
        timeout_secs = config.checks.timeout_secs,
        "Configuration loaded"
    );

    let prepared = prepare(&config).await?;

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    prepared.server.run(prepared.listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
