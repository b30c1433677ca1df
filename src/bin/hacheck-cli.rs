use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use hacheck::config::{load_config, SpoolConfig};
use hacheck::spool::Spool;

#[derive(Parser)]
#[command(name = "hacheck-cli")]
#[command(about = "Operator CLI for hacheck overrides and checks", long_about = None)]
struct Cli {
    /// Override store directory. Takes precedence over --config.
    #[arg(long, env = "HACHECK_SPOOL_ROOT")]
    spool_root: Option<PathBuf>,

    /// Read the store location from a hacheck config file.
    #[arg(short, long, env = "HACHECK_CONFIG")]
    config: Option<PathBuf>,

    /// Daemon base URL, used by `check`.
    #[arg(short, long, default_value = "http://127.0.0.1:3333")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Force a service (or `all`) down
    Down {
        service: String,
        #[arg(short, long, default_value = "")]
        reason: String,
    },
    /// Remove a service's override
    Up { service: String },
    /// Show a service's override and effective state
    Status { service: String },
    /// List every service currently forced down
    List,
    /// Ask the running daemon to check a service
    Check {
        protocol: String,
        service: String,
        port: u16,
        #[arg(default_value = "")]
        query: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Down { service, reason } => {
            open_spool(&cli)?.mark_down(service, reason)?;
            println!("{service}: down");
        }
        Commands::Up { service } => {
            open_spool(&cli)?.mark_up(service)?;
            println!("{service}: up");
        }
        Commands::Status { service } => {
            let spool = open_spool(&cli)?;
            let own = spool.status(service)?;
            let effective = spool.is_up(service)?;
            if own.is_up() {
                println!("{service}: no override");
            } else {
                println!("{service}: down ({})", own.reason());
            }
            if effective.service != *service && !effective.is_up() {
                println!("overridden by {}: {}", effective.service, effective.reason());
            }
            return Ok(exit_for(effective.is_up()));
        }
        Commands::List => {
            for status in open_spool(&cli)?.list_down()? {
                println!("{}\t{}", status.service, status.reason());
            }
        }
        Commands::Check {
            protocol,
            service,
            port,
            query,
        } => {
            let url = format!(
                "{}/{}/{}/{}/{}",
                cli.url.trim_end_matches('/'),
                protocol,
                service,
                port,
                query.trim_start_matches('/')
            );
            let res = reqwest::get(url).await?;
            let status = res.status();
            let body = res.text().await?;
            println!("{}", status.as_u16());
            if !body.is_empty() {
                println!("{body}");
            }
            return Ok(exit_for(status.is_success()));
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn open_spool(cli: &Cli) -> Result<Spool, Box<dyn std::error::Error>> {
    Ok(Spool::configure(spool_root(cli)?)?)
}

fn spool_root(cli: &Cli) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(root) = &cli.spool_root {
        return Ok(root.clone());
    }
    match &cli.config {
        Some(path) => Ok(load_config(path)?.spool.root),
        None => Ok(SpoolConfig::default().root),
    }
}

fn exit_for(up: bool) -> ExitCode {
    if up {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
