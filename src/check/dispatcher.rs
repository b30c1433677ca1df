//! Override lookup followed by the protocol probe.

use std::time::{Duration, Instant};

use hyper::header::{HeaderName, HeaderValue};
use thiserror::Error;

use crate::check::http::HttpChecker;
use crate::check::result::CheckResult;
use crate::check::smtp::SmtpChecker;
use crate::check::target::{CheckTarget, Protocol};
use crate::check::tcp::TcpChecker;
use crate::config::ChecksConfig;
use crate::net::{Connector, TlsProbe, TlsSetupError};
use crate::observability::metrics;
use crate::spool::{Spool, SpoolError};

/// The checkers could not be built from configuration.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid service name header {0:?}")]
    ServiceNameHeader(String),

    #[error("invalid user agent {0:?}")]
    UserAgent(String),

    #[error(transparent)]
    Tls(#[from] TlsSetupError),
}

/// Routes a check to the override store and then the right checker.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    spool: Spool,
    http: HttpChecker,
    https: HttpChecker,
    tcp: TcpChecker,
    smtp: SmtpChecker,
}

impl Dispatcher {
    pub fn new(
        spool: Spool,
        http: HttpChecker,
        https: HttpChecker,
        tcp: TcpChecker,
        smtp: SmtpChecker,
    ) -> Self {
        Self {
            spool,
            http,
            https,
            tcp,
            smtp,
        }
    }

    /// Build every checker from one configuration value.
    pub fn from_config(spool: Spool, config: &ChecksConfig) -> Result<Self, SetupError> {
        let connector = Connector::new(Duration::from_secs(config.timeout_secs));

        let service_name_header = config
            .service_name_header
            .as_deref()
            .map(|name| {
                HeaderName::from_bytes(name.as_bytes())
                    .map_err(|_| SetupError::ServiceNameHeader(name.to_string()))
            })
            .transpose()?;
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|_| SetupError::UserAgent(config.user_agent.clone()))?;

        let http = HttpChecker::new(connector)
            .with_service_name_header(service_name_header)
            .with_user_agent(user_agent);
        let https = http.clone().with_tls(TlsProbe::from_config(&config.tls)?);

        tracing::info!(
            timeout_secs = config.timeout_secs,
            service_name_header = ?config.service_name_header,
            tls_verify = config.tls.verify,
            "Checkers configured"
        );

        Ok(Self::new(
            spool,
            http,
            https,
            TcpChecker::new(connector),
            SmtpChecker::new(connector),
        ))
    }

    pub fn spool(&self) -> &Spool {
        &self.spool
    }

    /// Run one check.
    ///
    /// Only an override store failure is an error; every probe outcome is
    /// a result.
    pub async fn check(&self, target: &CheckTarget) -> Result<CheckResult, SpoolError> {
        let start = Instant::now();
        let status = self.spool.lookup(&target.service).await?;

        let result = if !status.is_up() {
            tracing::info!(
                service = %target.service,
                protocol = %target.protocol,
                overridden_by = %status.service,
                reason = %status.reason(),
                "Service overridden down"
            );
            metrics::record_override(&status.service);
            CheckResult::from_override(status)
        } else {
            match target.protocol {
                Protocol::Spool => CheckResult::from_override(status),
                Protocol::Http => self.http.check(target).await,
                Protocol::Https => self.https.check(target).await,
                Protocol::Tcp => self.tcp.check(target).await,
                Protocol::Smtp => self.smtp.check(target).await,
            }
        };

        metrics::record_check(target.protocol.as_str(), result.code, start);
        Ok(result)
    }
}
