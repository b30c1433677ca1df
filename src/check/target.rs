//! What a single check request asks for.

use std::fmt;
use std::str::FromStr;

use axum::http::HeaderMap;

/// Which probe to run for a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Override store only; no network.
    Spool,
    Http,
    Https,
    Tcp,
    Smtp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Spool => "spool",
            Protocol::Http => "http",
            Protocol::Https => "https",
            Protocol::Tcp => "tcp",
            Protocol::Smtp => "smtp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProtocol(pub String);

impl fmt::Display for UnknownProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown check type {:?}", self.0)
    }
}

impl std::error::Error for UnknownProtocol {}

impl FromStr for Protocol {
    type Err = UnknownProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spool" => Ok(Protocol::Spool),
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            "tcp" => Ok(Protocol::Tcp),
            "smtp" => Ok(Protocol::Smtp),
            other => Err(UnknownProtocol(other.to_string())),
        }
    }
}

/// One check request. Built per request and never mutated while running.
#[derive(Debug, Clone)]
pub struct CheckTarget {
    pub service: String,
    pub port: u16,
    pub protocol: Protocol,
    /// HTTP path for HTTP(S); ignored by TCP and SMTP.
    pub query: String,
    /// Extra headers for HTTP(S) probes, sent verbatim.
    pub headers: HeaderMap,
    /// Raw query string appended to HTTP(S) probes when non-empty.
    pub query_params: String,
}

impl CheckTarget {
    pub fn new(protocol: Protocol, service: impl Into<String>, port: u16) -> Self {
        Self {
            service: service.into(),
            port,
            protocol,
            query: String::from("/"),
            headers: HeaderMap::new(),
            query_params: String::new(),
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_query_params(mut self, params: impl Into<String>) -> Self {
        self.query_params = params.into();
        self
    }
}
