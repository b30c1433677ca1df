//! hacheck: a host-local health-check daemon.
//!
//! Load balancers ask hacheck whether a service on this host is healthy.
//! hacheck first consults operator overrides in a spool directory, then
//! probes the service over HTTP, HTTPS, TCP or SMTP on loopback.

pub mod check;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod spool;

pub use check::{CheckResult, CheckTarget, Dispatcher, Protocol};
pub use config::HacheckConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use spool::{ServiceStatus, Spool};
