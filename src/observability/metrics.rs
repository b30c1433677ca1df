//! Metrics collection and exposition.
//!
//! # Metrics
//! - `hacheck_checks_total` (counter): checks by protocol and result code
//! - `hacheck_check_duration_seconds` (histogram): time to produce a result
//! - `hacheck_overrides_total` (counter): checks answered by an override,
//!   by scope (`host` for `all`, otherwise `service`)

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::spool::ALL_SERVICES;

pub const CHECKS_TOTAL: &str = "hacheck_checks_total";
pub const CHECK_DURATION: &str = "hacheck_check_duration_seconds";
pub const OVERRIDES_TOTAL: &str = "hacheck_overrides_total";

/// Start the Prometheus exporter on `addr`. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    metrics::describe_counter!(CHECKS_TOTAL, "Checks answered, by protocol and code");
    metrics::describe_histogram!(
        CHECK_DURATION,
        metrics::Unit::Seconds,
        "Time taken to answer a check"
    );
    metrics::describe_counter!(OVERRIDES_TOTAL, "Checks answered by an operator override");

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_check(protocol: &'static str, code: u16, start: Instant) {
    metrics::counter!(CHECKS_TOTAL, "protocol" => protocol, "code" => code.to_string())
        .increment(1);
    metrics::histogram!(CHECK_DURATION, "protocol" => protocol)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_override(overriding_service: &str) {
    let scope = if overriding_service == ALL_SERVICES {
        "host"
    } else {
        "service"
    };
    metrics::counter!(OVERRIDES_TOTAL, "scope" => scope).increment(1);
}
