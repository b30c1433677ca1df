//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeout > 0, addresses parse)
//! - Check header names are legal HTTP tokens
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure apart from checking the CA file exists

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::HacheckConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    Address { field: &'static str, value: String },

    #[error("checks.timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("spool.root must not be empty")]
    EmptySpoolRoot,

    #[error("{field}: invalid header name {value:?}")]
    HeaderName { field: &'static str, value: String },

    #[error("checks.tls.ca_path {0:?} does not exist")]
    MissingCa(PathBuf),
}

pub fn validate_config(config: &HacheckConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(
        "listener.bind_address",
        &config.listener.bind_address,
        &mut errors,
    );
    if config.observability.metrics_enabled {
        check_address(
            "observability.metrics_address",
            &config.observability.metrics_address,
            &mut errors,
        );
    }

    if config.spool.root.as_os_str().is_empty() {
        errors.push(ValidationError::EmptySpoolRoot);
    }

    if config.checks.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if let Some(name) = &config.checks.service_name_header {
        check_header("checks.service_name_header", name, &mut errors);
    }
    for name in &config.checks.forward_headers {
        check_header("checks.forward_headers", name, &mut errors);
    }

    if let Some(path) = &config.checks.tls.ca_path {
        if !path.exists() {
            errors.push(ValidationError::MissingCa(path.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::Address {
            field,
            value: value.to_string(),
        });
    }
}

fn check_header(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if HeaderName::from_bytes(value.as_bytes()).is_err() {
        errors.push(ValidationError::HeaderName {
            field,
            value: value.to_string(),
        });
    }
}
