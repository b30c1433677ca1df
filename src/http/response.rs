//! Rendering check results and errors as HTTP responses.
//!
//! # Design Decisions
//! - The status line is the check result code, 599 included
//! - Upstream bodies are returned raw; override results as JSON
//! - Store failures are 500; bad identifiers are 400

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::check::{CheckInfo, CheckResult, UnknownProtocol};
use crate::spool::SpoolError;

impl IntoResponse for CheckResult {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match self.info {
            CheckInfo::Empty => status.into_response(),
            CheckInfo::Reason(reason) => (status, reason).into_response(),
            CheckInfo::Override(override_status) => {
                (status, Json(override_status.to_json())).into_response()
            }
            CheckInfo::Body(body) => (status, body).into_response(),
        }
    }
}

/// Failures the front-end reports instead of a check result.
#[derive(Debug)]
pub enum ApiError {
    UnknownProtocol(UnknownProtocol),
    Spool(SpoolError),
}

impl From<UnknownProtocol> for ApiError {
    fn from(e: UnknownProtocol) -> Self {
        ApiError::UnknownProtocol(e)
    }
}

impl From<SpoolError> for ApiError {
    fn from(e: SpoolError) -> Self {
        ApiError::Spool(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::UnknownProtocol(e) => (StatusCode::NOT_FOUND, e.to_string()).into_response(),
            ApiError::Spool(e @ SpoolError::InvalidService(_)) => {
                (StatusCode::BAD_REQUEST, e.to_string()).into_response()
            }
            ApiError::Spool(e @ (SpoolError::Io { .. } | SpoolError::Lookup(_))) => {
                tracing::error!(error = %e, "Override store read failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "override store unavailable").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use bytes::Bytes;

    use crate::spool::ServiceStatus;

    async fn body_of(response: Response) -> Bytes {
        to_bytes(response.into_body(), usize::MAX).await.unwrap()
    }

    #[tokio::test]
    async fn unreachable_keeps_599() {
        let response = CheckResult::unreachable("Connection refused").into_response();
        assert_eq!(response.status().as_u16(), 599);
        assert_eq!(body_of(response).await, "Connection refused");
    }

    #[tokio::test]
    async fn override_renders_as_json() {
        let response =
            CheckResult::from_override(ServiceStatus::down("web", "maint")).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let json: serde_json::Value = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(json, serde_json::json!({"service": "web", "reason": "maint"}));
    }

    #[tokio::test]
    async fn upstream_body_is_raw() {
        let response = CheckResult::passthrough(404, Bytes::from_static(b"missing")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_of(response).await, "missing");
    }

    #[tokio::test]
    async fn bare_up_has_empty_body() {
        let response = CheckResult::up().into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_of(response).await.is_empty());
    }

    #[test]
    fn error_status_codes() {
        let invalid = ApiError::from(SpoolError::InvalidService("..".into())).into_response();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let io = ApiError::from(SpoolError::Io {
            path: "/x".into(),
            source: std::io::Error::other("boom"),
        })
        .into_response();
        assert_eq!(io.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let unknown = ApiError::from(UnknownProtocol("mysql".into())).into_response();
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    }
}
