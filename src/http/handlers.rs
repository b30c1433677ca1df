use std::sync::atomic::Ordering;

use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::check::{CheckTarget, Protocol};
use crate::http::response::ApiError;
use crate::http::server::AppState;

/// Decoded path segments of a check request.
///
/// The trailing query is read from the raw URI instead, see [`raw_query`].
#[derive(Debug, Deserialize)]
pub struct CheckPath {
    pub protocol: String,
    pub service: String,
    pub port: u16,
}

#[derive(Debug, Serialize)]
pub struct DaemonStatus {
    pub version: &'static str,
    pub uptime_secs: u64,
    pub checks_served: u64,
}

/// `GET /{protocol}/{service}/{port}[/{*query}]`
pub async fn run_check(
    State(state): State<AppState>,
    Path(path): Path<CheckPath>,
    RawQuery(params): RawQuery,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let protocol: Protocol = path.protocol.parse()?;

    let target = CheckTarget::new(protocol, path.service, path.port)
        .with_query(raw_query(uri.path()))
        .with_query_params(params.unwrap_or_default())
        .with_headers(forwarded_headers(&state, &headers));

    let result = state.dispatcher.check(&target).await?;
    state.checks_served.fetch_add(1, Ordering::Relaxed);

    tracing::debug!(
        protocol = %target.protocol,
        service = %target.service,
        port = target.port,
        code = result.code,
        "Check answered"
    );
    Ok(result.into_response())
}

/// `GET /status`
pub async fn get_status(State(state): State<AppState>) -> Json<DaemonStatus> {
    Json(DaemonStatus {
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started.elapsed().as_secs(),
        checks_served: state.checks_served.load(Ordering::Relaxed),
    })
}

/// Everything after `/{protocol}/{service}/{port}/`, still percent-encoded.
fn raw_query(path: &str) -> &str {
    path.splitn(5, '/').nth(4).unwrap_or("")
}

fn forwarded_headers(state: &AppState, inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for name in state.forward_headers.iter() {
        for value in inbound.get_all(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}
