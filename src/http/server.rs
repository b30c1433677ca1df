//! HTTP server setup.
//!
//! # Responsibilities
//! - Create Axum Router with the check and status handlers
//! - Wire up middleware (request ID, tracing)
//! - Serve on a listener until shutdown is signalled

use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{HeaderName, Request};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::check::Dispatcher;
use crate::config::ChecksConfig;
use crate::http::handlers::{get_status, run_check};
use crate::http::request::{UuidRequestId, X_REQUEST_ID};
use crate::lifecycle::Shutdown;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    /// Inbound headers copied onto HTTP(S) probes.
    pub forward_headers: Arc<[HeaderName]>,
    pub started: Instant,
    pub checks_served: Arc<AtomicU64>,
}

/// HTTP front-end over the dispatcher.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(dispatcher: Dispatcher, checks: &ChecksConfig) -> Self {
        let forward_headers = checks
            .forward_headers
            .iter()
            .filter_map(|name| match HeaderName::from_bytes(name.as_bytes()) {
                Ok(header) => Some(header),
                Err(_) => {
                    tracing::warn!(header = %name, "Ignoring invalid forward header");
                    None
                }
            })
            .collect();

        let state = AppState {
            dispatcher: Arc::new(dispatcher),
            forward_headers,
            started: Instant::now(),
            checks_served: Arc::new(AtomicU64::new(0)),
        };

        Self {
            router: Self::build_router(state),
        }
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/status", get(get_status))
            .route("/{protocol}/{service}/{port}", get(run_check))
            .route("/{protocol}/{service}/{port}/", get(run_check))
            .route("/{protocol}/{service}/{port}/{*query}", get(run_check))
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "check_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The router, for serving elsewhere or driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` fires, then let in-flight checks finish.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: Shutdown,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.signalled())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
