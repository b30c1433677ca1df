//! HTTP and HTTPS checks.
//!
//! # Responsibilities
//! - Issue `GET <query>[?<params>]` to the local service
//! - Tag the request with the service name when configured
//! - Pass any received response through as the result
//!
//! # Design Decisions
//! - Status codes are not interpreted: 3xx, 4xx and 5xx are forwarded
//!   as-is and redirects are never followed
//! - No response at all (refused, timeout, broken handshake) is 599

use bytes::{Bytes, BytesMut};
use http_body_util::{BodyExt, Empty};
use hyper::body::Incoming;
use hyper::header::{HeaderName, HeaderValue, CONNECTION, HOST, USER_AGENT};
use hyper::{Method, Request, StatusCode, Uri};
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::check::result::CheckResult;
use crate::check::target::CheckTarget;
use crate::net::{Connector, ProbeError, TlsProbe, PROBE_HOST};

/// Bytes of a probed response body kept; the rest is discarded.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// GET-based checker, over plain TCP or TLS.
#[derive(Debug, Clone)]
pub struct HttpChecker {
    connector: Connector,
    tls: Option<TlsProbe>,
    service_name_header: Option<HeaderName>,
    user_agent: HeaderValue,
}

impl HttpChecker {
    pub fn new(connector: Connector) -> Self {
        Self {
            connector,
            tls: None,
            service_name_header: None,
            user_agent: HeaderValue::from_static(concat!("hacheck/", env!("CARGO_PKG_VERSION"))),
        }
    }

    /// Wrap every probe in a TLS handshake.
    pub fn with_tls(mut self, tls: TlsProbe) -> Self {
        self.tls = Some(tls);
        self
    }

    pub fn with_service_name_header(mut self, header: Option<HeaderName>) -> Self {
        self.service_name_header = header;
        self
    }

    pub fn with_user_agent(mut self, user_agent: HeaderValue) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn is_tls(&self) -> bool {
        self.tls.is_some()
    }

    pub async fn check(&self, target: &CheckTarget) -> CheckResult {
        let request = match self.build_request(target) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(service = %target.service, error = %e, "Could not build probe request");
                return CheckResult::unreachable(e.to_string());
            }
        };

        let tls = self.tls.clone();
        let outcome = self
            .connector
            .run(target.port, move |stream| async move {
                match tls {
                    Some(tls) => exchange(tls.handshake(stream).await?, request).await,
                    None => exchange(stream, request).await,
                }
            })
            .await;

        match outcome {
            Ok((status, body)) => {
                tracing::debug!(
                    service = %target.service,
                    port = target.port,
                    status = status.as_u16(),
                    "Probe answered"
                );
                CheckResult::passthrough(status.as_u16(), body)
            }
            Err(e) if e.is_unreachable() => {
                tracing::info!(
                    service = %target.service,
                    port = target.port,
                    error = %e,
                    "Nothing answered probe"
                );
                CheckResult::unreachable(e.to_string())
            }
            Err(e) => {
                tracing::warn!(
                    service = %target.service,
                    port = target.port,
                    tls = self.is_tls(),
                    error = %e,
                    "Probe got no response"
                );
                CheckResult::unreachable(e.to_string())
            }
        }
    }

    fn build_request(&self, target: &CheckTarget) -> Result<Request<Empty<Bytes>>, ProbeError> {
        let mut path = if target.query.starts_with('/') {
            target.query.clone()
        } else {
            format!("/{}", target.query)
        };
        if !target.query_params.is_empty() {
            path.push('?');
            path.push_str(&target.query_params);
        }

        let uri: Uri = path
            .parse()
            .map_err(|e| ProbeError::Request(format!("{path:?}: {e}")))?;
        let host = HeaderValue::from_str(&format!("{}:{}", PROBE_HOST, target.port))
            .map_err(|e| ProbeError::Request(e.to_string()))?;

        let mut request = Request::new(Empty::new());
        *request.method_mut() = Method::GET;
        *request.uri_mut() = uri;

        let headers = request.headers_mut();
        headers.insert(HOST, host);
        headers.insert(USER_AGENT, self.user_agent.clone());
        headers.insert(CONNECTION, HeaderValue::from_static("close"));
        // Caller headers replace the defaults above.
        headers.extend(target.headers.clone());

        if let Some(name) = &self.service_name_header {
            match HeaderValue::from_str(&target.service) {
                Ok(value) => {
                    headers.insert(name.clone(), value);
                }
                Err(_) => {
                    tracing::warn!(service = %target.service, "Service name is not a valid header value");
                }
            }
        }

        Ok(request)
    }
}

/// One HTTP/1.1 request/response over an established stream.
async fn exchange<S>(io: S, request: Request<Empty<Bytes>>) -> Result<(StatusCode, Bytes), ProbeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(io)).await?;

    let response = async move {
        let response = sender.send_request(request).await?;
        let status = response.status();
        let body = read_body_prefix(response.into_body()).await?;
        Ok::<_, ProbeError>((status, body))
    };

    // The connection future finishes once the sender is dropped.
    let (result, conn_result) = tokio::join!(response, conn);
    if let Err(e) = conn_result {
        tracing::trace!(error = %e, "Probe connection ended with error");
    }
    result
}

/// Read at most [`MAX_BODY_BYTES`] of `body`.
async fn read_body_prefix(mut body: Incoming) -> Result<Bytes, ProbeError> {
    let mut buf = BytesMut::new();
    while let Some(frame) = body.frame().await {
        let Ok(data) = frame?.into_data() else {
            continue;
        };
        let room = MAX_BODY_BYTES - buf.len();
        if data.len() >= room {
            buf.extend_from_slice(&data[..room]);
            break;
        }
        buf.extend_from_slice(&data);
    }
    Ok(buf.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::extract::Query;
    use axum::http::{header::LOCATION, HeaderMap};
    use axum::routing::get;
    use axum::Router;
    use serde::Deserialize;
    use tokio::net::{TcpListener, TcpSocket};

    use crate::check::result::{CheckInfo, UNREACHABLE};
    use crate::check::target::Protocol;
    use crate::config::ProbeTlsConfig;

    #[derive(Deserialize)]
    struct Foo {
        foo: String,
    }

    fn app() -> Router {
        Router::new()
            .route("/", get(|| async { "TEST OK" }))
            .route(
                "/sname",
                get(|headers: HeaderMap| async move {
                    headers
                        .get("sname")
                        .map(|v| v.as_bytes().to_vec())
                        .unwrap_or_default()
                }),
            )
            .route(
                "/redirect",
                get(|| async { (StatusCode::MOVED_PERMANENTLY, [(LOCATION, "/")]) }),
            )
            .route(
                "/bip",
                get(|| async { (StatusCode::NOT_IMPLEMENTED, "NOPE") }),
            )
            .route(
                "/big",
                get(|| async { vec![b'x'; MAX_BODY_BYTES * 2] }),
            )
            .route(
                "/echo_foo",
                get(|Query(params): Query<Foo>| async move { params.foo }),
            )
            .route(
                "/trace",
                get(|headers: HeaderMap| async move {
                    headers
                        .get("x-trace")
                        .map(|v| v.as_bytes().to_vec())
                        .unwrap_or_default()
                }),
            )
    }

    async fn serve_http() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app()).await;
        });
        port
    }

    async fn serve_https() -> u16 {
        let _ = rustls::crypto::ring::default_provider().install_default();

        let cert = rcgen::generate_simple_self_signed(vec!["localhost".into()]).unwrap();
        let tls = axum_server::tls_rustls::RustlsConfig::from_pem(
            cert.cert.pem().into_bytes(),
            cert.key_pair.serialize_pem().into_bytes(),
        )
        .await
        .unwrap();

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let _ = axum_server::from_tcp_rustls(listener, tls)
                .serve(app().into_make_service())
                .await;
        });
        port
    }

    fn connector() -> Connector {
        Connector::new(Duration::from_secs(5))
    }

    fn plain() -> HttpChecker {
        HttpChecker::new(connector())
    }

    fn tls(verify: bool) -> HttpChecker {
        let config = ProbeTlsConfig {
            verify,
            ..ProbeTlsConfig::default()
        };
        HttpChecker::new(connector()).with_tls(TlsProbe::from_config(&config).unwrap())
    }

    fn target(port: u16, query: &str) -> CheckTarget {
        CheckTarget::new(Protocol::Http, "foo", port).with_query(query)
    }

    fn body(result: &CheckResult) -> &[u8] {
        match &result.info {
            CheckInfo::Body(body) => body,
            other => panic!("expected body, got {other:?}"),
        }
    }

    /// Runs the shared HTTP scenarios against one checker/server pair.
    async fn scenarios(checker: HttpChecker, port: u16) {
        let ok = checker.check(&target(port, "/")).await;
        assert_eq!(ok.code, 200);
        assert_eq!(body(&ok), b"TEST OK");

        assert_eq!(checker.check(&target(port, "/bar")).await.code, 404);
        assert_eq!(checker.check(&target(port, "/redirect")).await.code, 301);

        let nope = checker.check(&target(port, "/bip")).await;
        assert_eq!(nope.code, 501);
        assert_eq!(body(&nope), b"NOPE");

        let echoed = checker
            .check(&target(port, "/echo_foo").with_query_params("foo=bar"))
            .await;
        assert_eq!(echoed.code, 200);
        assert_eq!(body(&echoed), b"bar");

        let missing = checker.check(&target(port, "/echo_foo")).await;
        assert_eq!(missing.code, 400);
    }

    #[tokio::test]
    async fn oversized_body_keeps_status_and_is_truncated() {
        let port = serve_http().await;
        let result = plain().check(&target(port, "/big")).await;
        assert_eq!(result.code, 200);
        assert_eq!(body(&result).len(), MAX_BODY_BYTES);
    }

    #[tokio::test]
    async fn http_passes_responses_through() {
        let port = serve_http().await;
        scenarios(plain(), port).await;
    }

    #[tokio::test]
    async fn https_passes_responses_through() {
        let port = serve_https().await;
        scenarios(tls(false), port).await;
    }

    #[tokio::test]
    async fn service_name_header_is_sent() {
        let port = serve_http().await;
        let checker =
            plain().with_service_name_header(Some(HeaderName::from_static("sname")));

        let result = checker
            .check(&CheckTarget::new(Protocol::Http, "service_name", port).with_query("/sname"))
            .await;
        assert_eq!(result.code, 200);
        assert_eq!(body(&result), b"service_name");
    }

    #[tokio::test]
    async fn https_service_name_header_is_sent() {
        let port = serve_https().await;
        let checker =
            tls(false).with_service_name_header(Some(HeaderName::from_static("sname")));

        let result = checker
            .check(&CheckTarget::new(Protocol::Https, "service_name", port).with_query("/sname"))
            .await;
        assert_eq!(body(&result), b"service_name");
    }

    #[tokio::test]
    async fn no_service_name_header_by_default() {
        let port = serve_http().await;
        let result = plain().check(&target(port, "/sname")).await;
        assert_eq!(result.code, 200);
        assert_eq!(body(&result), b"");
    }

    #[tokio::test]
    async fn caller_headers_are_attached() {
        let port = serve_http().await;
        let mut headers = HeaderMap::new();
        headers.insert("x-trace", HeaderValue::from_static("abc123"));

        let result = plain()
            .check(&target(port, "/trace").with_headers(headers))
            .await;
        assert_eq!(body(&result), b"abc123");
    }

    #[tokio::test]
    async fn query_without_leading_slash_is_normalized() {
        let port = serve_http().await;
        let result = plain().check(&target(port, "echo_foo").with_query_params("foo=x")).await;
        assert_eq!(body(&result), b"x");
    }

    #[tokio::test]
    async fn nothing_listening_is_unreachable() {
        let socket = TcpSocket::new_v4().unwrap();
        socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let port = socket.local_addr().unwrap().port();

        assert_eq!(plain().check(&target(port, "/")).await.code, UNREACHABLE);
        assert_eq!(tls(false).check(&target(port, "/")).await.code, UNREACHABLE);
    }

    #[tokio::test]
    async fn silent_server_times_out_as_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let checker = HttpChecker::new(Connector::new(Duration::from_millis(200)));
        let result = checker.check(&target(port, "/")).await;
        assert_eq!(result.code, UNREACHABLE);
        assert_eq!(
            result.info,
            CheckInfo::Reason("Timed out after 200ms".into())
        );
    }

    #[tokio::test]
    async fn untrusted_certificate_is_unreachable_when_verifying() {
        let port = serve_https().await;
        let result = tls(true).check(&target(port, "/")).await;
        assert_eq!(result.code, UNREACHABLE);
    }

    #[tokio::test]
    async fn unparsable_path_is_unreachable() {
        let port = serve_http().await;
        let result = plain().check(&target(port, "/with space")).await;
        assert_eq!(result.code, UNREACHABLE);
    }
}
