//! HTTP front-end subsystem.
//!
//! # Data Flow
//! ```text
//! GET /{protocol}/{service}/{port}/{*query}?{params}
//!     → server.rs (router, request id, tracing)
//!     → handlers.rs (build CheckTarget, forward selected headers)
//!     → check::Dispatcher
//!     → response.rs (CheckResult → status line + body)
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
