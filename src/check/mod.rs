//! Health check subsystem.
//!
//! # Data Flow
//! ```text
//! CheckTarget (service, port, protocol, query, headers, params)
//!     → dispatcher.rs
//!         → spool is_up(service)
//!             down → 503 + stored reason, no network
//!             up   → protocol checker
//!                      http.rs  (HTTP / HTTPS)  no answer → 599
//!                      tcp.rs                   no connect → 503
//!                      smtp.rs                  any failure → 503
//!     → CheckResult (code, info)
//! ```
//!
//! # Design Decisions
//! - Operator overrides always pre-empt live probes
//! - Expected failures become results, never errors
//! - Checks share no mutable state and may finish in any order

pub mod dispatcher;
pub mod http;
pub mod result;
pub mod smtp;
pub mod target;
pub mod tcp;

pub use dispatcher::{Dispatcher, SetupError};
pub use http::HttpChecker;
pub use result::{CheckInfo, CheckResult, DOWN, UNREACHABLE, UP};
pub use smtp::SmtpChecker;
pub use target::{CheckTarget, Protocol, UnknownProtocol};
pub use tcp::TcpChecker;
