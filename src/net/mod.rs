//! Network layer for outbound probes.
//!
//! # Data Flow
//! ```text
//! checker
//!     → connect.rs Connector::run(port, session)
//!         → TCP connect to 127.0.0.1:<port>
//!         → session(stream): protocol exchange
//!         → whole sequence bounded by one timeout
//!     → tls.rs TlsProbe::handshake (HTTPS only)
//!     → error.rs ProbeError (refused / timed out / io / protocol)
//! ```
//!
//! # Design Decisions
//! - Timeout covers connect plus handshake, not connect alone
//! - On timeout the session future is dropped, closing the socket
//! - No retries; a failed probe is reported once

pub mod connect;
pub mod error;
pub mod tls;

pub use connect::{Connector, PROBE_HOST};
pub use error::ProbeError;
pub use tls::{TlsProbe, TlsSetupError};
