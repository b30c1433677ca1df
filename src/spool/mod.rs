//! Override store ("spool").
//!
//! # Data Flow
//! ```text
//! operator (hacheck-cli down/up)
//!     → store.rs (write/unlink <root>/<service>)
//!
//! every check
//!     → store.rs is_up(service)
//!         → status("all")      host-wide override, wins if down
//!         → status(service)    per-service override
//!     → record.rs ServiceStatus { Up | Down(reason) }
//! ```
//!
//! # On-disk layout
//! - One flat file per down service, named exactly as the service.
//! - File content is the reason, raw.
//! - No file means up. `all` is reserved for the whole host.
//!
//! # Design Decisions
//! - No in-process cache: every read hits the filesystem so operators can
//!   toggle state by hand
//! - Last writer wins; concurrent writers are not coordinated

pub mod record;
pub mod store;

pub use record::{OverrideState, ServiceStatus, ALL_SERVICES};
pub use store::{ConfigurationError, Spool, SpoolError};
