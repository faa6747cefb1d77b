//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → head sniff (server.rs)
//!     → rewind.rs (replay sniffed bytes into the HTTP layer)
//!
//! Outbound tunnel dial
//!     → tls.rs (TLS + SNI for wss/https targets)
//! ```

use std::time::Duration;

pub mod rewind;
pub mod tls;

/// Bound on outbound connect attempts; a dead upstream must not hang a
/// request or an upgrade forever.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
