//! Reverse proxy for the reserved `/api` namespace.
//!
//! # Data Flow
//! ```text
//! /api request
//!     → target.rs (strip prefix, resolve against apiBase)
//!     → forward.rs (plain HTTP: sanitize headers, stream bodies)
//!       or
//!     → tunnel.rs (Upgrade: dial raw TCP/TLS, replay handshake, splice)
//! ```

pub mod forward;
pub mod headers;
pub mod target;
pub mod tunnel;
