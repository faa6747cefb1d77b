//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! embedding host / CLI flags
//!     → schema.rs (GatewayConfig: static root, listen host, listen port)
//!     → immutable once the listener is bound
//!
//! per request:
//!     runtime.rs provider closure
//!     → RuntimeConfig (apiBase, apiProxyBase)
//!     → consulted fresh on every request, never cached
//! ```
//!
//! # Design Decisions
//! - The backend location is owned by the embedding host and can change at
//!   runtime; the gateway only ever sees it through the provider closure
//! - Base URLs are normalized (trimmed, single trailing slash stripped)
//!   before they are used to build proxy targets

pub mod runtime;
pub mod schema;

pub use runtime::{env_config_provider, ConfigProvider, RuntimeConfig};
pub use schema::GatewayConfig;
