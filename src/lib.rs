//! Embedded local HTTP gateway for the Minechat desktop shell.
//!
//! Serves the bundled web UI from disk, exposes the runtime backend
//! configuration on `/config`, reverse-proxies everything under `/api` to
//! the configured backend, and tunnels WebSocket upgrades to the same
//! backend over freshly dialed TCP/TLS sockets.

pub mod assets;
pub mod config;
pub mod error;
pub mod net;
pub mod proxy;
pub mod server;

pub use config::{env_config_provider, ConfigProvider, GatewayConfig, RuntimeConfig};
pub use error::GatewayError;
pub use server::{GatewayHandle, GatewayServer};
