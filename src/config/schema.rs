//! Configuration schema definitions.
//!
//! All types derive Serde traits so an embedding host can deserialize them
//! from whatever configuration source it owns.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Startup configuration for the gateway.
///
/// Immutable once the listener is bound.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Directory the bundled UI assets are served from.
    pub static_root: PathBuf,

    /// Host to bind the listener to.
    pub host: String,

    /// Port to bind; 0 picks a free ephemeral port.
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            static_root: PathBuf::from("public"),
            host: "127.0.0.1".to_string(),
            port: 0,
        }
    }
}

impl GatewayConfig {
    /// `host:port` form accepted by the listener bind call.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_binds_loopback_ephemeral() {
        let config = GatewayConfig::default();
        assert_eq!(config.bind_address(), "127.0.0.1:0");
    }
}
