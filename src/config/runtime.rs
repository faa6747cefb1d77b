//! Runtime backend configuration.
//!
//! The backend location belongs to the embedding host and may change while
//! the gateway is running (e.g. a settings dialog pointing the shell at a
//! different environment). It is therefore re-read through a provider
//! closure on every request instead of being captured at startup.

use std::env;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Environment variables consulted by [`env_config_provider`], in order.
const API_BASE_VARS: [&str; 3] = [
    "MINECHAT_API_BASE",
    "MINECHAT_BACKEND_BASE",
    "MINECHAT_SERVER_BASE",
];

const API_PROXY_BASE_VAR: &str = "MINECHAT_API_PROXY_BASE";

/// Backend used when no environment override is present.
const DEFAULT_API_BASE: &str = "https://back-dev.agatha.org.cn";

/// Backend locations as exposed on `/config`.
///
/// Empty strings mean "unset"; the JSON wire format always carries both
/// fields so the embedded UI can read them unconditionally. `api_proxy_base`
/// is surfaced for the UI but not consulted by the proxy itself (reserved).
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeConfig {
    pub api_base: String,
    pub api_proxy_base: String,
}

impl RuntimeConfig {
    /// The backend base URL, if configured.
    pub fn api_base(&self) -> Option<&str> {
        if self.api_base.is_empty() {
            None
        } else {
            Some(&self.api_base)
        }
    }
}

/// Per-request accessor for the current [`RuntimeConfig`].
pub type ConfigProvider = Arc<dyn Fn() -> RuntimeConfig + Send + Sync>;

/// Trim a base URL and strip a single trailing slash.
///
/// `apiBase` must never end in `/` when targets are built against it;
/// otherwise the stripped request suffix would produce `//` paths upstream.
pub fn normalize_base_url(value: &str) -> String {
    let trimmed = value.trim();
    trimmed.strip_suffix('/').unwrap_or(trimmed).to_string()
}

/// Provider that resolves the backend from `MINECHAT_*` environment
/// variables on every call, falling back to the development backend.
pub fn env_config_provider() -> ConfigProvider {
    Arc::new(|| {
        let api_base = API_BASE_VARS
            .iter()
            .find_map(|var| env::var(var).ok().filter(|v| !v.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let api_proxy_base = env::var(API_PROXY_BASE_VAR).unwrap_or_default();

        RuntimeConfig {
            api_base: normalize_base_url(&api_base),
            api_proxy_base: normalize_base_url(&api_proxy_base),
        }
    })
}
