//! Connection settings for the AMCP client.
//!
//! Settings come from defaults, optionally overridden by the environment:
//!
//! - `CASPAR_HOST`: server host (default `127.0.0.1`)
//! - `CASPAR_PORT`: AMCP port (default `5250`)

use std::time::Duration;

use log::{debug, warn};

use crate::types::Layer;

/// Default AMCP port.
pub const DEFAULT_PORT: u16 = 5250;

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server host name or address.
    pub host: String,
    pub port: u16,
    /// Channel/layer the deck drives.
    pub default_layer: Layer,
    /// Connection timeout.
    pub connect_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            default_layer: Layer::default(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ConnectionConfig {
    /// Defaults overridden by `CASPAR_HOST` / `CASPAR_PORT`.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(host) = get("CASPAR_HOST").filter(|h| !h.trim().is_empty()) {
            config.host = host.trim().to_string();
        }

        if let Some(port) = get("CASPAR_PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) if port != 0 => config.port = port,
                _ => warn!("Ignoring invalid CASPAR_PORT {:?}", port),
            }
        }

        debug!("Caspar endpoint from environment: {}", config.addr());
        config
    }

    /// `host:port` for connecting.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
