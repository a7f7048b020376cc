//! HTTP listener settings.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_bind() -> String {
    "0.0.0.0:5000".into()
}

fn default_cors_allow_origin() -> String {
    "*".into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Listen address, `host:port`.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Value for `Access-Control-Allow-Origin`. `*` allows any origin.
    #[serde(default = "default_cors_allow_origin")]
    pub cors_allow_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_allow_origin: default_cors_allow_origin(),
        }
    }
}

impl ServerConfig {
    /// Parse the bind address.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `bind` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .parse()
            .map_err(|e| ConfigError::invalid("server.bind", format!("{}: {e}", self.bind)))
    }

    /// Whether every origin is allowed.
    pub fn allows_any_origin(&self) -> bool {
        self.cors_allow_origin.trim() == "*"
    }
}
