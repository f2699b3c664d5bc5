//! Settings for the HTTP host that exposes the collector.
//!
//! The host serves the plugin entry points (`/v1/metric-types`,
//! `/v1/collect`, `/v1/config-policy`, `/v1/meta`) to a remote scheduler.
//! It binds to loopback unless told otherwise, since the endpoints carry no
//! authentication.

use serde::{Deserialize, Serialize};

/// Where and how the plugin endpoints are served.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// Interface the scheduler connects to
    pub host: String,
    /// Listening port, `DEFAULT_WEB_PORT` unless overridden
    pub port: u16,
    /// Send permissive CORS headers so browser-based dashboards can query
    /// `/v1/collect` directly
    pub enable_cors: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: crate::DEFAULT_WEB_PORT,
            enable_cors: false,
        }
    }
}

impl WebConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_cors(mut self, enable_cors: bool) -> Self {
        self.enable_cors = enable_cors;
        self
    }

    /// `host:port` as handed to the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL a scheduler would use to reach the plugin endpoints.
    pub fn endpoint_url(&self) -> String {
        format!("http://{}/v1", self.bind_address())
    }
}
