//! Connection configuration.
//!
//! Two fields drive the adapter: the grading server's host (required) and
//! port (defaults to "9000"). The boundary supplies a fresh config via
//! [`Adapter::start`](crate::Adapter::start) or
//! [`Adapter::reconfigure`](crate::Adapter::reconfigure); a changed config
//! triggers a full reconnect.

// ============================================================================
// Imports
// ============================================================================

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Port used when the boundary supplies none.
pub const DEFAULT_PORT: &str = "9000";

// ============================================================================
// ConnectionConfig
// ============================================================================

/// Connection target for one grading server.
///
/// The port is kept as a string since it arrives verbatim from the
/// boundary's configuration form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Server hostname or IP address. Must be non-blank.
    pub host: String,

    /// Server port, default "9000".
    pub port: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT.to_string(),
        }
    }
}

impl ConnectionConfig {
    /// Creates a config for the given host with the default port.
    #[inline]
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT.to_string(),
        }
    }

    /// Sets the port.
    #[inline]
    #[must_use]
    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = port.into();
        self
    }

    /// Validates the config.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the host is empty or whitespace. No
    /// connection attempt may be made against an invalid config.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::config("host must not be blank"));
        }
        Ok(())
    }

    /// WebSocket endpoint for the persistent channel.
    #[inline]
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://{}:{}", self.host.trim(), self.port)
    }

    /// Base URL for the catalog HTTP endpoints.
    #[inline]
    #[must_use]
    pub fn http_base(&self) -> String {
        format!("http://{}:{}", self.host.trim(), self.port)
    }
}

// ============================================================================
// Tests
// ============================================================================
