//! Error types for the grading-server adapter.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use gradelink::{Adapter, Result};
//!
//! async fn example(adapter: &Adapter) -> Result<()> {
//!     adapter.apply_grade(3, "uid-xyz").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Dispatch | [`Error::NotConnected`], [`Error::ConnectionClosed`] |
//! | Discovery | [`Error::CatalogFetch`] |
//! | External | [`Error::Json`], [`Error::WebSocket`] |
//!
//! Transport-level failures (socket errors, authentication rejection) are
//! consumed by the connection manager and reported through the status
//! surface; they never reach the boundary as error values.

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when the supplied connection config is invalid (blank host).
    /// Terminal until the adapter is reconfigured.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Dispatch Errors
    // ========================================================================
    /// No channel is currently open.
    ///
    /// Returned when a command is dispatched while disconnected. Surfaced to
    /// the caller rather than silently dropped.
    #[error("Not connected to a grading server")]
    NotConnected,

    /// Channel closed while a command was being dispatched.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Discovery Errors
    // ========================================================================
    /// Catalog fetch failed.
    ///
    /// Returned when a slot or look discovery request fails to resolve or
    /// parse. The cached catalog is left untouched.
    #[error("Catalog fetch failed: {message}")]
    CatalogFetch {
        /// Description of the fetch failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a catalog fetch error.
    #[inline]
    pub fn catalog_fetch(message: impl Into<String>) -> Self {
        Self::CatalogFetch {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a connection-level error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::NotConnected | Self::ConnectionClosed | Self::WebSocket(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("host must not be blank");
        assert_eq!(
            err.to_string(),
            "Configuration error: host must not be blank"
        );
    }

    #[test]
    fn test_catalog_fetch_display() {
        let err = Error::catalog_fetch("connection refused");
        assert_eq!(err.to_string(), "Catalog fetch failed: connection refused");
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::NotConnected.is_connection_error());
        assert!(Error::ConnectionClosed.is_connection_error());
        assert!(!Error::config("test").is_connection_error());
        assert!(!Error::catalog_fetch("test").is_connection_error());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
