//! Gradelink - client adapter for color-grading control servers.
//!
//! This library connects to a grading server over a persistent WebSocket
//! channel, authenticates with a challenge-response handshake, discovers the
//! server's device slots and look library, and exposes a single remote
//! command: apply a look to a slot.
//!
//! # Architecture
//!
//! The adapter is a plain stateful service object embedded by a host
//! boundary (typically a control-surface plugin framework):
//!
//! - [`Adapter`] owns: one WebSocket connection + supervisor task + catalog
//! - Status and action-definition changes stream out as [`AdapterEvent`]s
//! - A lost channel reconnects on a fixed delay until [`Adapter::stop`]
//!
//! # Quick Start
//!
//! ```no_run
//! use gradelink::{Adapter, ConnectionConfig};
//!
//! #[tokio::main]
//! async fn main() -> gradelink::Result<()> {
//!     let (adapter, mut events) = Adapter::new();
//!     adapter.start(ConnectionConfig::new("gradehost"));
//!
//!     // ... once authenticated and the catalog has arrived:
//!     adapter.apply_grade(3, "uid-xyz").await?;
//!
//!     adapter.stop();
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapter`] | Service object, status surface, boundary events |
//! | [`auth`] | Challenge-response digest engine |
//! | [`catalog`] | Slot/look discovery over HTTP |
//! | [`config`] | Connection configuration |
//! | [`dispatch`] | Choice lists and the apply-grade command |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`protocol`] | Channel message types and handshake (internal) |
//! | [`transport`] | Channel lifecycle and reconnection (internal) |

// ============================================================================
// Modules
// ============================================================================

/// Service object, status surface, boundary events.
pub mod adapter;

/// Challenge-response digest engine.
pub mod auth;

/// Slot/look discovery over HTTP.
pub mod catalog;

/// Connection configuration.
pub mod config;

/// Choice lists and the apply-grade command.
pub mod dispatch;

/// Error types and result aliases.
pub mod error;

/// Channel message types and handshake state machine.
pub mod protocol;

/// Channel lifecycle and reconnection.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Service types
pub use adapter::{Adapter, AdapterEvent, ConnectionState, Status};

// Configuration
pub use config::ConnectionConfig;

// Catalog types
pub use catalog::{Catalog, Look, Slot};

// Action surface
pub use dispatch::{ActionDefinition, ActionOption, Choice};

// Error types
pub use error::{Error, Result};
