//! Persistent-channel transport layer.
//!
//! Owns the one outbound WebSocket connection to the grading server and its
//! whole lifecycle: opening, the per-session event loop, and fixed-delay
//! reconnection.
//!
//! ```text
//! ┌──────────────────┐                              ┌─────────────────┐
//! │  Adapter (Rust)  │         WebSocket            │  Grading        │
//! │                  │◄────────────────────────────►│  Server         │
//! │  supervisor task │      ws://host:9000          │                 │
//! │  → session loop  │      (sub-protocol)          │                 │
//! └──────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `link::spawn` - supervisor task starts a connection attempt
//! 2. On open - status `Ok`, session loop takes over (handshake, commands)
//! 3. On close/error - status update, one reconnect sleep, back to 1
//! 4. Shutdown signal - close the channel, cancel the pending sleep, exit

// ============================================================================
// Submodules
// ============================================================================

/// Connection supervisor and session event loop.
pub(crate) mod link;

// ============================================================================
// Re-exports
// ============================================================================

pub use link::RECONNECT_DELAY;
