//! Channel protocol message types and handshake state machine.
//!
//! Every frame on the persistent channel is a JSON object of the shape
//! `{type, subtype, arguments}`. Only the authentication frames are
//! interpreted on the inbound side; everything else the server pushes is
//! ignored.
//!
//! | Message | Direction | Purpose |
//! |---------|-----------|---------|
//! | `authentication.challenge` | Server → Client | Opens the handshake |
//! | `authentication.response` | Client → Server | Digest of the challenge |
//! | `authentication.result` | Server → Client | Accept or reject |
//! | `command.changeDevice` | Client → Server | Select the active slot |
//! | `command.applyGrade` | Client → Server | Apply a look by uid |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `message` | Inbound/outbound frame types |
//! | `handshake` | Authentication state machine |

// ============================================================================
// Submodules
// ============================================================================

/// Inbound and outbound frame types.
pub mod message;

/// Authentication handshake state machine.
pub mod handshake;

// ============================================================================
// Constants
// ============================================================================

/// Sub-protocol identifier advertised during the WebSocket upgrade.
pub const SUBPROTOCOL: &str = "lgremote";

// ============================================================================
// Re-exports
// ============================================================================

pub use handshake::{Handshake, HandshakeAction, HandshakeState};
pub use message::{AuthResponse, AuthSignal, DeviceCommand, Inbound, Outbound, CLIENT_DEVICE};
