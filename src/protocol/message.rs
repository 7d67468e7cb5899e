//! Inbound and outbound frame types.
//!
//! Frames carry a two-level tag: `type` selects the module
//! ("authentication" or "command") and `subtype` the operation, with the
//! payload nested under `arguments`:
//!
//! ```json
//! {
//!   "type": "command",
//!   "subtype": "changeDevice",
//!   "arguments": { "index": 3 }
//! }
//! ```
//!
//! Inbound frames that do not match a recognized shape fail to parse; the
//! handshake treats that as an ignorable frame rather than an error, since
//! the server pushes update messages this adapter has no use for.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Client identifier sent with the authentication response.
pub const CLIENT_DEVICE: &str = "Companion";

// ============================================================================
// Outbound Frames
// ============================================================================

/// All frames this adapter sends over the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Outbound {
    /// Authentication module frames.
    Authentication(AuthResponse),
    /// Command module frames.
    Command(DeviceCommand),
}

/// Outbound authentication frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "subtype", content = "arguments", rename_all = "lowercase")]
pub enum AuthResponse {
    /// Digest reply to a server challenge.
    Response {
        /// Uppercase hex authentication code.
        response: String,
        /// Fixed client identifier.
        device: String,
    },
}

/// Outbound command frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "subtype", content = "arguments", rename_all = "camelCase")]
pub enum DeviceCommand {
    /// Select the active device slot.
    ChangeDevice {
        /// Target slot index.
        index: i64,
    },

    /// Apply a stored look to the active slot.
    ApplyGrade {
        /// Target look uid.
        uid: String,
    },
}

impl Outbound {
    /// Builds an authentication response for a computed code.
    #[inline]
    #[must_use]
    pub fn auth_response(code: String) -> Self {
        Self::Authentication(AuthResponse::Response {
            response: code,
            device: CLIENT_DEVICE.to_string(),
        })
    }

    /// Builds a change-active-slot command.
    #[inline]
    #[must_use]
    pub fn change_device(index: i64) -> Self {
        Self::Command(DeviceCommand::ChangeDevice { index })
    }

    /// Builds an apply-grade command.
    #[inline]
    #[must_use]
    pub fn apply_grade(uid: impl Into<String>) -> Self {
        Self::Command(DeviceCommand::ApplyGrade { uid: uid.into() })
    }
}

// ============================================================================
// Inbound Frames
// ============================================================================

/// Frames this adapter interprets from the server.
///
/// Any frame whose `type` is not "authentication" fails to parse into this
/// enum and is discarded by the handshake.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Inbound {
    /// Authentication module frames.
    Authentication(AuthSignal),
}

/// Inbound authentication frames.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "subtype", content = "arguments", rename_all = "lowercase")]
pub enum AuthSignal {
    /// Server nonce opening the handshake.
    Challenge {
        /// Nonce to digest.
        challenge: String,
    },

    /// Handshake outcome.
    Result {
        /// Whether the response was accepted.
        success: bool,
    },
}

// ============================================================================
// Tests
// ============================================================================
