//! Authentication handshake state machine.
//!
//! Interprets inbound text frames and tells the transport layer what to do
//! next. The machine itself performs no I/O, which keeps the handshake
//! testable without a socket.
//!
//! # States
//!
//! ```text
//! AwaitingChallenge ──challenge──► AwaitingResult ──success──► Authenticated
//!        ▲                              │failure
//!        └────────(channel close + reconnect)◄──────────────────────┘
//! ```
//!
//! A challenge or result arriving while already authenticated is processed
//! exactly like the first one; the server is free to re-key a session.

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, warn};

use crate::auth::{compute_auth_code, AuthSession};

use super::message::{AuthSignal, Inbound, Outbound};

// ============================================================================
// HandshakeState
// ============================================================================

/// Position in the authentication sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Waiting for the server to open the handshake.
    AwaitingChallenge,
    /// Response sent, waiting for the verdict.
    AwaitingResult,
    /// Server accepted the response.
    Authenticated,
}

// ============================================================================
// HandshakeAction
// ============================================================================

/// What the transport layer must do after feeding a frame in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeAction {
    /// Send this frame over the channel.
    Send(Outbound),
    /// Authentication succeeded; discovery may start.
    AuthSucceeded,
    /// Authentication rejected; close the channel.
    Close,
    /// Nothing to do (unrecognized or irrelevant frame).
    Ignore,
}

// ============================================================================
// Handshake
// ============================================================================

/// Per-connection authentication state machine.
#[derive(Debug, Default)]
pub struct Handshake {
    state: HandshakeState,
    session: AuthSession,
}

impl Default for HandshakeState {
    fn default() -> Self {
        Self::AwaitingChallenge
    }
}

impl Handshake {
    /// Creates a fresh state machine awaiting a challenge.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Handshake history for this connection.
    #[inline]
    #[must_use]
    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    /// Feeds one inbound text frame through the machine.
    ///
    /// Frames that do not parse as a recognized shape are discarded without
    /// touching the state. Never panics, never returns an error.
    pub fn on_text(&mut self, text: &str) -> HandshakeAction {
        let Ok(frame) = serde_json::from_str::<Inbound>(text) else {
            return HandshakeAction::Ignore;
        };

        let Inbound::Authentication(signal) = frame;
        match signal {
            AuthSignal::Challenge { challenge } => {
                let code = compute_auth_code(&challenge);
                debug!(%challenge, "authentication challenge received");

                self.session = AuthSession {
                    last_challenge: Some(challenge),
                    last_code: Some(code.clone()),
                };
                self.state = HandshakeState::AwaitingResult;

                HandshakeAction::Send(Outbound::auth_response(code))
            }

            AuthSignal::Result { success: true } => {
                debug!("authentication accepted");
                self.state = HandshakeState::Authenticated;
                HandshakeAction::AuthSucceeded
            }

            AuthSignal::Result { success: false } => {
                warn!("authentication rejected by server");
                HandshakeAction::Close
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
