//! Challenge-response authentication digest.
//!
//! The server opens every session by sending a random challenge string. The
//! client proves knowledge of the shared secret by returning the MD5 digest
//! of the challenge with the secret appended, rendered as uppercase hex.
//!
//! The concatenation order (challenge first, secret appended) and the exact
//! secret bytes are a fixed contract with the server and must not change.

// ============================================================================
// Imports
// ============================================================================

use md5::{Digest, Md5};

// ============================================================================
// Constants
// ============================================================================

/// Shared secret appended to the server challenge. Never logged.
const AUTH_SECRET: &str = "eJ2sKzXp7RqLmVd4";

// ============================================================================
// AuthSession
// ============================================================================

/// Handshake history for one connection.
///
/// Created when a challenge arrives and kept for the lifetime of the
/// connection. The last computed code doubles as the credential for the
/// catalog HTTP fetches.
#[derive(Debug, Clone, Default)]
pub struct AuthSession {
    /// Most recent challenge received from the server.
    pub last_challenge: Option<String>,

    /// Code computed for that challenge.
    pub last_code: Option<String>,
}

// ============================================================================
// Digest
// ============================================================================

/// Computes the authentication code for a server challenge.
///
/// Pure and infallible: always returns exactly 32 uppercase hexadecimal
/// characters for any input string.
#[must_use]
pub fn compute_auth_code(challenge: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(challenge.as_bytes());
    hasher.update(AUTH_SECRET.as_bytes());
    hex::encode_upper(hasher.finalize())
}

// ============================================================================
// Tests
// ============================================================================
