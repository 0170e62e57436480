//! Core shared types for the Whisperlink messaging client.
//!
//! This crate defines all fundamental types used across the workspace.
//! No other crate should define shared types — everything lives here.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// WalletAddress
// ---------------------------------------------------------------------------

/// Account address as reported by the external wallet provider.
///
/// The address is opaque to the core: it is requested from the wallet
/// capability, displayed, and passed back unchanged when requesting the
/// encryption public key. No checksum or format validation is performed
/// here — the provider owns that.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Creates a new `WalletAddress` from the provider-supplied string.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Returns the full address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the abbreviated display form: first six characters,
    /// an ellipsis, then the last four.
    ///
    /// `"0xABCDEF1234567890"` becomes `"0xABCD...7890"`. Addresses of
    /// ten characters or fewer are returned unchanged, since the
    /// abbreviation would not be any shorter.
    pub fn abbreviated(&self) -> String {
        if self.0.chars().count() <= 10 {
            return self.0.clone();
        }
        let head: String = self.0.chars().take(6).collect();
        let tail: String = {
            let chars: Vec<char> = self.0.chars().collect();
            chars[chars.len() - 4..].iter().collect()
        };
        format!("{head}...{tail}")
    }
}

impl From<String> for WalletAddress {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// EncryptionPublicKey
// ---------------------------------------------------------------------------

/// Encryption public key bytes returned by the wallet provider.
///
/// The key is used by the (external) crypto layer to encrypt message
/// payloads for this account. The core treats it as opaque bytes.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct EncryptionPublicKey(Vec<u8>);

impl EncryptionPublicKey {
    /// Creates a new `EncryptionPublicKey` from raw bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the underlying bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for EncryptionPublicKey {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for EncryptionPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

// ---------------------------------------------------------------------------
// PeerSnapshot
// ---------------------------------------------------------------------------

/// A single consistent reading of peer counts taken at one poll instant.
///
/// Produced by the peer status monitor on each tick and superseded (not
/// mutated) by the next tick. Counts reflect the state observed at poll
/// time only — no history is retained.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PeerSnapshot {
    /// Peers participating in the broadcast/publish-subscribe role.
    pub relay_peers: usize,
    /// Peers participating in the store/light-push retrieval role.
    pub light_push_peers: usize,
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Lifecycle state of a network session.
///
/// ```text
/// Uninitialized ──initialize()──▶ Connecting ──▶ Ready
///                                      │
///                                      └──▶ Failed (terminal)
/// ```
///
/// There is no transition back to `Uninitialized` and no automatic
/// retry out of `Failed`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum SessionState {
    /// No connection attempt has been made.
    Uninitialized,
    /// `connect()` is in flight.
    Connecting,
    /// Client connected, monitor running.
    Ready,
    /// Connection failed; terminal for this session.
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Connecting => write!(f, "connecting"),
            Self::Ready => write!(f, "ready"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// WhisperlinkError
// ---------------------------------------------------------------------------

/// Central error type for the Whisperlink system.
///
/// All crates in the workspace convert their internal errors into variants
/// of this enum, ensuring a unified error handling surface.
#[derive(Debug, Error)]
pub enum WhisperlinkError {
    /// Bootstrap or transport failure while establishing the network
    /// connection. Surfaced to the session, which transitions to
    /// `Failed`. Never retried automatically.
    #[error("connection error: {reason}")]
    ConnectionError {
        /// Human-readable description of the connection failure.
        reason: String,
    },

    /// Failure while enumerating store/light-push peers on a poll tick.
    /// Recovered locally: the tick's snapshot is not emitted.
    #[error("peer enumeration error: {reason}")]
    EnumerationError {
        /// Human-readable description of the enumeration failure.
        reason: String,
    },

    /// Error relayed from the external wallet provider (user rejection,
    /// locked wallet, absent provider). The core does not interpret it.
    #[error("wallet error: {reason}")]
    WalletError {
        /// Human-readable description of the wallet failure.
        reason: String,
    },

    /// A configuration value is invalid or missing.
    #[error("config error: {reason}")]
    ConfigError {
        /// Human-readable description of the configuration problem.
        reason: String,
    },

    /// Session lifecycle misuse, e.g. teardown before initialization.
    #[error("session error: {reason}")]
    SessionError {
        /// Human-readable description of the lifecycle violation.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Result alias
// ---------------------------------------------------------------------------

/// Convenience result type using [`WhisperlinkError`].
pub type Result<T> = std::result::Result<T, WhisperlinkError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_abbreviated_form() {
        let addr = WalletAddress::new("0xABCDEF1234567890");
        assert_eq!(addr.abbreviated(), "0xABCD...7890");
    }

    #[test]
    fn address_abbreviation_of_short_address_is_identity() {
        let addr = WalletAddress::new("0xABCD1234");
        assert_eq!(addr.abbreviated(), "0xABCD1234");
    }

    #[test]
    fn address_display_is_full_form() {
        let addr = WalletAddress::new("0xABCDEF1234567890");
        assert_eq!(addr.to_string(), "0xABCDEF1234567890");
    }

    #[test]
    fn encryption_key_hex_display() {
        let key = EncryptionPublicKey::new(vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(key.to_string(), "deadbeef");
    }

    #[test]
    fn snapshot_default_is_zero() {
        let snapshot = PeerSnapshot::default();
        assert_eq!(snapshot.relay_peers, 0);
        assert_eq!(snapshot.light_push_peers, 0);
    }

    #[test]
    fn snapshot_serde_json_roundtrip() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let snapshot = PeerSnapshot {
            relay_peers: 3,
            light_push_peers: 2,
        };
        let json = serde_json::to_string(&snapshot)?;
        let parsed: PeerSnapshot = serde_json::from_str(&json)?;
        assert_eq!(snapshot, parsed);
        Ok(())
    }

    #[test]
    fn session_state_display() {
        assert_eq!(SessionState::Uninitialized.to_string(), "uninitialized");
        assert_eq!(SessionState::Connecting.to_string(), "connecting");
        assert_eq!(SessionState::Ready.to_string(), "ready");
        assert_eq!(SessionState::Failed.to_string(), "failed");
    }

    #[test]
    fn error_display() {
        let err = WhisperlinkError::ConnectionError {
            reason: "no bootstrap peers reachable".into(),
        };
        assert!(err.to_string().contains("no bootstrap peers reachable"));
    }
}
