//! Pass-through wallet state for one session.
//!
//! [`WalletSession`] holds the provider handle and the address the
//! presentation layer reported, plus the last fetched encryption key.
//! The core reads this state only to relay it; it performs no wallet
//! logic of its own.

use std::fmt;
use std::sync::Arc;

use whisperlink_types::{EncryptionPublicKey, Result, WalletAddress};

use crate::provider::WalletProvider;

// ---------------------------------------------------------------------------
// WalletSession
// ---------------------------------------------------------------------------

/// Optional wallet state carried alongside the network session.
///
/// All fields start absent; the presentation layer fills them in as
/// the user connects a wallet. Absence is always "not yet available",
/// never an error.
#[derive(Clone, Default)]
pub struct WalletSession {
    provider: Option<Arc<dyn WalletProvider>>,
    address: Option<WalletAddress>,
    encryption_public_key: Option<EncryptionPublicKey>,
}

impl WalletSession {
    /// Creates an empty wallet session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Connects a provider: requests the active address and stores
    /// both handle and address on success.
    ///
    /// # Errors
    ///
    /// Relays the provider's error unchanged. On error nothing is
    /// stored.
    pub async fn connect(&mut self, provider: Arc<dyn WalletProvider>) -> Result<WalletAddress> {
        let address = provider.request_address().await?;
        tracing::info!(address = %address.abbreviated(), "wallet connected");

        self.provider = Some(provider);
        self.address = Some(address.clone());
        Ok(address)
    }

    /// Requests the encryption public key from the provider and caches
    /// it.
    ///
    /// Returns `Ok(None)` when provider or address is absent — the key
    /// is simply not yet available.
    ///
    /// # Errors
    ///
    /// Relays the provider's error unchanged; the cached key, if any,
    /// is left untouched.
    pub async fn fetch_encryption_public_key(&mut self) -> Result<Option<EncryptionPublicKey>> {
        let (provider, address) = match (&self.provider, &self.address) {
            (Some(provider), Some(address)) => (Arc::clone(provider), address.clone()),
            _ => return Ok(None),
        };

        let key = provider.request_encryption_public_key(&address).await?;
        tracing::debug!(address = %address.abbreviated(), "encryption public key retrieved");

        self.encryption_public_key = Some(key.clone());
        Ok(Some(key))
    }

    /// Replaces the provider handle (pass-through from presentation).
    pub fn set_provider(&mut self, provider: Arc<dyn WalletProvider>) {
        self.provider = Some(provider);
    }

    /// Returns the provider handle, if connected.
    pub fn provider(&self) -> Option<&Arc<dyn WalletProvider>> {
        self.provider.as_ref()
    }

    /// Replaces the active address (pass-through from presentation).
    pub fn set_address(&mut self, address: WalletAddress) {
        self.address = Some(address);
    }

    /// Returns the active address, if any.
    pub fn address(&self) -> Option<&WalletAddress> {
        self.address.as_ref()
    }

    /// Returns the cached encryption public key, if fetched.
    pub fn encryption_public_key(&self) -> Option<&EncryptionPublicKey> {
        self.encryption_public_key.as_ref()
    }

    /// Abbreviated address for display, when an address is set.
    pub fn display_address(&self) -> Option<String> {
        self.address.as_ref().map(WalletAddress::abbreviated)
    }
}

impl fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletSession")
            .field("provider", &self.provider.is_some())
            .field("address", &self.address)
            .field(
                "encryption_public_key",
                &self.encryption_public_key.is_some(),
            )
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
