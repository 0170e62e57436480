//! The external wallet provider contract.

use futures::future::BoxFuture;

use whisperlink_types::{EncryptionPublicKey, Result, WalletAddress};

// ---------------------------------------------------------------------------
// WalletProvider
// ---------------------------------------------------------------------------

/// Capability exposed by an external wallet.
///
/// Implementations wrap whatever transport reaches the actual wallet
/// (extension RPC, IPC, a test double). Methods return boxed futures
/// so providers can be held as trait objects behind the session's
/// provider handle.
///
/// Failures are provider-defined (user rejection, locked wallet,
/// absent provider) and surface as `WhisperlinkError::WalletError`;
/// the core passes them through without interpretation.
pub trait WalletProvider: Send + Sync {
    /// Requests the currently active account address.
    fn request_address(&self) -> BoxFuture<'_, Result<WalletAddress>>;

    /// Requests the encryption public key for the given address.
    fn request_encryption_public_key<'a>(
        &'a self,
        address: &'a WalletAddress,
    ) -> BoxFuture<'a, Result<EncryptionPublicKey>>;
}
