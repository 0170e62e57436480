//! Wallet capability boundary for Whisperlink.
//!
//! The wallet itself is an external collaborator (a browser extension,
//! a hardware device, a remote signer). This crate defines the narrow
//! contract the core needs from it:
//!
//! - **request address** — which account is active.
//! - **request encryption public key** — the key the crypto layer uses
//!   to encrypt payloads for that account.
//!
//! Both operations are asynchronous and fallible (user rejection,
//! locked wallet, absent provider). The core relays results unchanged
//! and never interprets wallet errors; an absent result means "not yet
//! available", never a fatal error.
//!
//! [`session::WalletSession`] is the pass-through state the session
//! controller keeps on behalf of the presentation layer.

pub mod provider;
pub mod session;

pub use provider::WalletProvider;
pub use session::WalletSession;
