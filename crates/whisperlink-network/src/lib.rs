//! Whisperlink libp2p network layer.
//!
//! Owns the single peer-to-peer connection of a session and exposes
//! read access to the peers known for each transport role.
//!
//! # Architecture
//!
//! - [`config`] — Network configuration with defaults and validation
//! - [`behaviour`] — Gossipsub + Kademlia + Identify behaviour
//! - [`client`] — [`client::NetworkClient`]: connect, peer queries, publish
//! - [`events`] — Unified [`events::NetworkEvent`] for consumers
//!
//! The two peer roles are deliberately asymmetric: the relay set is a
//! live in-memory set readable synchronously, while store/light-push
//! peers are enumerated on demand through an asynchronous stream. The
//! [`client::PeerDirectory`] trait captures exactly that capability
//! split.

pub mod behaviour;
pub mod client;
pub mod config;
pub mod events;
