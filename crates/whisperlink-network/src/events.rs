//! Network events emitted by the Whisperlink client.
//!
//! [`NetworkEvent`] is the unified event type that consumers receive
//! from the swarm driver task. All libp2p-specific events are mapped
//! into this enum before being delivered to higher layers.

use libp2p::PeerId;

// ---------------------------------------------------------------------------
// NetworkEvent
// ---------------------------------------------------------------------------

/// Events emitted by the Whisperlink network layer.
///
/// Higher layers (session controller, presentation) subscribe to these
/// events to react to network activity without coupling to libp2p
/// internals.
#[derive(Clone, Debug)]
pub enum NetworkEvent {
    /// A message arrived on the session's content topic.
    ///
    /// The payload is opaque encrypted bytes; decryption is delegated
    /// to the crypto layer behind the wallet capability.
    MessageReceived {
        /// Peer that propagated the message to us.
        source: PeerId,
        /// Raw payload bytes.
        data: Vec<u8>,
    },

    /// A remote peer connected to this node.
    PeerConnected(PeerId),

    /// A remote peer disconnected from this node.
    PeerDisconnected(PeerId),
}
