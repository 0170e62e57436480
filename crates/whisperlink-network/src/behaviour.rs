//! Combined libp2p behaviour for the Whisperlink client.
//!
//! Composes the three protocols a session needs:
//!
//! - `gossipsub` — pub/sub message exchange; peers subscribed to the
//!   session's content topic form the relay peer set.
//! - `kad` — Kademlia DHT, seeded from the bootstrap nodes, used for
//!   peer routing beyond the bootstrap set.
//! - `identify` — peer metadata exchange on every new connection. The
//!   advertised protocol list is how store/light-push capable peers
//!   are recognised.

use std::time::Duration;

use libp2p::swarm::NetworkBehaviour;
use libp2p::{gossipsub, identify, identity, kad, PeerId, StreamProtocol};

use whisperlink_types::WhisperlinkError;

use crate::config::NetworkConfig;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Protocol advertised by peers offering the store/light-push role.
///
/// This client does not serve the protocol itself; it only looks for
/// it in the Identify listings of connected peers.
pub const STORE_PROTOCOL: &str = "/whisperlink/store/1.0.0";

/// Identify protocol version string.
pub const IDENTIFY_PROTOCOL: &str = "/whisperlink/id/1.0.0";

/// Maximum allowed gossip message size (64 KiB).
pub const MAX_GOSSIP_SIZE: usize = 65_536;

// ---------------------------------------------------------------------------
// Combined behaviour
// ---------------------------------------------------------------------------

/// Combined network behaviour for a Whisperlink session.
///
/// The `#[derive(NetworkBehaviour)]` macro auto-generates
/// `ClientBehaviourEvent` with one variant per field.
#[derive(NetworkBehaviour)]
pub struct ClientBehaviour {
    /// Pub/sub message exchange on the content topic.
    pub gossipsub: gossipsub::Behaviour,
    /// Kademlia DHT for peer routing.
    pub kademlia: kad::Behaviour<kad::store::MemoryStore>,
    /// Peer metadata exchange, including supported protocols.
    pub identify: identify::Behaviour,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Builds the combined [`ClientBehaviour`] from the given identity and
/// config.
///
/// # Errors
///
/// Returns `WhisperlinkError::ConnectionError` if the gossipsub config
/// is rejected, or `WhisperlinkError::ConfigError` if the Kademlia
/// protocol name is invalid.
pub fn build_behaviour(
    keypair: &identity::Keypair,
    config: &NetworkConfig,
) -> whisperlink_types::Result<ClientBehaviour> {
    // --- Gossipsub ----------------------------------------------------------

    let gossip_config = gossipsub::ConfigBuilder::default()
        .max_transmit_size(MAX_GOSSIP_SIZE)
        .build()
        .map_err(|e| WhisperlinkError::ConnectionError {
            reason: format!("failed to build gossipsub config: {e}"),
        })?;

    let gossipsub = gossipsub::Behaviour::new(
        gossipsub::MessageAuthenticity::Signed(keypair.clone()),
        gossip_config,
    )
    .map_err(|e| WhisperlinkError::ConnectionError {
        reason: format!("failed to create gossipsub behaviour: {e}"),
    })?;

    // --- Kademlia -----------------------------------------------------------

    let local_peer_id = PeerId::from(keypair.public());

    let protocol = StreamProtocol::try_from_owned(config.kad_protocol.clone()).map_err(|e| {
        WhisperlinkError::ConfigError {
            reason: format!(
                "invalid Kademlia protocol name '{}': {e}",
                config.kad_protocol
            ),
        }
    })?;

    let mut kad_config = kad::Config::new(protocol);
    kad_config.set_query_timeout(Duration::from_secs(config.kad_query_timeout_secs));

    let store = kad::store::MemoryStore::new(local_peer_id);
    let kademlia = kad::Behaviour::with_config(local_peer_id, store, kad_config);

    // --- Identify -----------------------------------------------------------

    let identify_config = identify::Config::new(IDENTIFY_PROTOCOL.into(), keypair.public())
        .with_agent_version(format!("whisperlink/{}", env!("CARGO_PKG_VERSION")));

    let identify = identify::Behaviour::new(identify_config);

    Ok(ClientBehaviour {
        gossipsub,
        kademlia,
        identify,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_behaviour_default_config() {
        let keypair = identity::Keypair::generate_ed25519();
        let config = NetworkConfig::default();
        assert!(build_behaviour(&keypair, &config).is_ok());
    }

    #[test]
    fn build_behaviour_invalid_kad_protocol_fails() {
        let keypair = identity::Keypair::generate_ed25519();
        let config = NetworkConfig {
            kad_protocol: "no-leading-slash".into(),
            ..NetworkConfig::default()
        };
        assert!(build_behaviour(&keypair, &config).is_err());
    }
}
