//! Network configuration for the Whisperlink libp2p layer.
//!
//! All values have documented defaults. Validation ensures no
//! zero-valued timeouts or invalid protocol names at startup.
//!
//! This config lives in `whisperlink-network` rather than
//! `whisperlink-types` to avoid pulling `libp2p::Multiaddr` into the
//! shared types crate.

use libp2p::multiaddr::Protocol;
use libp2p::Multiaddr;
use serde::{Deserialize, Serialize};

use whisperlink_types::{Result, WhisperlinkError};

// ---------------------------------------------------------------------------
// Well-known bootstrap nodes
// ---------------------------------------------------------------------------

/// Default bootstrap nodes for the Whisperlink network.
///
/// Community-run entry points into the network. They are not central
/// servers — once the session has discovered peers through Kademlia it
/// no longer needs them. Used unless the caller supplies its own list.
///
/// Format: `/ip4/<ip>/tcp/<port>/p2p/<peer_id>`
///    or:  `/dns4/<domain>/tcp/<port>/p2p/<peer_id>`
pub const DEFAULT_BOOTSTRAP_NODES: &[&str] = &[
    "/dns4/boot-01.whisperlink.net/tcp/30303/p2p/12D3KooWJdorLfGhEBJeEYKnfox4ppPBMD6CCzvX1GB73NqgAc7A",
    "/dns4/boot-02.whisperlink.net/tcp/30303/p2p/QmaCpDMGvV2BGHeYERUEnRQAwe3N8SzbUtfsmvsqQLuvuJ",
];

/// Content topic on which private-message payloads are exchanged.
pub const DEFAULT_CONTENT_TOPIC: &str = "/whisperlink/1/private-message/proto";

/// Network-layer configuration.
///
/// Controls the listen address, bootstrap peers, timeouts, and the
/// protocol names used for pub/sub and discovery.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Multiaddr on which this node listens for incoming connections.
    ///
    /// Default: `/ip4/0.0.0.0/tcp/0` (OS-assigned port on all interfaces).
    #[serde(with = "multiaddr_serde")]
    pub listen_addr: Multiaddr,

    /// Bootstrap nodes to dial on connect.
    ///
    /// Each entry must be a fully-qualified multiaddr containing a
    /// `/p2p/<peer_id>` component. Merged with
    /// [`DEFAULT_BOOTSTRAP_NODES`]; see
    /// [`effective_bootstrap_nodes`](Self::effective_bootstrap_nodes).
    #[serde(with = "multiaddr_vec_serde")]
    pub bootstrap_nodes: Vec<Multiaddr>,

    /// Seconds to wait for the first established connection before
    /// `connect()` fails.
    ///
    /// Without this bound an unresponsive bootstrap set would leave the
    /// session in `Connecting` indefinitely.
    pub bootstrap_timeout_secs: u64,

    /// Seconds before an idle connection is closed by the swarm.
    pub idle_timeout_secs: u64,

    /// Gossipsub content topic for message exchange.
    ///
    /// Peers subscribed to this topic form the relay peer set.
    pub content_topic: String,

    /// Kademlia protocol name for network isolation.
    ///
    /// Nodes using different protocol names will not exchange
    /// Kademlia messages. Default: `/whisperlink/kad/1.0.0`.
    pub kad_protocol: String,

    /// Seconds before a Kademlia query times out.
    pub kad_query_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        // Built protocol-by-protocol; the string form would need a
        // fallible parse.
        let mut listen_addr = Multiaddr::empty();
        listen_addr.push(Protocol::Ip4(std::net::Ipv4Addr::UNSPECIFIED));
        listen_addr.push(Protocol::Tcp(0));

        Self {
            listen_addr,
            bootstrap_nodes: Vec::new(),
            bootstrap_timeout_secs: 30,
            idle_timeout_secs: 60,
            content_topic: DEFAULT_CONTENT_TOPIC.into(),
            kad_protocol: "/whisperlink/kad/1.0.0".into(),
            kad_query_timeout_secs: 30,
        }
    }
}

impl NetworkConfig {
    /// Returns the effective list of bootstrap nodes: hardcoded
    /// defaults merged with user-configured nodes, deduplicated.
    pub fn effective_bootstrap_nodes(&self) -> Vec<Multiaddr> {
        let mut nodes: Vec<Multiaddr> = DEFAULT_BOOTSTRAP_NODES
            .iter()
            .filter_map(|s| s.parse::<Multiaddr>().ok())
            .collect();

        for addr in &self.bootstrap_nodes {
            if !nodes.iter().any(|existing| existing == addr) {
                nodes.push(addr.clone());
            }
        }

        nodes
    }

    /// Validates all configuration values.
    ///
    /// Returns `Err(WhisperlinkError::ConfigError)` if any value is
    /// outside its acceptable range.
    pub fn validate(&self) -> Result<()> {
        if self.bootstrap_timeout_secs == 0 {
            return Err(WhisperlinkError::ConfigError {
                reason: "bootstrap_timeout_secs must be greater than 0".into(),
            });
        }
        if self.idle_timeout_secs == 0 {
            return Err(WhisperlinkError::ConfigError {
                reason: "idle_timeout_secs must be greater than 0".into(),
            });
        }
        if self.content_topic.is_empty() {
            return Err(WhisperlinkError::ConfigError {
                reason: "content_topic must not be empty".into(),
            });
        }
        if self.kad_protocol.is_empty() {
            return Err(WhisperlinkError::ConfigError {
                reason: "kad_protocol must not be empty".into(),
            });
        }
        if !self.kad_protocol.starts_with('/') {
            return Err(WhisperlinkError::ConfigError {
                reason: "kad_protocol must start with '/'".into(),
            });
        }
        if self.kad_query_timeout_secs == 0 {
            return Err(WhisperlinkError::ConfigError {
                reason: "kad_query_timeout_secs must be greater than 0".into(),
            });
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Serde helpers — Multiaddr does not implement Serialize/Deserialize
// ---------------------------------------------------------------------------

mod multiaddr_serde {
    use libp2p::Multiaddr;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(addr: &Multiaddr, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&addr.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<Multiaddr, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

mod multiaddr_vec_serde {
    use libp2p::Multiaddr;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(addrs: &[Multiaddr], serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(addrs.len()))?;
        for addr in addrs {
            seq.serialize_element(&addr.to_string())?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<Vec<Multiaddr>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let strings: Vec<String> = Vec::deserialize(deserializer)?;
        strings
            .into_iter()
            .map(|s| s.parse().map_err(serde::de::Error::custom))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
