//! The session's single handle to the peer-to-peer network.
//!
//! [`NetworkClient::connect`] performs the asynchronous bootstrap and,
//! on success, hands the libp2p swarm to a background driver task.
//! The client is then a cheap handle: commands reach the driver via a
//! channel, while the relay peer set is mirrored into shared state so
//! [`NetworkClient::relay_peer_count`] stays a synchronous read.
//!
//! The two peer roles are exposed asymmetrically on purpose:
//!
//! - Relay peers (subscribed to the content topic) are a live set the
//!   driver maintains from gossipsub subscription events — a direct,
//!   synchronous count.
//! - Store/light-push peers are recognised by the protocol they
//!   advertise via Identify, and enumerating them is an on-demand
//!   asynchronous walk: each [`NetworkClient::store_peer_stream`] call
//!   issues a fresh query to the driver and the caller drains the
//!   resulting stream to obtain a count.
//!
//! Forcing both roles behind a uniform synchronous count would
//! misrepresent the cost of the store-role query, so the
//! [`PeerDirectory`] trait keeps the split explicit.

use std::collections::{HashMap, HashSet};
use std::pin::Pin;
use std::sync::{Arc, RwLock};
use std::task::{Context, Poll};
use std::time::Duration;

use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use libp2p::gossipsub::{self, TopicHash};
use libp2p::swarm::SwarmEvent;
use libp2p::{identify, kad, Multiaddr, PeerId, Swarm};
use tokio::sync::{mpsc, oneshot, watch};

use whisperlink_types::{Result, WhisperlinkError};

use crate::behaviour::{
    build_behaviour, ClientBehaviour, ClientBehaviourEvent, MAX_GOSSIP_SIZE, STORE_PROTOCOL,
};
use crate::config::NetworkConfig;
use crate::events::NetworkEvent;

// ---------------------------------------------------------------------------
// Channel sizes
// ---------------------------------------------------------------------------

/// Bounded command channel capacity. Small buffer — callers await
/// backpressure if the driver is overloaded.
const COMMAND_CHANNEL_SIZE: usize = 64;

/// Per-enumeration reply channel capacity. The consumer drains the
/// stream, so a small buffer suffices.
const STORE_REPLY_BUFFER: usize = 16;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Commands sent from the client handle to the swarm driver task.
enum ClientCommand {
    /// Enumerate peers currently advertising the store protocol.
    ///
    /// The driver feeds matching peer IDs into `reply` and closes it
    /// when the enumeration is complete.
    EnumerateStorePeers { reply: mpsc::Sender<PeerId> },

    /// Publish a payload on the session's content topic.
    Publish {
        data: Vec<u8>,
        reply: oneshot::Sender<Result<()>>,
    },
}

// ---------------------------------------------------------------------------
// StorePeerStream
// ---------------------------------------------------------------------------

/// Lazy, finite, restartable enumeration of store/light-push peers.
///
/// Each [`NetworkClient::store_peer_stream`] call produces a fresh
/// stream reflecting the peer set at the moment of the call; nothing
/// is cached between calls. Draining the stream to exhaustion is the
/// only way to obtain a count for this role.
pub struct StorePeerStream {
    state: StreamState,
}

enum StreamState {
    /// The enumeration could not be started; yields one error, then ends.
    Failed(Option<WhisperlinkError>),
    /// Receiving peer IDs from the driver; ends when the driver closes
    /// the channel.
    Draining(mpsc::Receiver<PeerId>),
}

impl StorePeerStream {
    fn draining(rx: mpsc::Receiver<PeerId>) -> Self {
        Self {
            state: StreamState::Draining(rx),
        }
    }

    fn failed(err: WhisperlinkError) -> Self {
        Self {
            state: StreamState::Failed(Some(err)),
        }
    }
}

impl Stream for StorePeerStream {
    type Item = Result<PeerId>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match &mut this.state {
            StreamState::Failed(err) => Poll::Ready(err.take().map(Err)),
            StreamState::Draining(rx) => rx.poll_recv(cx).map(|opt| opt.map(Ok)),
        }
    }
}

// ---------------------------------------------------------------------------
// PeerDirectory
// ---------------------------------------------------------------------------

/// Capability interface for the two peer-role queries.
///
/// The peer status monitor polls through this trait rather than the
/// concrete client, which keeps the session layer testable with fake
/// directories and keeps the role asymmetry part of the contract.
pub trait PeerDirectory: Send + Sync + 'static {
    /// Synchronous read of the currently connected relay peers.
    fn relay_peer_count(&self) -> usize;

    /// Fresh asynchronous enumeration of store/light-push peers.
    fn store_peers(&self) -> BoxStream<'static, Result<PeerId>>;
}

// ---------------------------------------------------------------------------
// NetworkClient
// ---------------------------------------------------------------------------

/// Handle to the single peer-to-peer connection of a session.
///
/// Created exactly once per session via [`NetworkClient::connect`].
/// The handle is read-only after creation; all mutation happens inside
/// the driver task. Call [`NetworkClient::shutdown`] (or drop the
/// handle) to stop the driver when the session ends.
pub struct NetworkClient {
    local_peer_id: PeerId,
    command_tx: mpsc::Sender<ClientCommand>,
    relay_peers: Arc<RwLock<HashSet<PeerId>>>,
    event_rx: Option<mpsc::UnboundedReceiver<NetworkEvent>>,
    shutdown_tx: watch::Sender<bool>,
}

impl NetworkClient {
    /// Establishes the session's network connection.
    ///
    /// Builds the swarm (TCP + Noise + Yamux, QUIC, DNS resolution),
    /// subscribes to the content topic, dials the effective bootstrap
    /// nodes, and waits for the first established connection. The wait
    /// is bounded by `config.bootstrap_timeout_secs` so an unresponsive
    /// bootstrap set fails the connect instead of hanging it.
    ///
    /// Must be invoked at most once per session. On failure no client
    /// is produced and the caller must not retry automatically —
    /// silent retries would mask persistent misconfiguration.
    ///
    /// # Errors
    ///
    /// Returns `WhisperlinkError::ConnectionError` if transport setup
    /// fails, no bootstrap node can be dialed, every dial fails, or
    /// the timeout elapses; `WhisperlinkError::ConfigError` if the
    /// configuration is invalid.
    pub async fn connect(config: NetworkConfig) -> Result<Self> {
        config.validate()?;

        // Each session gets a fresh ephemeral identity; the session is
        // rebuilt on every application load and persists no state.
        let keypair = libp2p::identity::Keypair::generate_ed25519();
        let local_peer_id = PeerId::from(keypair.public());

        let mut swarm = libp2p::SwarmBuilder::with_existing_identity(keypair)
            .with_tokio()
            .with_tcp(
                libp2p::tcp::Config::default().nodelay(true),
                libp2p::noise::Config::new,
                libp2p::yamux::Config::default,
            )
            .map_err(|e| WhisperlinkError::ConnectionError {
                reason: format!("failed to configure TCP transport: {e}"),
            })?
            .with_quic()
            .with_dns()
            .map_err(|e| WhisperlinkError::ConnectionError {
                reason: format!("failed to configure DNS resolution: {e}"),
            })?
            .with_behaviour(|key| {
                build_behaviour(key, &config)
                    .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
            })
            .map_err(|e| WhisperlinkError::ConnectionError {
                reason: format!("failed to build network behaviour: {e}"),
            })?
            .with_swarm_config(|cfg| {
                cfg.with_idle_connection_timeout(Duration::from_secs(config.idle_timeout_secs))
            })
            .build();

        // Subscribe to the content topic so gossipsub announces us as
        // a relay participant and delivers incoming messages.
        let topic = gossipsub::IdentTopic::new(config.content_topic.clone());
        swarm
            .behaviour_mut()
            .gossipsub
            .subscribe(&topic)
            .map_err(|e| WhisperlinkError::ConnectionError {
                reason: format!("failed to subscribe to content topic: {e}"),
            })?;

        swarm
            .listen_on(config.listen_addr.clone())
            .map_err(|e| WhisperlinkError::ConnectionError {
                reason: format!("failed to start listening: {e}"),
            })?;

        // Seed Kademlia and dial the bootstrap set.
        let bootstrap = config.effective_bootstrap_nodes();
        if bootstrap.is_empty() {
            return Err(WhisperlinkError::ConnectionError {
                reason: "no bootstrap nodes configured".into(),
            });
        }

        let mut dials = 0usize;
        for addr in &bootstrap {
            match extract_peer_id(addr) {
                Some((peer_id, clean_addr)) => {
                    swarm
                        .behaviour_mut()
                        .kademlia
                        .add_address(&peer_id, clean_addr);
                }
                None => {
                    tracing::warn!(%addr, "bootstrap node missing /p2p/ component");
                }
            }
            match swarm.dial(addr.clone()) {
                Ok(()) => dials += 1,
                Err(e) => tracing::warn!(%addr, %e, "bootstrap dial failed"),
            }
        }
        if dials == 0 {
            return Err(WhisperlinkError::ConnectionError {
                reason: "no bootstrap node could be dialed".into(),
            });
        }

        // Wait for the first established connection, bounded by the
        // bootstrap timeout.
        let deadline = Duration::from_secs(config.bootstrap_timeout_secs);
        let first_peer = tokio::time::timeout(deadline, await_first_connection(&mut swarm, dials))
            .await
            .map_err(|_| WhisperlinkError::ConnectionError {
                reason: format!(
                    "no bootstrap peer responded within {}s",
                    config.bootstrap_timeout_secs
                ),
            })??;

        tracing::info!(%first_peer, "bootstrap connection established");

        // Populate the routing table beyond the bootstrap set. Failure
        // here is not fatal; the table fills as Identify reports peers.
        if let Err(e) = swarm.behaviour_mut().kademlia.bootstrap() {
            tracing::debug!(%e, "Kademlia bootstrap deferred");
        }

        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let relay_peers = Arc::new(RwLock::new(HashSet::new()));

        let driver = Driver {
            swarm,
            topic_hash: topic.hash(),
            relay_peers: Arc::clone(&relay_peers),
            peer_protocols: HashMap::new(),
            command_rx,
            event_tx,
            shutdown_rx,
        };
        tokio::spawn(driver.run());

        Ok(Self {
            local_peer_id,
            command_tx,
            relay_peers,
            event_rx: Some(event_rx),
            shutdown_tx,
        })
    }

    /// Returns the local `PeerId` of this session.
    pub fn local_peer_id(&self) -> &PeerId {
        &self.local_peer_id
    }

    /// Synchronous read of the currently connected relay peers.
    ///
    /// The count reflects the live set maintained by the driver task
    /// at the instant of the call. No side effects.
    pub fn relay_peer_count(&self) -> usize {
        self.relay_peers.read().map(|set| set.len()).unwrap_or(0)
    }

    /// Starts a fresh enumeration of store/light-push peers.
    ///
    /// The returned stream yields the peers advertising the store
    /// protocol at the moment of the call, then ends. If the driver is
    /// no longer running, the stream yields a single
    /// `EnumerationError` instead.
    pub fn store_peer_stream(&self) -> StorePeerStream {
        let (reply_tx, reply_rx) = mpsc::channel(STORE_REPLY_BUFFER);
        match self
            .command_tx
            .try_send(ClientCommand::EnumerateStorePeers { reply: reply_tx })
        {
            Ok(()) => StorePeerStream::draining(reply_rx),
            Err(e) => StorePeerStream::failed(WhisperlinkError::EnumerationError {
                reason: format!("network driver unavailable: {e}"),
            }),
        }
    }

    /// Publishes an (already encrypted) payload on the content topic.
    ///
    /// # Errors
    ///
    /// Returns `WhisperlinkError::ConnectionError` if the payload
    /// exceeds the gossip size limit, no peers are available to
    /// propagate it, or the driver has stopped.
    pub async fn publish(&self, data: Vec<u8>) -> Result<()> {
        if data.len() > MAX_GOSSIP_SIZE {
            return Err(WhisperlinkError::ConnectionError {
                reason: format!(
                    "payload size {} exceeds maximum {}",
                    data.len(),
                    MAX_GOSSIP_SIZE
                ),
            });
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(ClientCommand::Publish {
                data,
                reply: reply_tx,
            })
            .await
            .map_err(|_| WhisperlinkError::ConnectionError {
                reason: "network driver has stopped".into(),
            })?;

        reply_rx.await.map_err(|_| WhisperlinkError::ConnectionError {
            reason: "network driver dropped the publish request".into(),
        })?
    }

    /// Takes the event receiver (can only be called once).
    ///
    /// Returns `None` if already taken. The receiver delivers
    /// [`NetworkEvent`]s from the driver task.
    pub fn take_event_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<NetworkEvent>> {
        self.event_rx.take()
    }

    /// Signals the driver task to stop.
    ///
    /// Idempotent. The driver also stops on its own when the client
    /// handle is dropped.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl PeerDirectory for NetworkClient {
    fn relay_peer_count(&self) -> usize {
        NetworkClient::relay_peer_count(self)
    }

    fn store_peers(&self) -> BoxStream<'static, Result<PeerId>> {
        self.store_peer_stream().boxed()
    }
}

// ---------------------------------------------------------------------------
// Bootstrap wait
// ---------------------------------------------------------------------------

/// Drives the swarm until the first connection is established.
///
/// Fails early once every bootstrap dial has reported an outgoing
/// connection error, rather than waiting for the full timeout.
async fn await_first_connection(
    swarm: &mut Swarm<ClientBehaviour>,
    dials: usize,
) -> Result<PeerId> {
    let mut failures = 0usize;

    loop {
        match swarm.select_next_some().await {
            SwarmEvent::ConnectionEstablished { peer_id, .. } => {
                return Ok(peer_id);
            }
            SwarmEvent::OutgoingConnectionError { peer_id, error, .. } => {
                tracing::warn!(?peer_id, %error, "bootstrap connection error");
                failures += 1;
                if failures >= dials {
                    return Err(WhisperlinkError::ConnectionError {
                        reason: format!("all {dials} bootstrap dials failed"),
                    });
                }
            }
            SwarmEvent::NewListenAddr { address, .. } => {
                tracing::info!(%address, "new listen address");
            }
            other => {
                tracing::trace!(?other, "event during bootstrap");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Driver task
// ---------------------------------------------------------------------------

/// Owns the swarm after `connect()` and runs until shutdown.
///
/// The driver is the only writer of the relay peer set and the only
/// holder of Identify-reported protocol listings, so enumeration
/// results are always consistent with its view at command time.
struct Driver {
    swarm: Swarm<ClientBehaviour>,
    topic_hash: TopicHash,
    relay_peers: Arc<RwLock<HashSet<PeerId>>>,
    /// Protocols each peer advertised via Identify. Pruned on
    /// disconnect.
    peer_protocols: HashMap<PeerId, HashSet<String>>,
    command_rx: mpsc::Receiver<ClientCommand>,
    event_tx: mpsc::UnboundedSender<NetworkEvent>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Driver {
    async fn run(mut self) {
        tracing::debug!("network driver started");

        loop {
            tokio::select! {
                changed = self.shutdown_rx.changed() => {
                    // An Err means the client handle was dropped;
                    // either way the session is over.
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        break;
                    }
                }

                Some(cmd) = self.command_rx.recv() => {
                    self.handle_command(cmd);
                }

                event = self.swarm.select_next_some() => {
                    self.handle_swarm_event(event);
                }
            }
        }

        tracing::debug!("network driver exited");
    }

    fn handle_command(&mut self, cmd: ClientCommand) {
        match cmd {
            ClientCommand::EnumerateStorePeers { reply } => {
                // Capture the matching peers at command time, then feed
                // them to the consumer from a separate task so a slow
                // drain never blocks the driver.
                let peers: Vec<PeerId> = self
                    .peer_protocols
                    .iter()
                    .filter(|(peer_id, protocols)| {
                        protocols.contains(STORE_PROTOCOL) && self.swarm.is_connected(peer_id)
                    })
                    .map(|(peer_id, _)| *peer_id)
                    .collect();

                tracing::trace!(count = peers.len(), "store peer enumeration requested");

                tokio::spawn(async move {
                    for peer_id in peers {
                        if reply.send(peer_id).await.is_err() {
                            break;
                        }
                    }
                    // Dropping `reply` closes the stream.
                });
            }

            ClientCommand::Publish { data, reply } => {
                let result = self
                    .swarm
                    .behaviour_mut()
                    .gossipsub
                    .publish(self.topic_hash.clone(), data)
                    .map(|_| ())
                    .map_err(|e| WhisperlinkError::ConnectionError {
                        reason: format!("failed to publish to content topic: {e}"),
                    });
                let _ = reply.send(result);
            }
        }
    }

    fn handle_swarm_event(&mut self, event: SwarmEvent<ClientBehaviourEvent>) {
        match event {
            SwarmEvent::NewListenAddr { address, .. } => {
                tracing::info!(%address, "new listen address");
            }

            SwarmEvent::ConnectionEstablished {
                peer_id,
                num_established,
                ..
            } => {
                tracing::debug!(%peer_id, num_established = num_established.get(), "connection established");
                if num_established.get() == 1 {
                    let _ = self.event_tx.send(NetworkEvent::PeerConnected(peer_id));
                }
            }

            SwarmEvent::ConnectionClosed {
                peer_id,
                cause,
                num_established,
                ..
            } => {
                tracing::debug!(%peer_id, ?cause, num_established, "connection closed");
                if num_established == 0 {
                    if let Ok(mut set) = self.relay_peers.write() {
                        set.remove(&peer_id);
                    }
                    self.peer_protocols.remove(&peer_id);
                    let _ = self.event_tx.send(NetworkEvent::PeerDisconnected(peer_id));
                }
            }

            SwarmEvent::OutgoingConnectionError { peer_id, error, .. } => {
                tracing::warn!(?peer_id, %error, "outgoing connection error");
            }

            SwarmEvent::Behaviour(ClientBehaviourEvent::Gossipsub(ev)) => {
                self.handle_gossip_event(ev);
            }

            SwarmEvent::Behaviour(ClientBehaviourEvent::Identify(ev)) => {
                self.handle_identify_event(ev);
            }

            SwarmEvent::Behaviour(ClientBehaviourEvent::Kademlia(ev)) => {
                handle_kademlia_event(ev);
            }

            other => {
                tracing::trace!(?other, "unhandled swarm event");
            }
        }
    }

    fn handle_gossip_event(&mut self, event: gossipsub::Event) {
        match event {
            gossipsub::Event::Message {
                propagation_source,
                message,
                ..
            } => {
                if message.topic == self.topic_hash {
                    let _ = self.event_tx.send(NetworkEvent::MessageReceived {
                        source: propagation_source,
                        data: message.data,
                    });
                } else {
                    tracing::trace!(topic = %message.topic, "message on foreign topic ignored");
                }
            }

            gossipsub::Event::Subscribed { peer_id, topic } => {
                if topic == self.topic_hash {
                    tracing::debug!(%peer_id, "relay peer joined content topic");
                    if let Ok(mut set) = self.relay_peers.write() {
                        set.insert(peer_id);
                    }
                }
            }

            gossipsub::Event::Unsubscribed { peer_id, topic } => {
                if topic == self.topic_hash {
                    tracing::debug!(%peer_id, "relay peer left content topic");
                    if let Ok(mut set) = self.relay_peers.write() {
                        set.remove(&peer_id);
                    }
                }
            }

            gossipsub::Event::GossipsubNotSupported { peer_id } => {
                tracing::trace!(%peer_id, "gossipsub not supported by peer");
            }
        }
    }

    fn handle_identify_event(&mut self, event: identify::Event) {
        match event {
            identify::Event::Received { peer_id, info, .. } => {
                let protocols: HashSet<String> =
                    info.protocols.iter().map(|p| p.to_string()).collect();
                let offers_store = protocols.contains(STORE_PROTOCOL);

                tracing::debug!(
                    %peer_id,
                    agent_version = %info.agent_version,
                    offers_store,
                    "identify: received peer info"
                );

                // Feed reported listen addresses into Kademlia so the
                // routing table grows beyond the bootstrap set.
                for addr in info.listen_addrs {
                    self.swarm
                        .behaviour_mut()
                        .kademlia
                        .add_address(&peer_id, addr);
                }

                self.peer_protocols.insert(peer_id, protocols);
            }

            identify::Event::Sent { peer_id, .. } => {
                tracing::trace!(%peer_id, "identify: sent our info to peer");
            }

            identify::Event::Pushed { peer_id, .. } => {
                tracing::trace!(%peer_id, "identify: pushed info update to peer");
            }

            identify::Event::Error { peer_id, error, .. } => {
                tracing::warn!(%peer_id, %error, "identify: error");
            }
        }
    }
}

fn handle_kademlia_event(event: kad::Event) {
    match event {
        kad::Event::RoutingUpdated {
            peer, addresses, ..
        } => {
            tracing::trace!(%peer, ?addresses, "Kademlia routing table updated");
        }
        kad::Event::OutboundQueryProgressed { id, result, .. } => {
            tracing::trace!(?id, ?result, "Kademlia query progressed");
        }
        other => {
            tracing::trace!(?other, "other Kademlia event");
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Extracts the `PeerId` and the address-without-p2p from a multiaddr.
///
/// Given `/ip4/1.2.3.4/tcp/4001/p2p/12D3KooW...`, returns
/// `Some((PeerId, /ip4/1.2.3.4/tcp/4001))`. Returns `None` if the
/// multiaddr has no `/p2p/` component.
fn extract_peer_id(addr: &Multiaddr) -> Option<(PeerId, Multiaddr)> {
    let mut clean_addr = Multiaddr::empty();
    let mut peer_id = None;

    for proto in addr.iter() {
        match proto {
            libp2p::multiaddr::Protocol::P2p(id) => {
                peer_id = Some(id);
            }
            other => {
                clean_addr.push(other);
            }
        }
    }

    peer_id.map(|pid| (pid, clean_addr))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_peer_id_with_p2p_component() {
        let keypair = libp2p::identity::Keypair::generate_ed25519();
        let peer_id = PeerId::from(keypair.public());
        let addr: Multiaddr = format!("/ip4/127.0.0.1/tcp/4001/p2p/{peer_id}")
            .parse()
            .unwrap();

        let (pid, clean) = extract_peer_id(&addr).unwrap();
        assert_eq!(pid, peer_id);
        assert_eq!(clean.to_string(), "/ip4/127.0.0.1/tcp/4001");
    }

    #[test]
    fn extract_peer_id_without_p2p_returns_none() {
        let addr: Multiaddr = "/ip4/127.0.0.1/tcp/4001".parse().unwrap();
        assert!(extract_peer_id(&addr).is_none());
    }

    #[test]
    fn default_bootstrap_nodes_all_parse() {
        for entry in crate::config::DEFAULT_BOOTSTRAP_NODES {
            let addr: Multiaddr = entry.parse().expect("default bootstrap multiaddr");
            assert!(
                extract_peer_id(&addr).is_some(),
                "default bootstrap node missing /p2p/ component: {entry}"
            );
        }
    }

    #[tokio::test]
    async fn failed_store_stream_yields_single_error() {
        let mut stream = StorePeerStream::failed(WhisperlinkError::EnumerationError {
            reason: "driver gone".into(),
        });

        let first = stream.next().await;
        assert!(matches!(first, Some(Err(_))));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn draining_store_stream_yields_peers_then_ends() {
        let (tx, rx) = mpsc::channel(STORE_REPLY_BUFFER);
        let mut stream = StorePeerStream::draining(rx);

        let a = PeerId::random();
        let b = PeerId::random();
        tx.send(a).await.unwrap();
        tx.send(b).await.unwrap();
        drop(tx);

        let mut seen = Vec::new();
        while let Some(item) = stream.next().await {
            seen.push(item.unwrap());
        }
        assert_eq!(seen, vec![a, b]);
    }
}
