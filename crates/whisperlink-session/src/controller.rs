//! Session lifecycle state machine.
//!
//! A [`SessionController`] owns exactly one network attempt per
//! session. The state sequence is
//! `Uninitialized -> Connecting -> Ready | Failed`, and both terminal
//! states are sticky: there is no retry path, and a second
//! `initialize` call is a no-op that reports the current state.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use whisperlink_network::client::{NetworkClient, PeerDirectory};
use whisperlink_network::config::NetworkConfig;
use whisperlink_network::events::NetworkEvent;
use whisperlink_types::{PeerSnapshot, Result, SessionState, WhisperlinkError};
use whisperlink_wallet::WalletSession;

use crate::monitor::{MonitorHandle, PeerStatusMonitor, MONITOR_INTERVAL};

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

/// Point-in-time view of a session, suitable for status output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub state: SessionState,
    pub connected: bool,
    pub peers: PeerSnapshot,
    /// Abbreviated wallet address, when a wallet is attached.
    pub address: Option<String>,
}

// ---------------------------------------------------------------------------
// SessionController
// ---------------------------------------------------------------------------

/// Drives one network session from first connection to teardown.
///
/// Generic over the peer directory so the lifecycle can be exercised
/// without a live swarm; production code uses the default
/// [`NetworkClient`].
pub struct SessionController<D: PeerDirectory = NetworkClient> {
    state: SessionState,
    config: NetworkConfig,
    client: Option<Arc<D>>,
    monitor: Option<MonitorHandle>,
    snapshot_rx: Option<watch::Receiver<PeerSnapshot>>,
    events: Option<mpsc::UnboundedReceiver<NetworkEvent>>,
    wallet: WalletSession,
}

impl<D: PeerDirectory> SessionController<D> {
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            state: SessionState::Uninitialized,
            config,
            client: None,
            monitor: None,
            snapshot_rx: None,
            events: None,
            wallet: WalletSession::default(),
        }
    }

    /// Runs the session's single connection attempt using `connect`.
    ///
    /// Only a controller in [`SessionState::Uninitialized`] performs
    /// work; any later call returns the current state untouched, so a
    /// failed session stays failed and a ready session keeps its
    /// client. On success the peer monitor starts immediately.
    pub async fn initialize_with<F, Fut>(&mut self, connect: F) -> Result<SessionState>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(D, Option<mpsc::UnboundedReceiver<NetworkEvent>>)>>,
    {
        if self.state != SessionState::Uninitialized {
            tracing::debug!(state = %self.state, "initialize skipped: session already started");
            return Ok(self.state);
        }

        self.state = SessionState::Connecting;
        tracing::info!("session connecting");

        match connect().await {
            Ok((client, events)) => {
                let client = Arc::new(client);
                let (monitor, snapshot_rx) =
                    PeerStatusMonitor::start(Arc::clone(&client), MONITOR_INTERVAL);

                self.client = Some(client);
                self.monitor = Some(monitor);
                self.snapshot_rx = Some(snapshot_rx);
                self.events = events;
                self.state = SessionState::Ready;
                tracing::info!("session ready");
                Ok(self.state)
            }
            Err(e) => {
                self.state = SessionState::Failed;
                tracing::error!(%e, "session connection failed");
                Err(e)
            }
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether a live client is attached.
    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Latest peer snapshot, or zero counts before the first tick (and
    /// in sessions that never became ready).
    pub fn peer_snapshot(&self) -> PeerSnapshot {
        self.snapshot_rx
            .as_ref()
            .map(|rx| *rx.borrow())
            .unwrap_or_default()
    }

    /// Watch receiver over peer snapshots, for callers that want to
    /// react to changes rather than poll.
    pub fn snapshot_receiver(&self) -> Option<watch::Receiver<PeerSnapshot>> {
        self.snapshot_rx.clone()
    }

    pub fn client(&self) -> Option<&Arc<D>> {
        self.client.as_ref()
    }

    pub fn wallet(&self) -> &WalletSession {
        &self.wallet
    }

    pub fn wallet_mut(&mut self) -> &mut WalletSession {
        &mut self.wallet
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Takes the inbound network event receiver. Can be called once.
    pub fn take_event_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<NetworkEvent>> {
        self.events.take()
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            state: self.state,
            connected: self.is_connected(),
            peers: self.peer_snapshot(),
            address: self.wallet.display_address(),
        }
    }

    /// Stops the monitor and releases the client.
    ///
    /// The last snapshot remains readable afterwards; counts freeze at
    /// their final values rather than resetting to zero.
    pub fn teardown(&mut self) {
        if let Some(monitor) = self.monitor.take() {
            monitor.stop();
        }
        self.client = None;
        self.events = None;
        tracing::info!("session torn down");
    }
}

impl SessionController<NetworkClient> {
    /// Connects a real libp2p client using the controller's config.
    pub async fn initialize(&mut self) -> Result<SessionState> {
        let config = self.config.clone();
        self.initialize_with(|| async move {
            let mut client = NetworkClient::connect(config).await?;
            let events = client.take_event_receiver();
            Ok((client, events))
        })
        .await
    }

    /// Publishes a payload through the session's client.
    ///
    /// # Errors
    ///
    /// Returns `WhisperlinkError::SessionError` when the session has no
    /// live client (never initialized, failed, or torn down), otherwise
    /// relays the network layer's result.
    pub async fn publish(&self, data: Vec<u8>) -> Result<()> {
        match &self.client {
            Some(client) => client.publish(data).await,
            None => Err(WhisperlinkError::SessionError {
                reason: format!("cannot publish in state '{}': no client attached", self.state),
            }),
        }
    }
}

impl<D: PeerDirectory> Drop for SessionController<D> {
    fn drop(&mut self) {
        if let Some(monitor) = self.monitor.take() {
            monitor.stop();
        }
    }
}
