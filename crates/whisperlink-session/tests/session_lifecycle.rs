//! End-to-end session lifecycle tests against directory doubles.
//!
//! These run on tokio's paused clock, so the 1000 ms monitor interval
//! elapses instantly and deterministically.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::stream::BoxStream;
use futures::StreamExt;
use libp2p::PeerId;
use tokio::sync::mpsc;

use whisperlink_network::client::PeerDirectory;
use whisperlink_network::config::NetworkConfig;
use whisperlink_session::SessionController;
use whisperlink_types::{PeerSnapshot, Result, SessionState, WhisperlinkError};

// ---------------------------------------------------------------------------
// Directory doubles
// ---------------------------------------------------------------------------

/// Fixed peer population; every enumeration yields the same set.
struct FixedDirectory {
    relay: usize,
    store: Vec<PeerId>,
}

impl PeerDirectory for FixedDirectory {
    fn relay_peer_count(&self) -> usize {
        self.relay
    }

    fn store_peers(&self) -> BoxStream<'static, Result<PeerId>> {
        futures::stream::iter(self.store.clone().into_iter().map(Ok)).boxed()
    }
}

/// Directory whose first enumeration blocks until peers are pushed in
/// from the test; later enumerations pend forever.
struct GatedDirectory {
    rx: Mutex<Option<mpsc::Receiver<PeerId>>>,
}

impl PeerDirectory for GatedDirectory {
    fn relay_peer_count(&self) -> usize {
        4
    }

    fn store_peers(&self) -> BoxStream<'static, Result<PeerId>> {
        match self.rx.lock().unwrap_or_else(|e| e.into_inner()).take() {
            Some(rx) => futures::stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|peer| (Ok(peer), rx))
            })
            .boxed(),
            None => futures::stream::pending().boxed(),
        }
    }
}

fn connect_fixed(
    relay: usize,
    store_count: usize,
) -> impl FnOnce() -> futures::future::Ready<
    Result<(
        FixedDirectory,
        Option<mpsc::UnboundedReceiver<whisperlink_network::events::NetworkEvent>>,
    )>,
> {
    move || {
        futures::future::ready(Ok((
            FixedDirectory {
                relay,
                store: (0..store_count).map(|_| PeerId::random()).collect(),
            },
            None,
        )))
    }
}

// ---------------------------------------------------------------------------
// Scenario: happy path
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn ready_session_reports_peer_counts_after_one_interval() {
    let mut session: SessionController<FixedDirectory> =
        SessionController::new(NetworkConfig::default());

    let state = session.initialize_with(connect_fixed(3, 2)).await.unwrap();
    assert_eq!(state, SessionState::Ready);
    assert!(session.is_connected());

    // Before the first tick, the snapshot still holds zeros.
    assert_eq!(session.peer_snapshot(), PeerSnapshot::default());

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(
        session.peer_snapshot(),
        PeerSnapshot {
            relay_peers: 3,
            light_push_peers: 2,
        }
    );
}

// ---------------------------------------------------------------------------
// Scenario: failed connection
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn failed_connection_is_terminal() {
    let mut session: SessionController<FixedDirectory> =
        SessionController::new(NetworkConfig::default());

    let err = session
        .initialize_with(|| {
            futures::future::ready(Err(WhisperlinkError::ConnectionError {
                reason: "no bootstrap peer reachable".into(),
            }))
        })
        .await
        .unwrap_err();
    assert!(matches!(err, WhisperlinkError::ConnectionError { .. }));

    assert_eq!(session.state(), SessionState::Failed);
    assert!(!session.is_connected());

    // No monitor was ever started; the snapshot never moves.
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(session.peer_snapshot(), PeerSnapshot::default());

    // A later initialize does not retry: it reports the failed state
    // without attempting a new connection.
    let state = session.initialize_with(connect_fixed(9, 9)).await.unwrap();
    assert_eq!(state, SessionState::Failed);
    assert!(!session.is_connected());
}

// ---------------------------------------------------------------------------
// Scenario: double initialization
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn second_initialize_is_a_no_op() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let mut session: SessionController<FixedDirectory> =
        SessionController::new(NetworkConfig::default());

    for _ in 0..2 {
        let attempts = Arc::clone(&attempts);
        let state = session
            .initialize_with(move || {
                attempts.fetch_add(1, Ordering::SeqCst);
                futures::future::ready(Ok((
                    FixedDirectory {
                        relay: 1,
                        store: Vec::new(),
                    },
                    None,
                )))
            })
            .await
            .unwrap();
        assert_eq!(state, SessionState::Ready);
    }

    // Only the first call ran a connection attempt.
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

// ---------------------------------------------------------------------------
// Scenario: cancellation mid-enumeration
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn teardown_discards_in_flight_snapshot() {
    let (peer_tx, peer_rx) = mpsc::channel(8);
    let directory = GatedDirectory {
        rx: Mutex::new(Some(peer_rx)),
    };

    let mut session: SessionController<GatedDirectory> =
        SessionController::new(NetworkConfig::default());
    session
        .initialize_with(|| futures::future::ready(Ok((directory, None))))
        .await
        .unwrap();

    // Advance past the first tick. The drain is now blocked waiting on
    // peers that have not been pushed yet.
    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(session.peer_snapshot(), PeerSnapshot::default());

    session.teardown();
    assert!(!session.is_connected());

    // Completing the enumeration after teardown must not surface a
    // snapshot: the result of the cancelled tick is discarded.
    peer_tx.send(PeerId::random()).await.unwrap();
    peer_tx.send(PeerId::random()).await.unwrap();
    drop(peer_tx);

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(session.peer_snapshot(), PeerSnapshot::default());
}

// ---------------------------------------------------------------------------
// Scenario: publish without a client
// ---------------------------------------------------------------------------

#[tokio::test]
async fn publish_before_initialize_is_a_session_error() {
    let session: SessionController = SessionController::new(NetworkConfig::default());

    let err = session.publish(b"ciphertext".to_vec()).await.unwrap_err();
    assert!(matches!(err, WhisperlinkError::SessionError { .. }));
}

// ---------------------------------------------------------------------------
// Scenario: teardown freezes the last snapshot
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn teardown_keeps_last_known_counts() {
    let mut session: SessionController<FixedDirectory> =
        SessionController::new(NetworkConfig::default());
    session.initialize_with(connect_fixed(7, 3)).await.unwrap();

    tokio::time::sleep(Duration::from_millis(1100)).await;
    let before = session.peer_snapshot();
    assert_eq!(before.relay_peers, 7);
    assert_eq!(before.light_push_peers, 3);

    session.teardown();

    tokio::time::sleep(Duration::from_millis(5000)).await;
    assert_eq!(session.peer_snapshot(), before);

    let status = session.status();
    assert_eq!(status.state, SessionState::Ready);
    assert!(!status.connected);
    assert_eq!(status.peers, before);
}
