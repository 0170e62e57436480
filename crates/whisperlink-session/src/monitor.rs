//! Periodic peer-count snapshots.
//!
//! [`PeerStatusMonitor::start`] spawns a tokio task that, on each
//! tick, reads the relay peer count and fully drains the store-peer
//! stream, then emits one [`PeerSnapshot`] combining both values.
//!
//! # Tick semantics
//!
//! - Ticks are scheduled against wall-clock time (`interval_at`), not
//!   against completion of the previous tick's drain; the first
//!   snapshot arrives one full interval after start.
//! - Ticks for one client are never concurrent: the drain runs inside
//!   the tick body, so a slow drain delays the next tick, and missed
//!   ticks are skipped rather than queued.
//! - A failed drain skips that tick's snapshot. Nothing propagates;
//!   consumers keep the last emitted value.
//! - Cancellation is immediate from the caller's perspective. An
//!   in-flight drain is abandoned, and a snapshot from a tick that
//!   already started is discarded rather than applied.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use whisperlink_network::client::PeerDirectory;
use whisperlink_types::PeerSnapshot;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Fixed polling interval used by the session controller.
pub const MONITOR_INTERVAL: Duration = Duration::from_millis(1000);

// ---------------------------------------------------------------------------
// MonitorHandle
// ---------------------------------------------------------------------------

/// Cancellation handle for a running monitor.
///
/// Must be stopped (or dropped) when the owning session ends or the
/// client changes, so no timer is left referencing a stale client.
pub struct MonitorHandle {
    cancel_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Stops future ticks and releases the timer.
    ///
    /// Synchronous and idempotent. A tick already in flight is
    /// abandoned; its snapshot is never applied.
    pub fn stop(&self) {
        let _ = self.cancel_tx.send(true);
    }

    /// Stops the monitor and waits for its task to exit.
    pub async fn stopped(mut self) {
        let _ = self.cancel_tx.send(true);
        let _ = (&mut self.task).await;
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        let _ = self.cancel_tx.send(true);
    }
}

// ---------------------------------------------------------------------------
// PeerStatusMonitor
// ---------------------------------------------------------------------------

/// Produces a periodic, consistent [`PeerSnapshot`] from a ready
/// client.
pub struct PeerStatusMonitor;

impl PeerStatusMonitor {
    /// Starts polling `directory` every `interval`.
    ///
    /// Returns the cancellation handle and a watch receiver holding
    /// the latest snapshot (zero counts until the first tick).
    pub fn start<D: PeerDirectory>(
        directory: Arc<D>,
        interval: Duration,
    ) -> (MonitorHandle, watch::Receiver<PeerSnapshot>) {
        let (snapshot_tx, snapshot_rx) = watch::channel(PeerSnapshot::default());
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let task = tokio::spawn(run_monitor(directory, interval, snapshot_tx, cancel_rx));

        (MonitorHandle { cancel_tx, task }, snapshot_rx)
    }
}

// ---------------------------------------------------------------------------
// Monitor loop
// ---------------------------------------------------------------------------

async fn run_monitor<D: PeerDirectory>(
    directory: Arc<D>,
    interval: Duration,
    snapshot_tx: watch::Sender<PeerSnapshot>,
    mut cancel_rx: watch::Receiver<bool>,
) {
    let first_tick = tokio::time::Instant::now() + interval;
    let mut ticker = tokio::time::interval_at(first_tick, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::debug!(?interval, "peer status monitor started");

    loop {
        tokio::select! {
            changed = cancel_rx.changed() => {
                // Err means the handle was dropped; either way, stop.
                if changed.is_err() || *cancel_rx.borrow() {
                    break;
                }
            }

            _ = ticker.tick() => {
                // Relay set first (cheap synchronous read), then the
                // asynchronous store-peer walk.
                let relay_peers = directory.relay_peer_count();

                let mut stream = directory.store_peers();
                let mut light_push_peers = 0usize;
                let mut drain_failed = false;

                loop {
                    tokio::select! {
                        changed = cancel_rx.changed() => {
                            if changed.is_err() || *cancel_rx.borrow() {
                                tracing::debug!("monitor cancelled mid-drain; snapshot discarded");
                                return;
                            }
                        }

                        item = stream.next() => match item {
                            Some(Ok(_peer)) => light_push_peers += 1,
                            Some(Err(e)) => {
                                tracing::warn!(%e, "store peer enumeration failed; tick skipped");
                                drain_failed = true;
                                break;
                            }
                            None => break,
                        }
                    }
                }

                if drain_failed {
                    continue;
                }

                // Re-check after the drain: a snapshot from a tick
                // that started before cancellation must never be
                // applied.
                if *cancel_rx.borrow() {
                    break;
                }

                let snapshot = PeerSnapshot { relay_peers, light_push_peers };
                if snapshot_tx.send(snapshot).is_err() {
                    // All consumers are gone; nothing left to monitor for.
                    break;
                }

                tracing::trace!(
                    relay = snapshot.relay_peers,
                    light_push = snapshot.light_push_peers,
                    "peer snapshot emitted"
                );
            }
        }
    }

    tracing::debug!("peer status monitor stopped");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use futures::stream::BoxStream;
    use libp2p::PeerId;
    use whisperlink_types::{Result, WhisperlinkError};

    /// Directory double with fixed peer counts.
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

    /// Directory double whose store enumeration always fails.
    struct FailingDirectory;

    impl PeerDirectory for FailingDirectory {
        fn relay_peer_count(&self) -> usize {
            5
        }

        fn store_peers(&self) -> BoxStream<'static, Result<PeerId>> {
            futures::stream::once(async {
                Err(WhisperlinkError::EnumerationError {
                    reason: "query failed".into(),
                })
            })
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_is_zero_before_first_tick() {
        let directory = Arc::new(FixedDirectory {
            relay: 3,
            store: vec![PeerId::random(), PeerId::random()],
        });
        let (handle, rx) = PeerStatusMonitor::start(directory, MONITOR_INTERVAL);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(*rx.borrow(), PeerSnapshot::default());

        handle.stopped().await;
    }

    #[tokio::test(start_paused = true)]
    async fn first_snapshot_after_one_interval() {
        let directory = Arc::new(FixedDirectory {
            relay: 3,
            store: vec![PeerId::random(), PeerId::random()],
        });
        let (handle, rx) = PeerStatusMonitor::start(directory, MONITOR_INTERVAL);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(
            *rx.borrow(),
            PeerSnapshot {
                relay_peers: 3,
                light_push_peers: 2,
            }
        );

        handle.stopped().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_drain_skips_the_tick() {
        let directory = Arc::new(FailingDirectory);
        let (handle, rx) = PeerStatusMonitor::start(directory, MONITOR_INTERVAL);

        // Several ticks elapse; every drain fails, so no snapshot is
        // ever emitted and the last known (initial) value remains.
        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(*rx.borrow(), PeerSnapshot::default());

        handle.stopped().await;
    }

    #[tokio::test(start_paused = true)]
    async fn restartable_enumeration_is_consistent_across_ticks() {
        let directory = Arc::new(FixedDirectory {
            relay: 1,
            store: vec![PeerId::random(), PeerId::random(), PeerId::random()],
        });
        let (handle, rx) = PeerStatusMonitor::start(directory, MONITOR_INTERVAL);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        let first = *rx.borrow();
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let second = *rx.borrow();

        // Unchanged peer set: both drains count the same length.
        assert_eq!(first.light_push_peers, 3);
        assert_eq!(second.light_push_peers, 3);

        handle.stopped().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_prevents_further_snapshots() {
        let directory = Arc::new(FixedDirectory {
            relay: 2,
            store: Vec::new(),
        });
        let (handle, rx) = PeerStatusMonitor::start(directory, MONITOR_INTERVAL);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        let before = *rx.borrow();
        assert_eq!(before.relay_peers, 2);

        handle.stopped().await;

        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(*rx.borrow(), before);
    }
}
