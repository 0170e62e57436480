//! Whisperlink Daemon -- headless session node for servers and VPS.
//!
//! Usage:
//!
//!   whisperlink-daemon [OPTIONS]
//!
//! Options:
//!
//!   --listen <MULTIADDR>        P2P listen address (default: /ip4/0.0.0.0/tcp/0)
//!   --bootstrap <MULTIADDR>     Add a bootstrap node (repeatable)
//!   --topic <TOPIC>             Gossip content topic
//!   --bootstrap-timeout <SECS>  Abort connecting after this many seconds
//!   --status-interval <SECS>    Peer status log interval (default: 10)
//!   --config <PATH>             Load config from JSON file
//!
//! The daemon runs until interrupted with Ctrl+C (SIGINT/SIGTERM).

use libp2p::Multiaddr;

use whisperlink_network::config::NetworkConfig;
use whisperlink_network::events::NetworkEvent;
use whisperlink_session::SessionController;

mod config;

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    // Tracing / logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // Parse CLI arguments.
    let cli = config::CliArgs::parse_from_env();

    // Load or merge config file if provided.
    let daemon_config = match &cli.config_path {
        Some(path) => match config::DaemonConfig::load(path) {
            Ok(cfg) => cfg.merge_cli(&cli),
            Err(e) => {
                tracing::error!("failed to load config file: {e}");
                std::process::exit(1);
            }
        },
        None => config::DaemonConfig::from_cli(&cli),
    };

    // Run the daemon.
    if let Err(e) = run_daemon(daemon_config).await {
        tracing::error!("daemon error: {e}");
        std::process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// Daemon main logic
// ---------------------------------------------------------------------------

async fn run_daemon(cfg: config::DaemonConfig) -> Result<(), String> {
    // -----------------------------------------------------------------------
    // 1. Network config
    // -----------------------------------------------------------------------

    let listen_addr = cfg
        .listen_addr
        .parse::<Multiaddr>()
        .map_err(|e| format!("invalid listen address '{}': {e}", cfg.listen_addr))?;

    let bootstrap_nodes: Vec<Multiaddr> = cfg
        .bootstrap_nodes
        .iter()
        .filter_map(|s| {
            s.parse::<Multiaddr>()
                .map_err(|e| tracing::warn!("invalid bootstrap addr '{}': {e}", s))
                .ok()
        })
        .collect();

    let mut net_config = NetworkConfig {
        listen_addr,
        bootstrap_nodes,
        ..NetworkConfig::default()
    };
    if let Some(topic) = cfg.content_topic.clone() {
        net_config.content_topic = topic;
    }
    if let Some(secs) = cfg.bootstrap_timeout_secs {
        net_config.bootstrap_timeout_secs = secs;
    }

    tracing::info!(
        listen = %cfg.listen_addr,
        topic = %net_config.content_topic,
        bootstrap_count = net_config.effective_bootstrap_nodes().len(),
        "network config"
    );

    // -----------------------------------------------------------------------
    // 2. Connect the session
    // -----------------------------------------------------------------------

    let mut session = SessionController::new(net_config);

    session
        .initialize()
        .await
        .map_err(|e| format!("session initialization failed: {e}"))?;

    let peer_id = session
        .client()
        .map(|client| client.local_peer_id().to_string())
        .unwrap_or_default();

    tracing::info!(%peer_id, "session ready");

    let mut events = session.take_event_receiver();

    // -----------------------------------------------------------------------
    // 3. Run until shutdown
    // -----------------------------------------------------------------------

    let mut status_ticker =
        tokio::time::interval(std::time::Duration::from_secs(cfg.status_interval_secs));
    // First tick fires immediately; skip it so the monitor has had a
    // chance to take its first snapshot.
    status_ticker.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("received Ctrl+C, shutting down...");
                break;
            }

            _ = status_ticker.tick() => {
                let snapshot = session.peer_snapshot();
                tracing::info!(
                    relay_peers = snapshot.relay_peers,
                    light_push_peers = snapshot.light_push_peers,
                    "peer status"
                );
            }

            event = recv_event(&mut events) => match event {
                Some(NetworkEvent::MessageReceived { source, data }) => {
                    tracing::info!(%source, len = data.len(), "message received");
                }
                Some(NetworkEvent::PeerConnected(peer)) => {
                    tracing::debug!(%peer, "peer connected");
                }
                Some(NetworkEvent::PeerDisconnected(peer)) => {
                    tracing::debug!(%peer, "peer disconnected");
                }
                None => {
                    tracing::error!("network event stream closed unexpectedly");
                    break;
                }
            }
        }
    }

    session.teardown();
    tracing::info!("daemon stopped");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Receives the next network event, or pends forever when the receiver
/// was never available (keeps the select loop uniform).
async fn recv_event(
    events: &mut Option<tokio::sync::mpsc::UnboundedReceiver<NetworkEvent>>,
) -> Option<NetworkEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
