//! CLI argument parsing and config file support.
//!
//! The daemon can be configured via CLI flags, a JSON config file,
//! or a combination of both (CLI overrides config file).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const DEFAULT_LISTEN_ADDR: &str = "/ip4/0.0.0.0/tcp/0";

// ---------------------------------------------------------------------------
// CLI arguments (manual parsing, no clap dependency)
// ---------------------------------------------------------------------------

/// Parsed command-line arguments.
pub struct CliArgs {
    pub listen_addr: Option<String>,
    pub bootstrap_nodes: Vec<String>,
    pub content_topic: Option<String>,
    pub bootstrap_timeout_secs: Option<u64>,
    pub status_interval_secs: Option<u64>,
    pub config_path: Option<PathBuf>,
}

impl CliArgs {
    /// Parses CLI arguments from `std::env::args`.
    pub fn parse_from_env() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let mut cli = Self {
            listen_addr: None,
            bootstrap_nodes: Vec::new(),
            content_topic: None,
            bootstrap_timeout_secs: None,
            status_interval_secs: None,
            config_path: None,
        };

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--listen" => {
                    i += 1;
                    cli.listen_addr = args.get(i).cloned();
                }
                "--bootstrap" => {
                    i += 1;
                    if let Some(addr) = args.get(i) {
                        cli.bootstrap_nodes.push(addr.clone());
                    }
                }
                "--topic" => {
                    i += 1;
                    cli.content_topic = args.get(i).cloned();
                }
                "--bootstrap-timeout" => {
                    i += 1;
                    cli.bootstrap_timeout_secs = args.get(i).and_then(|s| s.parse().ok());
                }
                "--status-interval" => {
                    i += 1;
                    cli.status_interval_secs = args.get(i).and_then(|s| s.parse().ok());
                }
                "--config" => {
                    i += 1;
                    cli.config_path = args.get(i).map(PathBuf::from);
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                other => {
                    eprintln!("unknown argument: {other}");
                    eprintln!("use --help for usage information");
                    std::process::exit(1);
                }
            }
            i += 1;
        }

        cli
    }
}

// ---------------------------------------------------------------------------
// Config file (JSON)
// ---------------------------------------------------------------------------

/// JSON config file format.
///
/// Example `daemon.json`:
/// ```json
/// {
///   "listen_addr": "/ip4/0.0.0.0/tcp/30303",
///   "bootstrap_nodes": [
///     "/ip4/203.0.113.1/tcp/30303/p2p/12D3KooW..."
///   ],
///   "content_topic": "/whisperlink/1/private-message/proto",
///   "bootstrap_timeout_secs": 30,
///   "status_interval_secs": 10
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DaemonConfigFile {
    pub listen_addr: Option<String>,
    pub bootstrap_nodes: Option<Vec<String>>,
    pub content_topic: Option<String>,
    pub bootstrap_timeout_secs: Option<u64>,
    pub status_interval_secs: Option<u64>,
}

// ---------------------------------------------------------------------------
// Resolved config (all defaults applied)
// ---------------------------------------------------------------------------

/// Fully resolved daemon configuration with all defaults applied.
pub struct DaemonConfig {
    pub listen_addr: String,
    pub bootstrap_nodes: Vec<String>,
    pub content_topic: Option<String>,
    pub bootstrap_timeout_secs: Option<u64>,
    pub status_interval_secs: u64,
}

impl DaemonConfig {
    /// Build config purely from CLI args with defaults.
    pub fn from_cli(cli: &CliArgs) -> Self {
        Self {
            listen_addr: cli
                .listen_addr
                .clone()
                .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.into()),
            bootstrap_nodes: cli.bootstrap_nodes.clone(),
            content_topic: cli.content_topic.clone(),
            bootstrap_timeout_secs: cli.bootstrap_timeout_secs,
            status_interval_secs: cli.status_interval_secs.unwrap_or(10),
        }
    }

    /// Load config from a JSON file.
    pub fn load(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config file: {e}"))?;

        let file: DaemonConfigFile = serde_json::from_str(&text)
            .map_err(|e| format!("invalid config JSON: {e}"))?;

        Ok(Self {
            listen_addr: file
                .listen_addr
                .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.into()),
            bootstrap_nodes: file.bootstrap_nodes.unwrap_or_default(),
            content_topic: file.content_topic,
            bootstrap_timeout_secs: file.bootstrap_timeout_secs,
            status_interval_secs: file.status_interval_secs.unwrap_or(10),
        })
    }

    /// Merge CLI overrides onto a config-file base.
    pub fn merge_cli(mut self, cli: &CliArgs) -> Self {
        if let Some(ref addr) = cli.listen_addr {
            self.listen_addr = addr.clone();
        }
        if !cli.bootstrap_nodes.is_empty() {
            self.bootstrap_nodes.extend(cli.bootstrap_nodes.clone());
        }
        if cli.content_topic.is_some() {
            self.content_topic = cli.content_topic.clone();
        }
        if cli.bootstrap_timeout_secs.is_some() {
            self.bootstrap_timeout_secs = cli.bootstrap_timeout_secs;
        }
        if let Some(secs) = cli.status_interval_secs {
            self.status_interval_secs = secs;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Help text
// ---------------------------------------------------------------------------

fn print_help() {
    println!(
        r#"Whisperlink Daemon - headless P2P session node

USAGE:
    whisperlink-daemon [OPTIONS]

OPTIONS:
    --listen <MULTIADDR>        P2P listen address (default: /ip4/0.0.0.0/tcp/0)
    --bootstrap <MULTIADDR>     Add a bootstrap node (repeatable)
    --topic <TOPIC>             Gossip content topic
    --bootstrap-timeout <SECS>  Abort connecting after this many seconds
    --status-interval <SECS>    Peer status log interval (default: 10)
    --config <PATH>             Load settings from JSON config file
    -h, --help                  Show this help

EXAMPLES:
    # Join the default network
    whisperlink-daemon

    # Connect through a private bootstrap node
    whisperlink-daemon --bootstrap /ip4/1.2.3.4/tcp/30303/p2p/12D3KooW...

    # Use config file
    whisperlink-daemon --config /etc/whisperlink/daemon.json

ENVIRONMENT:
    RUST_LOG                    Log level filter (default: info)
"#
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_cli() -> CliArgs {
        CliArgs {
            listen_addr: None,
            bootstrap_nodes: Vec::new(),
            content_topic: None,
            bootstrap_timeout_secs: None,
            status_interval_secs: None,
            config_path: None,
        }
    }

    #[test]
    fn defaults_from_empty_cli() {
        let cfg = DaemonConfig::from_cli(&empty_cli());
        assert_eq!(cfg.listen_addr, DEFAULT_LISTEN_ADDR);
        assert!(cfg.bootstrap_nodes.is_empty());
        assert_eq!(cfg.status_interval_secs, 10);
        assert!(cfg.content_topic.is_none());
    }

    #[test]
    fn cli_overrides_config_file() {
        let base = DaemonConfig {
            listen_addr: "/ip4/0.0.0.0/tcp/30303".into(),
            bootstrap_nodes: vec!["/dns4/a.example/tcp/1/p2p/x".into()],
            content_topic: Some("/file/topic".into()),
            bootstrap_timeout_secs: Some(30),
            status_interval_secs: 10,
        };

        let mut cli = empty_cli();
        cli.content_topic = Some("/cli/topic".into());
        cli.bootstrap_nodes = vec!["/dns4/b.example/tcp/2/p2p/y".into()];
        cli.status_interval_secs = Some(5);

        let merged = base.merge_cli(&cli);
        assert_eq!(merged.listen_addr, "/ip4/0.0.0.0/tcp/30303");
        assert_eq!(merged.content_topic.as_deref(), Some("/cli/topic"));
        assert_eq!(merged.bootstrap_nodes.len(), 2);
        assert_eq!(merged.status_interval_secs, 5);
    }

    #[test]
    fn config_file_round_trip() {
        let json = r#"{
            "listen_addr": "/ip4/0.0.0.0/tcp/30303",
            "bootstrap_nodes": ["/dns4/a.example/tcp/1/p2p/x"],
            "status_interval_secs": 3
        }"#;
        let file: DaemonConfigFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.listen_addr.as_deref(), Some("/ip4/0.0.0.0/tcp/30303"));
        assert_eq!(file.status_interval_secs, Some(3));
        assert!(file.content_topic.is_none());
    }
}
