//! Session layer: one network connection per application load.
//!
//! - [`controller`] — [`controller::SessionController`]: creates the
//!   network client exactly once, owns it for the session's lifetime,
//!   and exposes status to presentation collaborators.
//! - [`monitor`] — [`monitor::PeerStatusMonitor`]: periodic peer-count
//!   snapshots from a ready client.

pub mod controller;
pub mod monitor;

pub use controller::{SessionController, SessionStatus};
pub use monitor::{MonitorHandle, PeerStatusMonitor, MONITOR_INTERVAL};
