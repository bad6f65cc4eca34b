//! Wi-Fi Direct group invitation engine.
//!
//! Implements the P2P Invitation procedure used to pull a peer into an
//! operating group or to re-invoke a persistent group: building and parsing
//! the Invitation Request/Response action frames, negotiating a common
//! operating channel, and running the request/response exchange as a small
//! TX-status-driven state machine.
//!
//! # Architecture
//!
//! ```text
//!   DriverHandle ──────────────┐
//!                              v
//!   ┌───────────────────── driver ─────────────────────┐
//!   │                  InviteSession                    │
//!   │  peer ──> handle_request ──> hooks ──> respond    │
//!   │  invite ──> build req ──> transport.send_action   │
//!   │  on_tx_status / on_timeout <── TimerService       │
//!   └───────────────────────────────────────────────────┘
//!           │                              ^
//!           v                              │
//!      wire (frames, attributes)    channels (reg classes)
//! ```
//!
//! The core ([`InviteSession`]) is synchronous and driven entirely through
//! method calls; the [`driver`] module wraps it in a tokio event loop. The
//! platform plugs in through three traits: [`ActionTransport`] sends action
//! frames, [`TimerService`] arms the retry timeout, and [`InvitationHooks`]
//! carries decisions and results to the upper layer.
//!
//! # Example
//!
//! ```no_run
//! use p2p_invite::{Config, InviteParams, InviteRole, InviteSession, MacAddr, NullHooks};
//! # use p2p_invite::{ActionTransport, OutboundAction, TimerService};
//! # use std::time::Duration;
//! # struct Nic;
//! # impl ActionTransport for Nic {
//! #     fn send_action(&mut self, _: OutboundAction) -> p2p_invite::Result<()> { Ok(()) }
//! # }
//! # struct Timer;
//! # impl TimerService for Timer {
//! #     fn set_timeout(&mut self, _: Duration) {}
//! #     fn clear_timeout(&mut self) {}
//! # }
//!
//! let mut session = InviteSession::new(
//!     Config::default(),
//!     Box::new(Nic),
//!     Box::new(Timer),
//!     Box::new(NullHooks),
//! );
//! let peer: MacAddr = "02:11:22:33:44:55".parse().unwrap();
//! session.invite(
//!     peer,
//!     InviteParams {
//!         role: InviteRole::Go,
//!         bssid: None,
//!         ssid: b"DIRECT-ab".to_vec(),
//!         force_freq: None,
//!         go_dev_addr: None,
//!         persistent: true,
//!         pref_freq: None,
//!     },
//! ).ok();
//! ```

pub mod addr;
pub mod channels;
pub mod config;
pub mod driver;
pub mod error;
pub mod hooks;
pub mod negotiate;
pub mod peer;
pub mod session;
pub mod transport;
pub mod wire;

pub use addr::MacAddr;
pub use channels::{channel_to_freq, freq_to_channel, ChannelSet, RegClassChannels};
pub use config::Config;
pub use driver::{DriverBuilder, DriverHandle};
pub use error::{InviteError, Result};
pub use hooks::{
    InvitationHooks, InviteDecision, InviteReceived, InviteRequest, InviteResult, NullHooks,
};
pub use negotiate::{PreferPeerOrder, ReselectStrategy, SelectedChannel};
pub use peer::{PeerDevice, PeerTable};
pub use session::{InviteParams, InviteSession, SessionState};
pub use transport::{ActionTransport, OutboundAction, TimerService};
pub use wire::{InvitationMessage, InviteRole, StatusCode};
