//! Async harness that owns an [`InviteSession`] on a tokio task.
//!
//! The session itself is synchronous; this module gives it an event loop:
//!
//! ```text
//!   DriverHandle --- mpsc ---> [ driver task ]
//!     invite()                   InviteSession
//!     deliver_frame()            SharedDeadline --- sleep_until
//!     report_tx_status()
//! ```
//!
//! All driver interaction goes through cloneable [`DriverHandle`]s, so frame
//! receive paths, TX-status callbacks, and control code can live on
//! different tasks without sharing the session directly.

use std::future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::debug;

use crate::addr::MacAddr;
use crate::config::Config;
use crate::error::{InviteError, Result};
use crate::hooks::{InvitationHooks, NullHooks};
use crate::negotiate::ReselectStrategy;
use crate::peer::PeerDevice;
use crate::session::{InviteParams, InviteSession, SessionState};
use crate::transport::{ActionTransport, TimerService};

/// Default depth of the driver's event queue.
pub const DEFAULT_QUEUE_DEPTH: usize = 32;

/// Events consumed by the driver task.
enum Event {
    Invite {
        peer: MacAddr,
        params: InviteParams,
        reply: oneshot::Sender<Result<()>>,
    },
    Frame {
        sa: MacAddr,
        payload: Bytes,
        rx_freq: u32,
    },
    TxStatus {
        success: bool,
    },
    UpdatePeer {
        peer: PeerDevice,
    },
    State {
        reply: oneshot::Sender<SessionState>,
    },
    Stop,
    Shutdown,
}

/// Timeout slot shared between the session and the driver loop.
///
/// The session arms it through [`TimerService`]; the loop turns the stored
/// deadline into a `sleep_until` branch of its `select!`.
#[derive(Clone, Default)]
pub struct SharedDeadline(Arc<Mutex<Option<Instant>>>);

impl SharedDeadline {
    fn next(&self) -> Option<Instant> {
        *self.0.lock().unwrap()
    }

    fn take(&self) {
        *self.0.lock().unwrap() = None;
    }
}

impl TimerService for SharedDeadline {
    fn set_timeout(&mut self, delay: Duration) {
        *self.0.lock().unwrap() = Some(Instant::now() + delay);
    }

    fn clear_timeout(&mut self) {
        *self.0.lock().unwrap() = None;
    }
}

/// Configures and spawns the driver task.
pub struct DriverBuilder {
    cfg: Config,
    transport: Box<dyn ActionTransport + Send>,
    hooks: Box<dyn InvitationHooks + Send>,
    reselect: Option<Box<dyn ReselectStrategy + Send>>,
    queue_depth: usize,
}

impl DriverBuilder {
    pub fn new(cfg: Config, transport: Box<dyn ActionTransport + Send>) -> Self {
        Self {
            cfg,
            transport,
            hooks: Box::new(NullHooks),
            reselect: None,
            queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }

    /// Installs the upper-layer callbacks.
    pub fn hooks(mut self, hooks: Box<dyn InvitationHooks + Send>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Overrides the channel reselection strategy.
    pub fn reselect(mut self, strategy: Box<dyn ReselectStrategy + Send>) -> Self {
        self.reselect = Some(strategy);
        self
    }

    /// Sets the event queue depth.
    pub fn queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth.max(1);
        self
    }

    /// Spawns the driver task and returns a handle to it.
    pub fn spawn(self) -> (DriverHandle, JoinHandle<()>) {
        let deadline = SharedDeadline::default();
        let mut session = InviteSession::new(
            self.cfg,
            self.transport,
            Box::new(deadline.clone()),
            self.hooks,
        );
        if let Some(strategy) = self.reselect {
            session.set_reselect_strategy(strategy);
        }
        let (tx, rx) = mpsc::channel(self.queue_depth);
        let task = tokio::spawn(run(session, deadline, rx));
        (DriverHandle { tx }, task)
    }
}

/// Cloneable control handle for a spawned driver.
#[derive(Clone)]
pub struct DriverHandle {
    tx: mpsc::Sender<Event>,
}

impl DriverHandle {
    /// Starts an invitation exchange and waits for the send verdict.
    pub async fn invite(&self, peer: MacAddr, params: InviteParams) -> Result<()> {
        let (reply, answer) = oneshot::channel();
        self.tx
            .send(Event::Invite {
                peer,
                params,
                reply,
            })
            .await
            .map_err(|_| InviteError::Closed)?;
        answer.await.map_err(|_| InviteError::Closed)?
    }

    /// Delivers a received Public Action frame to the session.
    pub async fn deliver_frame(&self, sa: MacAddr, payload: Bytes, rx_freq: u32) -> Result<()> {
        self.tx
            .send(Event::Frame {
                sa,
                payload,
                rx_freq,
            })
            .await
            .map_err(|_| InviteError::Closed)
    }

    /// Reports the driver TX status of the last outbound frame.
    pub async fn report_tx_status(&self, success: bool) -> Result<()> {
        self.tx
            .send(Event::TxStatus { success })
            .await
            .map_err(|_| InviteError::Closed)
    }

    /// Inserts or refreshes a peer entry, e.g. from scan results.
    pub async fn update_peer(&self, peer: PeerDevice) -> Result<()> {
        self.tx
            .send(Event::UpdatePeer { peer })
            .await
            .map_err(|_| InviteError::Closed)
    }

    /// Reads the session's current state.
    pub async fn state(&self) -> Result<SessionState> {
        let (reply, answer) = oneshot::channel();
        self.tx
            .send(Event::State { reply })
            .await
            .map_err(|_| InviteError::Closed)?;
        answer.await.map_err(|_| InviteError::Closed)
    }

    /// Cancels any in-flight invitation without stopping the driver.
    pub async fn stop(&self) -> Result<()> {
        self.tx
            .send(Event::Stop)
            .await
            .map_err(|_| InviteError::Closed)
    }

    /// Shuts the driver task down.
    pub async fn shutdown(&self) -> Result<()> {
        self.tx
            .send(Event::Shutdown)
            .await
            .map_err(|_| InviteError::Closed)
    }
}

async fn run(
    mut session: InviteSession,
    deadline: SharedDeadline,
    mut events: mpsc::Receiver<Event>,
) {
    debug!("invitation driver started");
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(Event::Invite { peer, params, reply }) => {
                    let _ = reply.send(session.invite(peer, params));
                }
                Some(Event::Frame { sa, payload, rx_freq }) => {
                    session.handle_frame(sa, &payload, rx_freq);
                }
                Some(Event::TxStatus { success }) => {
                    session.on_tx_status(success);
                }
                Some(Event::UpdatePeer { peer }) => {
                    session.peers_mut().insert(peer);
                }
                Some(Event::State { reply }) => {
                    let _ = reply.send(session.state());
                }
                Some(Event::Stop) => session.stop(),
                Some(Event::Shutdown) | None => {
                    session.stop();
                    break;
                }
            },
            _ = async {
                match deadline.next() {
                    Some(at) => time::sleep_until(at).await,
                    None => future::pending().await,
                }
            } => {
                deadline.take();
                session.on_timeout();
            }
        }
    }
    debug!("invitation driver stopped");
}
