//! Invitation session state machine.
//!
//! One [`InviteSession`] drives both sides of the invitation exchange:
//!
//! ```text
//!   initiator                               responder
//!   ---------                               ---------
//!   invite()          -- Invitation Req --> handle_request()
//!   on_tx_status()                          on_tx_status()
//!   handle_response() <-- Invitation Resp --
//! ```
//!
//! The session is synchronous and single-threaded: every entry point takes
//! `&mut self` and returns before any callback-driven follow-up. Frame
//! delivery, TX-status reports, and timer expiry are injected by the caller
//! (see [`crate::driver`] for a tokio harness that does this).
//!
//! Only one outbound invitation is in flight at a time. A second call to
//! [`InviteSession::invite`] while the first is pending fails with
//! [`InviteError::SessionBusy`]; the pending attempt is released by a
//! response, a timeout, or [`InviteSession::stop`].

use std::time::Duration;

use tracing::{debug, warn};

use crate::addr::MacAddr;
use crate::channels::{channel_to_freq, freq_to_channel, ChannelSet};
use crate::config::Config;
use crate::error::{InviteError, Result};
use crate::hooks::{InvitationHooks, InviteReceived, InviteRequest, InviteResult};
use crate::negotiate::{
    select_operating_channel, PeerChannelInfo, PreferPeerOrder, ReselectStrategy,
};
use crate::peer::{dev_capab, flags, PeerTable};
use crate::transport::{ActionTransport, OutboundAction, TimerService};
use crate::wire::{
    self, build_invitation_req, build_invitation_resp, FrameKind, InvitationMessage, InviteRole,
    StatusCode,
};

/// Dwell time requested from the driver for an outbound action frame.
pub const SEND_WAIT_MS: u32 = 200;

/// Delay before giving up on a response when the request was acknowledged.
pub const RESPONSE_TIMEOUT_ACKED: Duration = Duration::from_millis(350);

/// Delay before giving up when the request was not acknowledged.
pub const RESPONSE_TIMEOUT_NO_ACK: Duration = Duration::from_millis(100);

/// Current phase of the invitation exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No invitation activity.
    Idle,
    /// Invitation Request handed to the driver, waiting for its TX status.
    InvitePendingAck,
    /// Request acknowledged, waiting for the peer's Invitation Response.
    InviteWaitingResponse,
    /// Invitation Response handed to the driver, waiting for its TX status.
    ResponsePendingAck,
}

/// Caller-supplied parameters for an outbound invitation.
#[derive(Debug, Clone)]
pub struct InviteParams {
    /// Local role in the group being invited to.
    pub role: InviteRole,
    /// BSSID of the group, when operating or known.
    pub bssid: Option<MacAddr>,
    /// SSID of the group (at most 32 octets).
    pub ssid: Vec<u8>,
    /// Hard frequency requirement; the invitation fails if unusable.
    pub force_freq: Option<u32>,
    /// GO device address for the Group ID; defaults by role when `None`.
    pub go_dev_addr: Option<MacAddr>,
    /// Whether this re-invokes a persistent group.
    pub persistent: bool,
    /// Soft frequency preference.
    pub pref_freq: Option<u32>,
}

/// Everything the responder path decides before a response is emitted.
///
/// Produced by a single validation pass so the one call site in
/// `handle_request` decides whether and what to send back.
struct RequestOutcome {
    status: StatusCode,
    go: bool,
    group_bssid: Option<MacAddr>,
    reg_class: u8,
    channel: u8,
    channels: Option<ChannelSet>,
    op_freq: u32,
}

impl RequestOutcome {
    fn failure(status: StatusCode) -> Self {
        Self {
            status,
            go: false,
            group_bssid: None,
            reg_class: 0,
            channel: 0,
            channels: None,
            op_freq: 0,
        }
    }
}

/// Invitation state machine for one local device.
pub struct InviteSession {
    cfg: Config,
    peers: PeerTable,
    transport: Box<dyn ActionTransport + Send>,
    timer: Box<dyn TimerService + Send>,
    hooks: Box<dyn InvitationHooks + Send>,
    reselect: Box<dyn ReselectStrategy + Send>,
    state: SessionState,
    /// Peer an outbound invitation is addressed to, while one is in flight.
    invite_peer: Option<MacAddr>,
    /// Responder outcome held back until the response TX status arrives.
    pending: Option<InviteReceived>,
}

impl InviteSession {
    pub fn new(
        cfg: Config,
        transport: Box<dyn ActionTransport + Send>,
        timer: Box<dyn TimerService + Send>,
        hooks: Box<dyn InvitationHooks + Send>,
    ) -> Self {
        Self {
            cfg,
            peers: PeerTable::new(),
            transport,
            timer,
            hooks,
            reselect: Box::new(PreferPeerOrder),
            state: SessionState::Idle,
            invite_peer: None,
            pending: None,
        }
    }

    /// Replaces the channel reselection strategy.
    pub fn set_reselect_strategy(&mut self, strategy: Box<dyn ReselectStrategy + Send>) {
        self.reselect = strategy;
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Peer addressed by the in-flight outbound invitation, if any.
    #[inline]
    pub fn invited_peer(&self) -> Option<MacAddr> {
        self.invite_peer
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    #[inline]
    pub fn peers(&self) -> &PeerTable {
        &self.peers
    }

    #[inline]
    pub fn peers_mut(&mut self) -> &mut PeerTable {
        &mut self.peers
    }

    /// Starts an invitation exchange with `peer_addr`.
    ///
    /// On success the request frame has been handed to the transport and the
    /// session waits for [`on_tx_status`](Self::on_tx_status). A transport
    /// send failure is not an error here; a zero-delay timeout is armed so
    /// the caller can resume discovery and retry.
    pub fn invite(&mut self, peer_addr: MacAddr, params: InviteParams) -> Result<()> {
        if self.state != SessionState::Idle {
            return Err(InviteError::SessionBusy);
        }
        debug!(peer = %peer_addr, role = ?params.role, persistent = params.persistent,
               "inviting peer");

        // A forced or preferred frequency narrows the operating channel for
        // this request only; the configured default is left alone.
        let op_override = if let Some(freq) = params.force_freq.or(params.pref_freq) {
            let (reg_class, channel) = freq_to_channel(freq)?;
            if !self.cfg.channels.includes(reg_class, channel) {
                debug!(freq, "requested frequency not in our channel set");
                return Err(InviteError::NoCommonChannels);
            }
            Some((reg_class, channel))
        } else {
            None
        };

        let peer = self
            .peers
            .get_mut(&peer_addr)
            .ok_or(InviteError::UnknownPeer(peer_addr))?;
        let freq = peer
            .invite_freq()
            .ok_or(InviteError::NoPeerFrequency(peer_addr))?;

        // Re-invoking a persistent group as a client with no frequency
        // constraint lets the GO pick; advertise that in the request.
        if params.persistent
            && params.role == InviteRole::Client
            && params.force_freq.is_none()
            && params.pref_freq.is_none()
        {
            peer.flags |= flags::NO_PREF_CHAN;
        } else {
            peer.flags &= !flags::NO_PREF_CHAN;
        }

        if peer.has_flag(flags::GROUP_CLIENT_ONLY)
            && peer.dev_capab & dev_capab::CLIENT_DISCOVERABILITY == 0
        {
            warn!(peer = %peer_addr,
                  "peer is only a group client and not discoverable; invitation may not reach it");
        }

        peer.invitation_reqs = 0;
        let configured = (self.cfg.op_reg_class, self.cfg.op_channel);
        if let Some((reg_class, channel)) = op_override {
            self.cfg.op_reg_class = reg_class;
            self.cfg.op_channel = channel;
        }
        let payload = build_invitation_req(
            &self.cfg,
            peer,
            params.role,
            params.persistent,
            params.bssid,
            &params.ssid,
            params.go_dev_addr,
        );
        self.cfg.op_reg_class = configured.0;
        self.cfg.op_channel = configured.1;
        let payload = payload?;
        peer.invitation_reqs += 1;

        self.transport.stop_listen(freq);
        self.invite_peer = Some(peer_addr);
        self.state = SessionState::InvitePendingAck;

        let action = OutboundAction {
            freq,
            dst: peer_addr,
            src: self.cfg.dev_addr,
            bssid: peer_addr,
            payload,
            wait_ms: SEND_WAIT_MS,
        };
        if let Err(err) = self.transport.send_action(action) {
            warn!(%err, "failed to send invitation request");
            self.timer.set_timeout(Duration::ZERO);
        }
        Ok(())
    }

    /// Routes a received Public Action frame by invitation subtype.
    ///
    /// Frames that are not invitation frames are ignored.
    pub fn handle_frame(&mut self, sa: MacAddr, payload: &[u8], rx_freq: u32) {
        match payload.get(6) {
            Some(&wire::SUBTYPE_INVITATION_REQ) => self.handle_request(sa, payload, rx_freq),
            Some(&wire::SUBTYPE_INVITATION_RESP) => self.handle_response(sa, payload),
            _ => debug!(%sa, "ignoring non-invitation action frame"),
        }
    }

    /// Processes a received Invitation Request and sends the response.
    pub fn handle_request(&mut self, sa: MacAddr, payload: &[u8], rx_freq: u32) {
        debug!(%sa, rx_freq, "received invitation request");
        let msg = match wire::message::parse(payload) {
            Ok(msg) if msg.kind == FrameKind::Request => msg,
            Ok(_) => {
                debug!(%sa, "frame is not an invitation request");
                return;
            }
            Err(err) => {
                debug!(%sa, %err, "dropping malformed invitation request");
                return;
            }
        };
        match self.process_request(&msg, sa, rx_freq) {
            Ok(outcome) => self.respond(&msg, sa, rx_freq, outcome),
            Err(err) => debug!(%sa, %err, "dropping invitation request without response"),
        }
    }

    /// Validates the request and decides the response contents.
    ///
    /// `Err` means the frame is dropped without any response; `Ok` always
    /// produces a response, possibly with a failure status.
    fn process_request(
        &mut self,
        msg: &InvitationMessage,
        sa: MacAddr,
        rx_freq: u32,
    ) -> Result<RequestOutcome> {
        let known = self
            .peers
            .get(&sa)
            .map(|p| !p.has_flag(flags::PROBE_REQ_ONLY))
            .unwrap_or(false);
        if !known {
            debug!(%sa, "invitation request from unknown peer");
            if self.peers.add_unknown(sa, rx_freq).is_none() {
                debug!(%sa, "could not create a peer entry");
                return Ok(RequestOutcome::failure(
                    StatusCode::FailInfoCurrentlyUnavailable,
                ));
            }
        }

        let (Some(group_id), Some(channel_list)) = (&msg.group_id, &msg.channel_list) else {
            return Err(InviteError::Protocol(
                "mandatory attribute missing in invitation request".into(),
            ));
        };

        let persistent = match msg.persistent_flag() {
            Some(p) => p,
            None => {
                // Pre-1.06 devices omit Invitation Flags; they only ever
                // re-invoked persistent groups.
                debug!(%sa, "no invitation flags attribute, assuming persistent");
                true
            }
        };

        let Some(peer) = self.peers.get_mut(&sa) else {
            return Ok(RequestOutcome::failure(
                StatusCode::FailInfoCurrentlyUnavailable,
            ));
        };
        peer.channels = channel_list.set.clone();
        let peer_channels = peer.channels.clone();
        let peer_force_freq = peer.has_flag(flags::FORCE_FREQ);
        let peer_no_pref = peer.has_flag(flags::NO_PREF_CHAN);

        let intersection = self.cfg.channels.intersect(&peer_channels);
        if intersection.is_empty() {
            debug!(%sa, "no common channels with inviting peer");
            return Ok(RequestOutcome::failure(StatusCode::FailNoCommonChannels));
        }

        let request = InviteRequest {
            sa,
            group_bssid: msg.group_bssid,
            go_dev_addr: group_id.go_dev_addr,
            ssid: &group_id.ssid,
            persistent,
        };
        let decision = self.hooks.invitation_process(&request, &intersection);

        let peer_info = PeerChannelInfo {
            preferred: msg
                .operating_channel
                .map(|oc| (oc.reg_class, oc.channel)),
            channels: Some(&peer_channels),
            force_freq: peer_force_freq,
            no_pref_chan: peer_no_pref,
        };
        let selected = match select_operating_channel(
            &self.cfg,
            peer_info,
            &intersection,
            decision.op_freq,
            self.reselect.as_ref(),
        ) {
            Ok(sel) => sel,
            Err(err) => {
                debug!(%sa, %err, "operating channel selection failed");
                let mut outcome = RequestOutcome::failure(StatusCode::FailNoCommonChannels);
                outcome.go = decision.go;
                outcome.group_bssid = decision.group_bssid;
                return Ok(outcome);
            }
        };

        if decision.status.is_success() {
            Ok(RequestOutcome {
                status: StatusCode::Success,
                go: decision.go,
                group_bssid: decision.group_bssid,
                reg_class: selected.reg_class,
                channel: selected.channel,
                channels: Some(intersection),
                op_freq: selected.freq,
            })
        } else {
            Ok(RequestOutcome {
                status: decision.status,
                go: decision.go,
                group_bssid: decision.group_bssid,
                reg_class: 0,
                channel: 0,
                channels: None,
                op_freq: selected.freq,
            })
        }
    }

    /// Builds and sends the Invitation Response for a processed request.
    fn respond(&mut self, msg: &InvitationMessage, sa: MacAddr, rx_freq: u32, outcome: RequestOutcome) {
        // Only an accepting GO advertises the group BSSID back.
        let bssid = if outcome.go && outcome.status.is_success() {
            outcome.group_bssid.filter(|b| !b.is_zero())
        } else {
            None
        };
        let payload = build_invitation_resp(
            &self.cfg,
            msg.dialog_token,
            outcome.status,
            bssid,
            outcome.reg_class,
            outcome.channel,
            outcome.channels.as_ref(),
        );

        let freq = if rx_freq > 0 {
            rx_freq
        } else {
            match channel_to_freq(self.cfg.listen_reg_class, self.cfg.listen_channel) {
                Ok(freq) => freq,
                Err(err) => {
                    warn!(%err, "no frequency to send invitation response on");
                    return;
                }
            }
        };

        // The upper layer learns about the invitation only once the
        // response TX status comes back.
        self.pending = Some(InviteReceived {
            sa,
            group_bssid: msg.group_bssid,
            ssid: msg
                .group_id
                .as_ref()
                .map(|g| g.ssid.clone())
                .unwrap_or_default(),
            go_dev_addr: msg
                .group_id
                .as_ref()
                .map(|g| g.go_dev_addr)
                .unwrap_or(MacAddr::ZERO),
            status: outcome.status,
            op_freq: outcome.op_freq,
        });
        self.state = SessionState::ResponsePendingAck;

        let action = OutboundAction {
            freq,
            dst: sa,
            src: self.cfg.dev_addr,
            bssid: self.cfg.dev_addr,
            payload,
            wait_ms: SEND_WAIT_MS,
        };
        if let Err(err) = self.transport.send_action(action) {
            warn!(%err, "failed to send invitation response");
        }
    }

    /// Processes a received Invitation Response addressed to us.
    pub fn handle_response(&mut self, sa: MacAddr, payload: &[u8]) {
        debug!(%sa, "received invitation response");
        if self.peers.get(&sa).is_none() {
            debug!(%sa, "ignoring invitation response from unknown peer");
            return;
        }
        if self.invite_peer != Some(sa) {
            debug!(%sa, "ignoring invitation response from unexpected peer");
            return;
        }
        let msg = match wire::message::parse(payload) {
            Ok(msg) if msg.kind == FrameKind::Response => msg,
            Ok(_) => {
                debug!(%sa, "frame is not an invitation response");
                return;
            }
            Err(err) => {
                debug!(%sa, %err, "dropping malformed invitation response");
                return;
            }
        };
        let Some(status) = msg.status else {
            debug!(%sa, "invitation response without status attribute");
            return;
        };

        let channels = match &msg.channel_list {
            None => {
                debug!(%sa, "invitation response without channel list");
                if self.cfg.strict {
                    return;
                }
                // Tolerate the omission and fall back to our own set.
                self.cfg.channels.clone()
            }
            Some(list) => {
                if let Some(peer) = self.peers.get_mut(&sa) {
                    peer.channels = list.set.clone();
                }
                let intersection = self.cfg.channels.intersect(&list.set);
                if intersection.is_empty() {
                    debug!(%sa, "no common channels in invitation response");
                    return;
                }
                intersection
            }
        };

        if status.is_success() {
            if let Some(oc) = msg.operating_channel {
                if !channels.includes(oc.reg_class, oc.channel) {
                    warn!(%sa, reg_class = oc.reg_class, channel = oc.channel,
                          "peer selected operating channel outside the common set");
                }
            }
        }

        let result = InviteResult {
            status,
            group_bssid: msg.group_bssid,
            channels: &channels,
            sa,
        };
        self.hooks.invitation_result(&result);

        self.timer.clear_timeout();
        self.invite_peer = None;
        self.state = SessionState::Idle;
    }

    /// Feeds a driver TX-status report for the last outbound frame.
    pub fn on_tx_status(&mut self, success: bool) {
        match self.state {
            SessionState::InvitePendingAck => {
                debug!(success, "invitation request tx status");
                if self.invite_peer.is_none() {
                    debug!("no invitation in flight");
                    return;
                }
                // An unacknowledged request gets a much shorter grace
                // period before discovery resumes and retries.
                self.state = SessionState::InviteWaitingResponse;
                self.timer.set_timeout(if success {
                    RESPONSE_TIMEOUT_ACKED
                } else {
                    RESPONSE_TIMEOUT_NO_ACK
                });
            }
            SessionState::ResponsePendingAck => {
                debug!(success, "invitation response tx status");
                self.hooks.send_action_done();
                if !success {
                    // The peer may still have received the response; report
                    // the invitation upward either way.
                    debug!("invitation response not acked, assuming it was received");
                }
                if let Some(received) = self.pending.take() {
                    self.hooks.invitation_received(&received);
                }
                self.state = SessionState::Idle;
            }
            _ => debug!(success, "ignoring unexpected tx status"),
        }
    }

    /// Handles expiry of the timeout armed by [`on_tx_status`](Self::on_tx_status).
    pub fn on_timeout(&mut self) {
        match self.state {
            SessionState::InvitePendingAck | SessionState::InviteWaitingResponse => {
                debug!(peer = ?self.invite_peer, "invitation attempt timed out");
                self.invite_peer = None;
                self.state = SessionState::Idle;
            }
            _ => debug!("spurious invitation timeout"),
        }
    }

    /// Cancels any in-flight invitation activity.
    pub fn stop(&mut self) {
        if self.state != SessionState::Idle {
            debug!(state = ?self.state, "stopping invitation session");
        }
        self.timer.clear_timeout();
        self.invite_peer = None;
        self.pending = None;
        self.state = SessionState::Idle;
    }
}
