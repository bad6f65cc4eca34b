//! Upper-layer hook points.
//!
//! [`InvitationHooks`] is the capability interface the session calls out
//! through, replacing an opaque table of function pointers. Each hook fires
//! at most once per invitation cycle:
//!
//! - [`invitation_process`](InvitationHooks::invitation_process) - responder,
//!   before building the response; decides role, group BSSID, forced
//!   frequency and status.
//! - [`invitation_received`](InvitationHooks::invitation_received) -
//!   responder, after the response's TX completion; final local delivery.
//! - [`invitation_result`](InvitationHooks::invitation_result) - initiator,
//!   after parsing the response.
//! - [`send_action_done`](InvitationHooks::send_action_done) - responder,
//!   once per transmission cycle regardless of outcome.
//!
//! Hooks run synchronously on the session's control loop and must return
//! before the triggering state transition completes.

use crate::addr::MacAddr;
use crate::channels::ChannelSet;
use crate::wire::StatusCode;

/// A well-formed inbound Invitation Request, as presented to
/// [`InvitationHooks::invitation_process`].
#[derive(Debug, Clone)]
pub struct InviteRequest<'a> {
    /// Sender device address.
    pub sa: MacAddr,
    /// Group BSSID attribute from the request, if any.
    pub group_bssid: Option<MacAddr>,
    /// GO device address from the Group ID attribute.
    pub go_dev_addr: MacAddr,
    /// Group SSID from the Group ID attribute.
    pub ssid: &'a [u8],
    /// Whether this reinvokes a persistent group.
    pub persistent: bool,
}

/// Decision returned by [`InvitationHooks::invitation_process`].
#[derive(Debug, Clone)]
pub struct InviteDecision {
    /// Status to answer with; `Success` accepts the invitation.
    pub status: StatusCode,
    /// We will be the GO of the (re)formed group.
    pub go: bool,
    /// BSSID of the group being formed, when we are the GO of a specific
    /// interface.
    pub group_bssid: Option<MacAddr>,
    /// Force the group onto this frequency, in MHz.
    pub op_freq: Option<u32>,
}

impl InviteDecision {
    /// Accept as a client with no channel constraints.
    pub fn accept() -> Self {
        Self {
            status: StatusCode::Success,
            go: false,
            group_bssid: None,
            op_freq: None,
        }
    }

    /// Decline with the given failure status.
    pub fn reject(status: StatusCode) -> Self {
        Self {
            status,
            go: false,
            group_bssid: None,
            op_freq: None,
        }
    }
}

/// Final invitation outcome delivered on the responder side.
#[derive(Debug, Clone)]
pub struct InviteReceived {
    /// Peer that sent the Invitation Request.
    pub sa: MacAddr,
    /// Group BSSID from the request, if any.
    pub group_bssid: Option<MacAddr>,
    /// Group SSID.
    pub ssid: Vec<u8>,
    /// GO device address of the group.
    pub go_dev_addr: MacAddr,
    /// Status we answered with.
    pub status: StatusCode,
    /// Resolved operating frequency in MHz, 0 when none was agreed.
    pub op_freq: u32,
}

/// Invitation outcome delivered on the initiator side.
#[derive(Debug, Clone)]
pub struct InviteResult<'a> {
    /// Status the peer answered with.
    pub status: StatusCode,
    /// Group BSSID from the response, if any.
    pub group_bssid: Option<MacAddr>,
    /// Channel set usable with this peer (intersection, or the local set
    /// when the peer omitted its Channel List).
    pub channels: &'a ChannelSet,
    /// The responding peer.
    pub sa: MacAddr,
}

/// Upper-layer callbacks consumed by the session.
///
/// All methods have defaults so embedders implement only what they use; the
/// default `invitation_process` declines with
/// [`StatusCode::FailInfoCurrentlyUnavailable`], matching a device with no
/// policy attached.
pub trait InvitationHooks {
    /// Decide how to answer a well-formed Invitation Request.
    fn invitation_process(
        &mut self,
        request: &InviteRequest<'_>,
        intersection: &ChannelSet,
    ) -> InviteDecision {
        let _ = (request, intersection);
        InviteDecision::reject(StatusCode::FailInfoCurrentlyUnavailable)
    }

    /// The Invitation Response finished transmitting; the invitation is now
    /// locally delivered.
    fn invitation_received(&mut self, event: &InviteReceived) {
        let _ = event;
    }

    /// An Invitation Response from the invited peer was processed.
    fn invitation_result(&mut self, result: &InviteResult<'_>) {
        let _ = result;
    }

    /// The responder-side transmission cycle ended (success or not).
    fn send_action_done(&mut self) {}
}

/// Hooks that ignore every event; useful for tests and probes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHooks;

impl InvitationHooks for NullHooks {}
