//! Collaborator traits: action-frame transport and timer service.
//!
//! The session never blocks. It queues a frame with
//! [`ActionTransport::send_action`] and learns the outcome later through
//! `InviteSession::on_tx_status`; it arms a single timer with
//! [`TimerService::set_timeout`] and learns about expiry through
//! `InviteSession::on_timeout`. Both callbacks are invoked by whatever owns
//! the control loop (see [`driver`](crate::driver) for a tokio one).

use std::time::Duration;

use bytes::Bytes;

use crate::addr::MacAddr;
use crate::error::Result;

/// An action frame queued for transmission.
#[derive(Debug, Clone)]
pub struct OutboundAction {
    /// Frequency to transmit on, in MHz.
    pub freq: u32,
    /// Destination device address.
    pub dst: MacAddr,
    /// Source device address.
    pub src: MacAddr,
    /// BSSID field of the frame.
    pub bssid: MacAddr,
    /// Full action-frame payload.
    pub payload: Bytes,
    /// How long the radio should stay on the channel waiting for a reply,
    /// in milliseconds.
    pub wait_ms: u32,
}

/// Queues action frames for asynchronous transmission.
pub trait ActionTransport {
    /// Queue a frame. Completion (ack or not) is reported later via
    /// `InviteSession::on_tx_status`.
    fn send_action(&mut self, action: OutboundAction) -> Result<()>;

    /// Stop any listen activity that would conflict with transmitting on
    /// `freq`. Default: nothing to stop.
    fn stop_listen(&mut self, freq: u32) {
        let _ = freq;
    }
}

/// One-shot timer owned by the session.
///
/// Arming replaces any previously armed timeout.
pub trait TimerService {
    /// Arm the timer; `InviteSession::on_timeout` fires after `delay`.
    fn set_timeout(&mut self, delay: Duration);

    /// Disarm the timer.
    fn clear_timeout(&mut self);
}
