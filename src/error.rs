//! Error types for the invitation core.

use thiserror::Error;

use crate::addr::MacAddr;

/// Main error type for all invitation operations.
///
/// Policy failures on the responder path (no common channels, invalid
/// parameters, transient unavailability) are deliberately *not* represented
/// here: they travel as a [`StatusCode`](crate::wire::StatusCode) inside a
/// transmitted Invitation Response. `InviteError` covers the cases where the
/// current step aborts locally instead.
#[derive(Debug, Error)]
pub enum InviteError {
    /// Malformed inbound frame or missing mandatory attribute.
    ///
    /// The session drops such frames silently (log only, no response).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Channel negotiation found no common (reg class, channel) pair.
    #[error("no common channels with peer")]
    NoCommonChannels,

    /// A frequency that cannot be mapped to a (reg class, channel) pair.
    #[error("unknown frequency: {0} MHz")]
    UnknownFrequency(u32),

    /// A (reg class, channel) pair that cannot be mapped to a frequency.
    #[error("unknown channel: reg class {reg_class} channel {channel}")]
    UnknownChannel { reg_class: u8, channel: u8 },

    /// SSID longer than the 32-byte 802.11 limit.
    #[error("SSID too long: {0} bytes (max 32)")]
    SsidTooLong(usize),

    /// Peer is not in the peer table.
    #[error("unknown peer device {0}")]
    UnknownPeer(MacAddr),

    /// Peer has neither a listen nor an operating frequency on record, so
    /// there is nowhere to send an Invitation Request.
    #[error("no listen/operating frequency known for peer {0}")]
    NoPeerFrequency(MacAddr),

    /// An invitation exchange is already outstanding on this interface.
    #[error("invitation session busy")]
    SessionBusy,

    /// Frame could not be handed to the transport.
    #[error("transport error: {0}")]
    Transport(String),

    /// Driver event channel closed.
    #[error("driver closed")]
    Closed,
}

/// Result type alias using InviteError.
pub type Result<T> = std::result::Result<T, InviteError>;
