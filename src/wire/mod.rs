//! Wire format for P2P Invitation action frames.
//!
//! An invitation travels as an 802.11 Public Action frame:
//!
//! ```text
//! ┌──────────┬────────┬──────────┬──────────┬─────────┬──────────────┐
//! │ Category │ Action │ OUI      │ OUI type │ Subtype │ Dialog token │
//! │ 0x04     │ 0x09   │ 50 6F 9A │ 0x09     │ 3 or 4  │ 1..=255      │
//! └──────────┴────────┴──────────┴──────────┴─────────┴──────────────┘
//! ```
//!
//! followed by one or more vendor-specific P2P Information Elements
//! (`0xDD len 50 6F 9A 09`) whose concatenated bodies form a sequence of
//! attributes, each `id(1) length(2, little endian) body`. An optional
//! vendor-extension block (e.g. Wi-Fi Display subelements) may trail the
//! P2P IEs and is carried verbatim.
//!
//! This module provides:
//! - [`attr`] - low-level attribute writers and the IE wrapper
//! - [`message`] - [`InvitationMessage`] and the inbound parser
//! - [`build`] - Invitation Request/Response payload builders

pub mod attr;
pub mod build;
pub mod message;

pub use build::{build_invitation_req, build_invitation_resp, InviteRole};
pub use message::{ChannelList, DeviceInfo, FrameKind, GroupId, InvitationMessage, OperatingChannel};

/// 802.11 Public Action category.
pub const CATEGORY_PUBLIC_ACTION: u8 = 0x04;

/// Vendor-specific Public Action code.
pub const ACTION_VENDOR_SPECIFIC: u8 = 0x09;

/// Wi-Fi Alliance OUI.
pub const WFA_OUI: [u8; 3] = [0x50, 0x6f, 0x9a];

/// P2P OUI type under the WFA OUI.
pub const OUI_TYPE_P2P: u8 = 0x09;

/// Vendor-specific IE tag.
pub const IE_VENDOR: u8 = 0xdd;

/// Frame subtype: Invitation Request.
pub const SUBTYPE_INVITATION_REQ: u8 = 3;

/// Frame subtype: Invitation Response.
pub const SUBTYPE_INVITATION_RESP: u8 = 4;

/// Length of the public-action header up to and including the dialog token.
pub const ACTION_HDR_LEN: usize = 8;

/// P2P attribute identifiers used by the invitation procedure.
pub mod attr_id {
    /// Status.
    pub const STATUS: u8 = 0;
    /// Configuration Timeout.
    pub const CONFIG_TIMEOUT: u8 = 5;
    /// P2P Group BSSID.
    pub const GROUP_BSSID: u8 = 7;
    /// Channel List.
    pub const CHANNEL_LIST: u8 = 11;
    /// P2P Device Info.
    pub const DEVICE_INFO: u8 = 13;
    /// P2P Group ID.
    pub const GROUP_ID: u8 = 15;
    /// Operating Channel.
    pub const OPERATING_CHANNEL: u8 = 17;
    /// Invitation Flags.
    pub const INVITATION_FLAGS: u8 = 18;
}

/// Invitation Flags attribute bits.
pub mod invitation_flags {
    /// Invitation type: set = persistent group reinvocation.
    pub const TYPE_PERSISTENT: u8 = 0b0000_0001;
}

/// P2P status code carried in the Status attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// Success.
    Success,
    /// Fail: information is currently unavailable.
    FailInfoCurrentlyUnavailable,
    /// Fail: incompatible parameters.
    FailIncompatibleParams,
    /// Fail: limit reached.
    FailLimitReached,
    /// Fail: invalid parameters.
    FailInvalidParams,
    /// Fail: unable to accommodate request.
    FailUnableToAccommodate,
    /// Fail: previous protocol error, or disruptive behavior.
    FailPrevProtocolError,
    /// Fail: no common channels.
    FailNoCommonChannels,
    /// Fail: unknown P2P Group.
    FailUnknownGroup,
    /// Fail: both devices indicated GO intent 15.
    FailBothGoIntent15,
    /// Fail: incompatible provisioning method.
    FailIncompatibleProvMethod,
    /// Fail: rejected by user.
    FailRejectedByUser,
    /// A code this implementation does not know; kept verbatim.
    Other(u8),
}

impl StatusCode {
    /// Wire value of the status code.
    pub fn as_u8(self) -> u8 {
        match self {
            StatusCode::Success => 0,
            StatusCode::FailInfoCurrentlyUnavailable => 1,
            StatusCode::FailIncompatibleParams => 2,
            StatusCode::FailLimitReached => 3,
            StatusCode::FailInvalidParams => 4,
            StatusCode::FailUnableToAccommodate => 5,
            StatusCode::FailPrevProtocolError => 6,
            StatusCode::FailNoCommonChannels => 7,
            StatusCode::FailUnknownGroup => 8,
            StatusCode::FailBothGoIntent15 => 9,
            StatusCode::FailIncompatibleProvMethod => 10,
            StatusCode::FailRejectedByUser => 11,
            StatusCode::Other(v) => v,
        }
    }

    /// Decode a wire value.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => StatusCode::Success,
            1 => StatusCode::FailInfoCurrentlyUnavailable,
            2 => StatusCode::FailIncompatibleParams,
            3 => StatusCode::FailLimitReached,
            4 => StatusCode::FailInvalidParams,
            5 => StatusCode::FailUnableToAccommodate,
            6 => StatusCode::FailPrevProtocolError,
            7 => StatusCode::FailNoCommonChannels,
            8 => StatusCode::FailUnknownGroup,
            9 => StatusCode::FailBothGoIntent15,
            10 => StatusCode::FailIncompatibleProvMethod,
            11 => StatusCode::FailRejectedByUser,
            other => StatusCode::Other(other),
        }
    }

    /// Check if this is the success status.
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, StatusCode::Success)
    }
}
