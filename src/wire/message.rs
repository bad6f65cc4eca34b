//! Parsed invitation frames.
//!
//! [`parse`] decodes a full action-frame payload into an
//! [`InvitationMessage`] with one explicit `Option` field per attribute, so
//! "mandatory attribute missing" is a single validation step in the session
//! instead of scattered presence checks on raw buffers.
//!
//! Malformed input (truncated header, bad OUI, truncated or duplicate
//! attributes) is reported as [`InviteError::Protocol`]; the caller drops
//! such frames without responding.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use super::{attr_id, StatusCode, ACTION_HDR_LEN, ACTION_VENDOR_SPECIFIC, CATEGORY_PUBLIC_ACTION,
            IE_VENDOR, OUI_TYPE_P2P, SUBTYPE_INVITATION_REQ, SUBTYPE_INVITATION_RESP, WFA_OUI};
use crate::addr::MacAddr;
use crate::channels::ChannelSet;
use crate::error::{InviteError, Result};

/// Which of the two invitation frames this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Invitation Request.
    Request,
    /// Invitation Response.
    Response,
}

/// Decoded Operating Channel attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatingChannel {
    /// Country string (two ASCII letters + operating-class table byte).
    pub country: [u8; 3],
    /// Regulatory class.
    pub reg_class: u8,
    /// Channel number.
    pub channel: u8,
}

/// Decoded Channel List attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelList {
    /// Country string.
    pub country: [u8; 3],
    /// The declared channels, in the sender's preference order.
    pub set: ChannelSet,
}

/// Decoded P2P Group ID attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupId {
    /// GO P2P Device Address.
    pub go_dev_addr: MacAddr,
    /// Group SSID (0..=32 bytes).
    pub ssid: Vec<u8>,
}

/// Decoded P2P Device Info attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// P2P Device Address.
    pub dev_addr: MacAddr,
    /// WSC config methods bitmap.
    pub config_methods: u16,
    /// Primary device type (category, OUI, subcategory).
    pub pri_dev_type: [u8; 8],
    /// Device name (may be empty if the WPS TLV is absent).
    pub device_name: String,
}

/// A parsed Invitation Request or Response.
///
/// Presence of each attribute is explicit; mandatory-attribute validation
/// belongs to the session, not to the parser.
#[derive(Debug, Clone)]
pub struct InvitationMessage {
    /// Request or Response.
    pub kind: FrameKind,
    /// Dialog token (never 0 on the wire).
    pub dialog_token: u8,
    /// Status attribute (mandatory in responses).
    pub status: Option<StatusCode>,
    /// Configuration Timeout attribute as (go, client) 10 ms units.
    pub config_timeout: Option<(u8, u8)>,
    /// Invitation Flags attribute byte.
    pub invitation_flags: Option<u8>,
    /// Operating Channel attribute.
    pub operating_channel: Option<OperatingChannel>,
    /// P2P Group BSSID attribute.
    pub group_bssid: Option<MacAddr>,
    /// Channel List attribute (mandatory in requests).
    pub channel_list: Option<ChannelList>,
    /// P2P Group ID attribute (mandatory in requests).
    pub group_id: Option<GroupId>,
    /// P2P Device Info attribute.
    pub device_info: Option<DeviceInfo>,
    /// Trailing non-P2P vendor elements, verbatim.
    pub vendor_ext: Option<Bytes>,
}

impl InvitationMessage {
    /// Persistent-group bit of the Invitation Flags attribute, if present.
    pub fn persistent_flag(&self) -> Option<bool> {
        self.invitation_flags
            .map(|f| f & super::invitation_flags::TYPE_PERSISTENT != 0)
    }
}

fn protocol(msg: impl Into<String>) -> InviteError {
    InviteError::Protocol(msg.into())
}

/// Parse an invitation action-frame payload.
pub fn parse(data: &[u8]) -> Result<InvitationMessage> {
    if data.len() < ACTION_HDR_LEN {
        return Err(protocol("frame shorter than public action header"));
    }
    if data[0] != CATEGORY_PUBLIC_ACTION || data[1] != ACTION_VENDOR_SPECIFIC {
        return Err(protocol("not a vendor-specific public action frame"));
    }
    if data[2..5] != WFA_OUI || data[5] != OUI_TYPE_P2P {
        return Err(protocol("not a P2P action frame"));
    }
    let kind = match data[6] {
        SUBTYPE_INVITATION_REQ => FrameKind::Request,
        SUBTYPE_INVITATION_RESP => FrameKind::Response,
        other => return Err(protocol(format!("unexpected frame subtype {other}"))),
    };
    let dialog_token = data[7];
    if dialog_token == 0 {
        return Err(protocol("dialog token 0"));
    }

    // Collect the P2P IE bodies (they may be fragmented across elements) and
    // keep any other trailing vendor elements verbatim.
    let mut p2p_body = BytesMut::new();
    let mut vendor_ext = BytesMut::new();
    let mut rest = &data[ACTION_HDR_LEN..];
    while !rest.is_empty() {
        if rest.len() < 2 {
            return Err(protocol("truncated information element"));
        }
        let tag = rest[0];
        let len = rest[1] as usize;
        if rest.len() < 2 + len {
            return Err(protocol("information element overruns frame"));
        }
        let body = &rest[2..2 + len];
        if tag == IE_VENDOR && len >= 4 && body[..3] == WFA_OUI && body[3] == OUI_TYPE_P2P {
            p2p_body.put_slice(&body[4..]);
        } else {
            vendor_ext.put_slice(&rest[..2 + len]);
        }
        rest = &rest[2 + len..];
    }

    let mut msg = InvitationMessage {
        kind,
        dialog_token,
        status: None,
        config_timeout: None,
        invitation_flags: None,
        operating_channel: None,
        group_bssid: None,
        channel_list: None,
        group_id: None,
        device_info: None,
        vendor_ext: if vendor_ext.is_empty() {
            None
        } else {
            Some(vendor_ext.freeze())
        },
    };
    parse_attributes(&p2p_body, &mut msg)?;
    Ok(msg)
}

fn parse_attributes(mut body: &[u8], msg: &mut InvitationMessage) -> Result<()> {
    while !body.is_empty() {
        if body.len() < 3 {
            return Err(protocol("truncated attribute header"));
        }
        let id = body[0];
        let len = u16::from_le_bytes([body[1], body[2]]) as usize;
        if body.len() < 3 + len {
            return Err(protocol(format!("attribute {id} overruns IE body")));
        }
        let value = &body[3..3 + len];
        parse_attribute(id, value, msg)?;
        body = &body[3 + len..];
    }
    Ok(())
}

fn duplicate(id: u8) -> InviteError {
    protocol(format!("duplicate attribute {id}"))
}

fn parse_attribute(id: u8, value: &[u8], msg: &mut InvitationMessage) -> Result<()> {
    match id {
        attr_id::STATUS => {
            if value.is_empty() {
                return Err(protocol("empty Status attribute"));
            }
            if msg.status.replace(StatusCode::from_u8(value[0])).is_some() {
                return Err(duplicate(id));
            }
        }
        attr_id::CONFIG_TIMEOUT => {
            if value.len() < 2 {
                return Err(protocol("short Configuration Timeout attribute"));
            }
            if msg.config_timeout.replace((value[0], value[1])).is_some() {
                return Err(duplicate(id));
            }
        }
        attr_id::INVITATION_FLAGS => {
            if value.is_empty() {
                return Err(protocol("empty Invitation Flags attribute"));
            }
            if msg.invitation_flags.replace(value[0]).is_some() {
                return Err(duplicate(id));
            }
        }
        attr_id::OPERATING_CHANNEL => {
            if value.len() < 5 {
                return Err(protocol("short Operating Channel attribute"));
            }
            let oc = OperatingChannel {
                country: [value[0], value[1], value[2]],
                reg_class: value[3],
                channel: value[4],
            };
            if msg.operating_channel.replace(oc).is_some() {
                return Err(duplicate(id));
            }
        }
        attr_id::GROUP_BSSID => {
            let bssid = MacAddr::from_slice(value)
                .ok_or_else(|| protocol("Group BSSID attribute is not 6 bytes"))?;
            if msg.group_bssid.replace(bssid).is_some() {
                return Err(duplicate(id));
            }
        }
        attr_id::CHANNEL_LIST => {
            let list = parse_channel_list(value)?;
            if msg.channel_list.replace(list).is_some() {
                return Err(duplicate(id));
            }
        }
        attr_id::GROUP_ID => {
            if value.len() < 6 || value.len() > 6 + 32 {
                return Err(protocol(format!(
                    "Group ID attribute has bad length {}",
                    value.len()
                )));
            }
            let group_id = GroupId {
                go_dev_addr: MacAddr::from_slice(&value[..6]).unwrap_or(MacAddr::ZERO),
                ssid: value[6..].to_vec(),
            };
            if msg.group_id.replace(group_id).is_some() {
                return Err(duplicate(id));
            }
        }
        attr_id::DEVICE_INFO => {
            let info = parse_device_info(value)?;
            if msg.device_info.replace(info).is_some() {
                return Err(duplicate(id));
            }
        }
        other => {
            debug!(attr = other, len = value.len(), "ignoring unknown P2P attribute");
        }
    }
    Ok(())
}

fn parse_channel_list(value: &[u8]) -> Result<ChannelList> {
    if value.len() < 3 {
        return Err(protocol("short Channel List attribute"));
    }
    let country = [value[0], value[1], value[2]];
    let mut set = ChannelSet::new();
    let mut rest = &value[3..];
    while !rest.is_empty() {
        if rest.len() < 2 {
            return Err(protocol("truncated channel run in Channel List"));
        }
        let reg_class = rest[0];
        let count = rest[1] as usize;
        if rest.len() < 2 + count {
            return Err(protocol("channel run overruns Channel List attribute"));
        }
        for &channel in &rest[2..2 + count] {
            set.push(reg_class, channel);
        }
        rest = &rest[2 + count..];
    }
    Ok(ChannelList { country, set })
}

fn parse_device_info(value: &[u8]) -> Result<DeviceInfo> {
    // addr(6) + config methods(2) + primary device type(8) + num secondary(1)
    if value.len() < 17 {
        return Err(protocol("short Device Info attribute"));
    }
    let dev_addr = MacAddr::from_slice(&value[..6]).unwrap_or(MacAddr::ZERO);
    let config_methods = u16::from_be_bytes([value[6], value[7]]);
    let mut pri_dev_type = [0u8; 8];
    pri_dev_type.copy_from_slice(&value[8..16]);

    let num_secondary = value[16] as usize;
    let mut rest = &value[17..];
    // Secondary device types are 8 bytes each; skip them.
    if rest.len() < num_secondary * 8 {
        return Err(protocol("Device Info secondary types overrun attribute"));
    }
    rest = &rest[num_secondary * 8..];

    let mut device_name = String::new();
    if rest.len() >= 4 {
        let attr_type = u16::from_be_bytes([rest[0], rest[1]]);
        let name_len = u16::from_be_bytes([rest[2], rest[3]]) as usize;
        if attr_type == 0x1011 {
            if rest.len() < 4 + name_len {
                return Err(protocol("Device Name overruns Device Info attribute"));
            }
            device_name = String::from_utf8_lossy(&rest[4..4 + name_len]).into_owned();
        }
    }

    Ok(DeviceInfo {
        dev_addr,
        config_methods,
        pri_dev_type,
        device_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::attr;

    /// Build a minimal valid request payload by hand.
    fn make_request(with_group_id: bool, with_channel_list: bool) -> Vec<u8> {
        let mut hdr = BytesMut::new();
        attr::put_public_action_hdr(&mut hdr, SUBTYPE_INVITATION_REQ, 5);

        let mut attrs = BytesMut::new();
        attr::put_config_timeout(&mut attrs, 0, 0);
        attr::put_invitation_flags(&mut attrs, 0x01);
        if with_channel_list {
            let set = ChannelSet::from_pairs(&[(81, 1), (81, 6)]);
            attr::put_channel_list(&mut attrs, *b"XX\x04", &set);
        }
        if with_group_id {
            attr::put_group_id(&mut attrs, MacAddr::new([1, 2, 3, 4, 5, 6]), b"DIRECT-xy")
                .unwrap();
        }

        let mut out = BytesMut::from(&hdr[..]);
        attr::wrap_p2p_ie(&mut out, &attrs);
        out.to_vec()
    }

    #[test]
    fn test_parse_request() {
        let payload = make_request(true, true);
        let msg = parse(&payload).unwrap();

        assert_eq!(msg.kind, FrameKind::Request);
        assert_eq!(msg.dialog_token, 5);
        assert_eq!(msg.config_timeout, Some((0, 0)));
        assert_eq!(msg.persistent_flag(), Some(true));
        let list = msg.channel_list.unwrap();
        assert!(list.set.includes(81, 6));
        let gid = msg.group_id.unwrap();
        assert_eq!(gid.go_dev_addr, MacAddr::new([1, 2, 3, 4, 5, 6]));
        assert_eq!(gid.ssid, b"DIRECT-xy");
    }

    #[test]
    fn test_parse_reports_missing_optionals_as_none() {
        let payload = make_request(false, false);
        let msg = parse(&payload).unwrap();
        assert!(msg.group_id.is_none());
        assert!(msg.channel_list.is_none());
        assert!(msg.status.is_none());
    }

    #[test]
    fn test_parse_rejects_short_frame() {
        assert!(parse(&[0x04, 0x09, 0x50]).is_err());
    }

    #[test]
    fn test_parse_rejects_wrong_oui() {
        let mut payload = make_request(true, true);
        payload[2] = 0x00;
        assert!(parse(&payload).is_err());
    }

    #[test]
    fn test_parse_rejects_dialog_token_zero() {
        let mut payload = make_request(true, true);
        payload[7] = 0;
        assert!(matches!(parse(&payload), Err(InviteError::Protocol(_))));
    }

    #[test]
    fn test_parse_rejects_truncated_attribute() {
        let mut hdr = BytesMut::new();
        attr::put_public_action_hdr(&mut hdr, SUBTYPE_INVITATION_REQ, 1);
        // Attribute claims 10 bytes but only 1 follows.
        let attrs = [attr_id::STATUS, 10, 0, 0];
        let mut out = BytesMut::from(&hdr[..]);
        attr::wrap_p2p_ie(&mut out, &attrs);
        assert!(parse(&out).is_err());
    }

    #[test]
    fn test_parse_rejects_duplicate_attribute() {
        let mut hdr = BytesMut::new();
        attr::put_public_action_hdr(&mut hdr, SUBTYPE_INVITATION_RESP, 1);
        let mut attrs = BytesMut::new();
        attr::put_status(&mut attrs, StatusCode::Success);
        attr::put_status(&mut attrs, StatusCode::Success);
        let mut out = BytesMut::from(&hdr[..]);
        attr::wrap_p2p_ie(&mut out, &attrs);
        assert!(parse(&out).is_err());
    }

    #[test]
    fn test_parse_skips_unknown_attribute() {
        let mut hdr = BytesMut::new();
        attr::put_public_action_hdr(&mut hdr, SUBTYPE_INVITATION_RESP, 1);
        let mut attrs = BytesMut::new();
        // Unknown attribute id 200 with a 3-byte body.
        attrs.put_u8(200);
        attrs.put_u16_le(3);
        attrs.put_slice(&[1, 2, 3]);
        attr::put_status(&mut attrs, StatusCode::Success);
        let mut out = BytesMut::from(&hdr[..]);
        attr::wrap_p2p_ie(&mut out, &attrs);

        let msg = parse(&out).unwrap();
        assert_eq!(msg.status, Some(StatusCode::Success));
    }

    #[test]
    fn test_parse_collects_trailing_vendor_elements() {
        let mut payload = make_request(true, true);
        // Append a non-P2P vendor IE.
        let extra = [IE_VENDOR, 5, 0x00, 0x50, 0xf2, 0x04, 0xaa];
        payload.extend_from_slice(&extra);

        let msg = parse(&payload).unwrap();
        assert_eq!(msg.vendor_ext.as_deref(), Some(&extra[..]));
    }

    #[test]
    fn test_parse_reassembles_fragmented_p2p_ie() {
        let mut hdr = BytesMut::new();
        attr::put_public_action_hdr(&mut hdr, SUBTYPE_INVITATION_REQ, 9);

        let mut attrs = BytesMut::new();
        attr::put_group_id(&mut attrs, MacAddr::ZERO, b"DIRECT-zz").unwrap();
        // Pad with a large unknown attribute to force fragmentation.
        attrs.put_u8(221);
        attrs.put_u16_le(300);
        attrs.put_slice(&[0u8; 300]);
        let set = ChannelSet::from_pairs(&[(81, 11)]);
        attr::put_channel_list(&mut attrs, *b"XX\x04", &set);

        let mut out = BytesMut::from(&hdr[..]);
        attr::wrap_p2p_ie(&mut out, &attrs);
        assert!(attrs.len() > attr::MAX_IE_BODY);

        let msg = parse(&out).unwrap();
        assert!(msg.group_id.is_some());
        assert!(msg.channel_list.unwrap().set.includes(81, 11));
    }

    #[test]
    fn test_parse_device_info() {
        let mut hdr = BytesMut::new();
        attr::put_public_action_hdr(&mut hdr, SUBTYPE_INVITATION_REQ, 2);
        let mut attrs = BytesMut::new();
        attr::put_device_info(
            &mut attrs,
            MacAddr::new([9, 8, 7, 6, 5, 4]),
            0x1188,
            [0, 1, 0, 0x50, 0xf2, 0x04, 0, 5],
            "kitchen-display",
        );
        let mut out = BytesMut::from(&hdr[..]);
        attr::wrap_p2p_ie(&mut out, &attrs);

        let info = parse(&out).unwrap().device_info.unwrap();
        assert_eq!(info.dev_addr, MacAddr::new([9, 8, 7, 6, 5, 4]));
        assert_eq!(info.config_methods, 0x1188);
        assert_eq!(info.device_name, "kitchen-display");
    }
}
