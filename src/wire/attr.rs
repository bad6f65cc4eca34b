//! Low-level P2P attribute writers.
//!
//! Attributes are accumulated into a plain `BytesMut` body and wrapped into
//! vendor-specific IEs at the end with [`wrap_p2p_ie`]. Each attribute is
//! `id(1) length(2, little endian) body`; the wrapper splits the body across
//! multiple `0xDD` elements when it exceeds a single IE's 255-byte limit.

use bytes::{BufMut, BytesMut};

use super::{attr_id, StatusCode, ACTION_VENDOR_SPECIFIC, CATEGORY_PUBLIC_ACTION, IE_VENDOR,
            OUI_TYPE_P2P, WFA_OUI};
use crate::addr::MacAddr;
use crate::channels::ChannelSet;
use crate::error::{InviteError, Result};

/// Maximum number of attribute-body bytes carried by one vendor IE
/// (255 minus the 4-byte OUI + type prefix).
pub const MAX_IE_BODY: usize = 251;

/// WPS attribute id for Device Name, embedded inside Device Info.
const WPS_ATTR_DEVICE_NAME: u16 = 0x1011;

/// Append the public-action header up to and including the dialog token.
pub fn put_public_action_hdr(buf: &mut BytesMut, subtype: u8, dialog_token: u8) {
    buf.put_u8(CATEGORY_PUBLIC_ACTION);
    buf.put_u8(ACTION_VENDOR_SPECIFIC);
    buf.put_slice(&WFA_OUI);
    buf.put_u8(OUI_TYPE_P2P);
    buf.put_u8(subtype);
    buf.put_u8(dialog_token);
}

fn put_attr_hdr(buf: &mut BytesMut, id: u8, len: usize) {
    debug_assert!(len <= u16::MAX as usize);
    buf.put_u8(id);
    buf.put_u16_le(len as u16);
}

/// Status attribute.
pub fn put_status(buf: &mut BytesMut, status: StatusCode) {
    put_attr_hdr(buf, attr_id::STATUS, 1);
    buf.put_u8(status.as_u8());
}

/// Configuration Timeout attribute: GO and client timeouts in 10 ms units.
pub fn put_config_timeout(buf: &mut BytesMut, go_timeout: u8, client_timeout: u8) {
    put_attr_hdr(buf, attr_id::CONFIG_TIMEOUT, 2);
    buf.put_u8(go_timeout);
    buf.put_u8(client_timeout);
}

/// Invitation Flags attribute.
pub fn put_invitation_flags(buf: &mut BytesMut, flags: u8) {
    put_attr_hdr(buf, attr_id::INVITATION_FLAGS, 1);
    buf.put_u8(flags);
}

/// Operating Channel attribute: country string + (reg class, channel).
pub fn put_operating_channel(buf: &mut BytesMut, country: [u8; 3], reg_class: u8, channel: u8) {
    put_attr_hdr(buf, attr_id::OPERATING_CHANNEL, 5);
    buf.put_slice(&country);
    buf.put_u8(reg_class);
    buf.put_u8(channel);
}

/// P2P Group BSSID attribute.
pub fn put_group_bssid(buf: &mut BytesMut, bssid: MacAddr) {
    put_attr_hdr(buf, attr_id::GROUP_BSSID, 6);
    buf.put_slice(bssid.as_bytes());
}

/// Channel List attribute: country string + per-class channel runs.
pub fn put_channel_list(buf: &mut BytesMut, country: [u8; 3], channels: &ChannelSet) {
    let body_len = 3 + channels
        .groups()
        .iter()
        .map(|g| 2 + g.channels.len())
        .sum::<usize>();
    put_attr_hdr(buf, attr_id::CHANNEL_LIST, body_len);
    buf.put_slice(&country);
    for group in channels.groups() {
        buf.put_u8(group.reg_class);
        buf.put_u8(group.channels.len() as u8);
        buf.put_slice(&group.channels);
    }
}

/// P2P Group ID attribute: GO device address + SSID.
///
/// Rejects SSIDs longer than 32 bytes instead of overflowing the attribute.
pub fn put_group_id(buf: &mut BytesMut, go_dev_addr: MacAddr, ssid: &[u8]) -> Result<()> {
    if ssid.len() > 32 {
        return Err(InviteError::SsidTooLong(ssid.len()));
    }
    put_attr_hdr(buf, attr_id::GROUP_ID, 6 + ssid.len());
    buf.put_slice(go_dev_addr.as_bytes());
    buf.put_slice(ssid);
    Ok(())
}

/// P2P Device Info attribute: address, WSC config methods, primary device
/// type and the device name as an embedded WPS TLV.
pub fn put_device_info(
    buf: &mut BytesMut,
    dev_addr: MacAddr,
    config_methods: u16,
    pri_dev_type: [u8; 8],
    device_name: &str,
) {
    let name = device_name.as_bytes();
    let body_len = 6 + 2 + 8 + 1 + 4 + name.len();
    put_attr_hdr(buf, attr_id::DEVICE_INFO, body_len);
    buf.put_slice(dev_addr.as_bytes());
    buf.put_u16(config_methods);
    buf.put_slice(&pri_dev_type);
    buf.put_u8(0); // number of secondary device types
    buf.put_u16(WPS_ATTR_DEVICE_NAME);
    buf.put_u16(name.len() as u16);
    buf.put_slice(name);
}

/// Wrap an attribute body into one or more P2P vendor IEs and append them
/// to `out`.
pub fn wrap_p2p_ie(out: &mut BytesMut, attrs: &[u8]) {
    let mut rest = attrs;
    loop {
        let take = rest.len().min(MAX_IE_BODY);
        out.put_u8(IE_VENDOR);
        out.put_u8((4 + take) as u8);
        out.put_slice(&WFA_OUI);
        out.put_u8(OUI_TYPE_P2P);
        out.put_slice(&rest[..take]);
        rest = &rest[take..];
        if rest.is_empty() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_action_hdr() {
        let mut buf = BytesMut::new();
        put_public_action_hdr(&mut buf, super::super::SUBTYPE_INVITATION_REQ, 7);
        assert_eq!(&buf[..], &[0x04, 0x09, 0x50, 0x6f, 0x9a, 0x09, 3, 7]);
    }

    #[test]
    fn test_status_attr_layout() {
        let mut buf = BytesMut::new();
        put_status(&mut buf, StatusCode::FailNoCommonChannels);
        assert_eq!(&buf[..], &[attr_id::STATUS, 1, 0, 7]);
    }

    #[test]
    fn test_operating_channel_layout() {
        let mut buf = BytesMut::new();
        put_operating_channel(&mut buf, *b"XX\x04", 81, 6);
        assert_eq!(
            &buf[..],
            &[attr_id::OPERATING_CHANNEL, 5, 0, b'X', b'X', 0x04, 81, 6]
        );
    }

    #[test]
    fn test_channel_list_layout() {
        let mut buf = BytesMut::new();
        let set = ChannelSet::from_pairs(&[(81, 1), (81, 6), (115, 36)]);
        put_channel_list(&mut buf, *b"XX\x04", &set);
        assert_eq!(
            &buf[..],
            &[
                attr_id::CHANNEL_LIST,
                10,
                0,
                b'X',
                b'X',
                0x04,
                81,
                2,
                1,
                6,
                115,
                1,
                36
            ]
        );
    }

    #[test]
    fn test_group_id_rejects_long_ssid() {
        let mut buf = BytesMut::new();
        let result = put_group_id(&mut buf, MacAddr::ZERO, &[b'a'; 33]);
        assert!(matches!(result, Err(InviteError::SsidTooLong(33))));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_group_id_layout() {
        let mut buf = BytesMut::new();
        put_group_id(&mut buf, MacAddr::new([1, 2, 3, 4, 5, 6]), b"DIRECT-ab").unwrap();
        assert_eq!(buf[0], attr_id::GROUP_ID);
        assert_eq!(u16::from_le_bytes([buf[1], buf[2]]), 15);
        assert_eq!(&buf[3..9], &[1, 2, 3, 4, 5, 6]);
        assert_eq!(&buf[9..], b"DIRECT-ab");
    }

    #[test]
    fn test_device_info_embeds_wps_name() {
        let mut buf = BytesMut::new();
        put_device_info(&mut buf, MacAddr::ZERO, 0x0080, [0; 8], "unit");
        // id + len(2) + addr(6) + methods(2) + dev type(8) + num sec(1)
        let name_tlv = &buf[3 + 6 + 2 + 8 + 1..];
        assert_eq!(&name_tlv[..2], &0x1011u16.to_be_bytes());
        assert_eq!(&name_tlv[2..4], &4u16.to_be_bytes());
        assert_eq!(&name_tlv[4..], b"unit");
    }

    #[test]
    fn test_wrap_single_ie() {
        let mut out = BytesMut::new();
        wrap_p2p_ie(&mut out, &[0xaa; 10]);
        assert_eq!(out[0], IE_VENDOR);
        assert_eq!(out[1], 14);
        assert_eq!(&out[2..6], &[0x50, 0x6f, 0x9a, 0x09]);
        assert_eq!(out.len(), 16);
    }

    #[test]
    fn test_wrap_fragments_large_body() {
        let mut out = BytesMut::new();
        wrap_p2p_ie(&mut out, &[0xbb; MAX_IE_BODY + 20]);
        // First IE full, second carries the remainder.
        assert_eq!(out[1] as usize, 4 + MAX_IE_BODY);
        let second = &out[2 + 4 + MAX_IE_BODY..];
        assert_eq!(second[0], IE_VENDOR);
        assert_eq!(second[1], 24);
    }
}
