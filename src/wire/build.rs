//! Invitation Request / Response payload builders.
//!
//! Builders lay attributes out in a fixed order:
//! Configuration Timeout, Invitation Flags, Operating Channel, Group BSSID,
//! Channel List, Group ID, Device Info for requests; Status, Configuration
//! Timeout, Operating Channel, Group BSSID, Channel List for responses.
//! Both are deterministic: identical inputs yield identical payloads.

use bytes::{BufMut, Bytes, BytesMut};

use super::{attr, invitation_flags, StatusCode, SUBTYPE_INVITATION_REQ, SUBTYPE_INVITATION_RESP};
use crate::addr::MacAddr;
use crate::channels::ChannelSet;
use crate::config::Config;
use crate::error::Result;
use crate::peer::{flags, PeerDevice};

/// Role the initiator will take in the (re)formed group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteRole {
    /// Inviting into a group we already run.
    ActiveGo,
    /// We will become GO of the reinvoked persistent group.
    Go,
    /// We will join as a client.
    Client,
}

/// Build an Invitation Request payload.
///
/// Advances the peer's dialog token (wrapping 255 -> 1, never 0) and encodes
/// the request attributes. The Operating Channel attribute is omitted only
/// when inviting as a client a peer flagged `NO_PREF_CHAN`; the Group ID
/// device address is the explicit GO address when given, else the peer's
/// address for client role, else our own.
pub fn build_invitation_req(
    cfg: &Config,
    peer: &mut PeerDevice,
    role: InviteRole,
    persistent: bool,
    bssid: Option<MacAddr>,
    ssid: &[u8],
    go_dev_addr: Option<MacAddr>,
) -> Result<Bytes> {
    let dialog_token = peer.next_dialog_token();

    let mut attrs = BytesMut::with_capacity(256);
    if role == InviteRole::ActiveGo || !persistent {
        attr::put_config_timeout(&mut attrs, 0, 0);
    } else {
        attr::put_config_timeout(&mut attrs, cfg.go_timeout, cfg.client_timeout);
    }
    attr::put_invitation_flags(
        &mut attrs,
        if persistent {
            invitation_flags::TYPE_PERSISTENT
        } else {
            0
        },
    );
    if role != InviteRole::Client || !peer.has_flag(flags::NO_PREF_CHAN) {
        attr::put_operating_channel(&mut attrs, cfg.country, cfg.op_reg_class, cfg.op_channel);
    }
    if let Some(bssid) = bssid {
        attr::put_group_bssid(&mut attrs, bssid);
    }
    attr::put_channel_list(&mut attrs, cfg.country, &cfg.channels);
    let group_dev_addr = match go_dev_addr {
        Some(addr) => addr,
        None if role == InviteRole::Client => peer.addr,
        None => cfg.dev_addr,
    };
    attr::put_group_id(&mut attrs, group_dev_addr, ssid)?;
    attr::put_device_info(
        &mut attrs,
        cfg.dev_addr,
        cfg.config_methods,
        cfg.pri_dev_type,
        &cfg.device_name,
    );

    let mut buf = BytesMut::with_capacity(attrs.len() + 32);
    attr::put_public_action_hdr(&mut buf, SUBTYPE_INVITATION_REQ, dialog_token);
    attr::wrap_p2p_ie(&mut buf, &attrs);
    if let Some(extra) = &cfg.vendor_ext {
        buf.put_slice(extra);
    }
    Ok(buf.freeze())
}

/// Build an Invitation Response payload.
///
/// The dialog token always echoes the request's token. Status is always
/// encoded; the Operating Channel attribute appears only when both
/// `reg_class` and `channel` are non-zero, the Group BSSID and Channel List
/// attributes only when supplied.
pub fn build_invitation_resp(
    cfg: &Config,
    dialog_token: u8,
    status: StatusCode,
    group_bssid: Option<MacAddr>,
    reg_class: u8,
    channel: u8,
    channels: Option<&ChannelSet>,
) -> Bytes {
    let mut attrs = BytesMut::with_capacity(128);
    attr::put_status(&mut attrs, status);
    attr::put_config_timeout(&mut attrs, 0, 0);
    if reg_class != 0 && channel != 0 {
        attr::put_operating_channel(&mut attrs, cfg.country, reg_class, channel);
    }
    if let Some(bssid) = group_bssid {
        attr::put_group_bssid(&mut attrs, bssid);
    }
    if let Some(channels) = channels {
        attr::put_channel_list(&mut attrs, cfg.country, channels);
    }

    let mut buf = BytesMut::with_capacity(attrs.len() + 32);
    attr::put_public_action_hdr(&mut buf, SUBTYPE_INVITATION_RESP, dialog_token);
    attr::wrap_p2p_ie(&mut buf, &attrs);
    if let Some(extra) = &cfg.vendor_ext {
        buf.put_slice(extra);
    }
    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::message::{parse, FrameKind};

    fn test_config() -> Config {
        Config {
            dev_addr: MacAddr::new([2, 0, 0, 0, 0, 1]),
            device_name: "unit".into(),
            ..Config::default()
        }
    }

    fn test_peer() -> PeerDevice {
        PeerDevice::new(MacAddr::new([2, 0, 0, 0, 0, 2]))
    }

    #[test]
    fn test_request_roundtrips_through_parser() {
        let cfg = test_config();
        let mut peer = test_peer();
        let payload = build_invitation_req(
            &cfg,
            &mut peer,
            InviteRole::Go,
            true,
            Some(MacAddr::new([2, 0, 0, 0, 0, 9])),
            b"DIRECT-ab",
            None,
        )
        .unwrap();

        let msg = parse(&payload).unwrap();
        assert_eq!(msg.kind, FrameKind::Request);
        assert_eq!(msg.dialog_token, 1);
        assert_eq!(msg.persistent_flag(), Some(true));
        assert_eq!(msg.config_timeout, Some((cfg.go_timeout, cfg.client_timeout)));
        assert_eq!(msg.group_bssid, Some(MacAddr::new([2, 0, 0, 0, 0, 9])));
        assert_eq!(msg.group_id.as_ref().unwrap().go_dev_addr, cfg.dev_addr);
        assert!(msg.channel_list.unwrap().set.includes(81, 6));
        assert_eq!(msg.device_info.unwrap().device_name, "unit");
    }

    #[test]
    fn test_request_dialog_token_advances_per_request() {
        let cfg = test_config();
        let mut peer = test_peer();
        for expected in 1..=4u8 {
            let payload =
                build_invitation_req(&cfg, &mut peer, InviteRole::Go, true, None, b"x", None)
                    .unwrap();
            assert_eq!(parse(&payload).unwrap().dialog_token, expected);
        }
    }

    #[test]
    fn test_request_active_go_zeroes_config_timeout() {
        let cfg = test_config();
        let mut peer = test_peer();
        let payload =
            build_invitation_req(&cfg, &mut peer, InviteRole::ActiveGo, true, None, b"x", None)
                .unwrap();
        assert_eq!(parse(&payload).unwrap().config_timeout, Some((0, 0)));

        let payload =
            build_invitation_req(&cfg, &mut peer, InviteRole::Go, false, None, b"x", None)
                .unwrap();
        assert_eq!(parse(&payload).unwrap().config_timeout, Some((0, 0)));
    }

    #[test]
    fn test_request_omits_operating_channel_for_no_pref_client() {
        let cfg = test_config();
        let mut peer = test_peer();
        peer.flags |= flags::NO_PREF_CHAN;

        let payload =
            build_invitation_req(&cfg, &mut peer, InviteRole::Client, true, None, b"x", None)
                .unwrap();
        assert!(parse(&payload).unwrap().operating_channel.is_none());

        // Any other role still includes it.
        let payload =
            build_invitation_req(&cfg, &mut peer, InviteRole::Go, true, None, b"x", None)
                .unwrap();
        assert!(parse(&payload).unwrap().operating_channel.is_some());
    }

    #[test]
    fn test_request_group_id_address_selection() {
        let cfg = test_config();
        let mut peer = test_peer();
        let explicit = MacAddr::new([2, 0, 0, 0, 0, 7]);

        let payload = build_invitation_req(
            &cfg,
            &mut peer,
            InviteRole::Go,
            true,
            None,
            b"x",
            Some(explicit),
        )
        .unwrap();
        assert_eq!(parse(&payload).unwrap().group_id.unwrap().go_dev_addr, explicit);

        let payload =
            build_invitation_req(&cfg, &mut peer, InviteRole::Client, true, None, b"x", None)
                .unwrap();
        assert_eq!(parse(&payload).unwrap().group_id.unwrap().go_dev_addr, peer.addr);
    }

    #[test]
    fn test_request_rejects_oversize_ssid() {
        let cfg = test_config();
        let mut peer = test_peer();
        let ssid = [b'a'; 33];
        assert!(
            build_invitation_req(&cfg, &mut peer, InviteRole::Go, true, None, &ssid, None)
                .is_err()
        );
    }

    #[test]
    fn test_request_appends_vendor_ext() {
        let mut cfg = test_config();
        let extra = vec![0xdd, 3, 1, 2, 3];
        cfg.vendor_ext = Some(extra.clone());
        let mut peer = test_peer();

        let payload =
            build_invitation_req(&cfg, &mut peer, InviteRole::Go, true, None, b"x", None)
                .unwrap();
        assert!(payload.ends_with(&extra));
    }

    #[test]
    fn test_response_deterministic() {
        let cfg = test_config();
        let channels = ChannelSet::from_pairs(&[(81, 6), (81, 11)]);
        let a = build_invitation_resp(
            &cfg,
            9,
            StatusCode::Success,
            Some(MacAddr::new([1, 2, 3, 4, 5, 6])),
            81,
            6,
            Some(&channels),
        );
        let b = build_invitation_resp(
            &cfg,
            9,
            StatusCode::Success,
            Some(MacAddr::new([1, 2, 3, 4, 5, 6])),
            81,
            6,
            Some(&channels),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_response_echoes_dialog_token() {
        let cfg = test_config();
        let payload = build_invitation_resp(&cfg, 200, StatusCode::Success, None, 81, 6, None);
        assert_eq!(parse(&payload).unwrap().dialog_token, 200);
    }

    #[test]
    fn test_response_omits_operating_channel_when_zero() {
        let cfg = test_config();
        for (reg_class, channel) in [(0u8, 6u8), (81, 0), (0, 0)] {
            let payload = build_invitation_resp(
                &cfg,
                1,
                StatusCode::FailNoCommonChannels,
                None,
                reg_class,
                channel,
                None,
            );
            let msg = parse(&payload).unwrap();
            assert!(msg.operating_channel.is_none());
            assert!(msg.channel_list.is_none());
            assert!(msg.group_bssid.is_none());
        }

        let payload = build_invitation_resp(&cfg, 1, StatusCode::Success, None, 81, 6, None);
        let oc = parse(&payload).unwrap().operating_channel.unwrap();
        assert_eq!((oc.reg_class, oc.channel), (81, 6));
    }

    #[test]
    fn test_response_status_always_present() {
        let cfg = test_config();
        let payload =
            build_invitation_resp(&cfg, 1, StatusCode::FailInvalidParams, None, 0, 0, None);
        let msg = parse(&payload).unwrap();
        assert_eq!(msg.kind, FrameKind::Response);
        assert_eq!(msg.status, Some(StatusCode::FailInvalidParams));
    }
}
