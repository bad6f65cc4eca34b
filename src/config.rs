//! Local device configuration for the invitation core.

use serde::{Deserialize, Serialize};

use crate::addr::MacAddr;
use crate::channels::ChannelSet;

/// Configuration of the local P2P device.
///
/// One `Config` per P2P interface. Mirrors the pieces of device state the
/// invitation procedure reads: identity, supported channels, the default
/// operating channel and the listen channel used as a last-resort reply
/// frequency.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Own P2P Device Address.
    pub dev_addr: MacAddr,
    /// Country string: two ASCII letters plus the operating-class table
    /// indicator (0x04 = global table).
    pub country: [u8; 3],
    /// Channels this device supports, in preference order.
    pub channels: ChannelSet,
    /// Default operating regulatory class.
    pub op_reg_class: u8,
    /// Default operating channel.
    pub op_channel: u8,
    /// True when the operating channel was explicitly configured and must
    /// not be second-guessed by reselection.
    pub cfg_op_channel: bool,
    /// Listen channel regulatory class (reply-frequency fallback).
    pub listen_reg_class: u8,
    /// Listen channel number.
    pub listen_channel: u8,
    /// GO configuration timeout in 10 ms units, sent for persistent invites.
    pub go_timeout: u8,
    /// Client configuration timeout in 10 ms units.
    pub client_timeout: u8,
    /// Reject responses missing a Channel List instead of falling back to
    /// the locally stored channel set.
    pub strict: bool,
    /// Friendly device name carried in Device Info.
    pub device_name: String,
    /// WSC config methods bitmap carried in Device Info.
    pub config_methods: u16,
    /// Primary device type carried in Device Info.
    pub pri_dev_type: [u8; 8],
    /// Extra vendor elements (e.g. Wi-Fi Display subelements) appended
    /// verbatim to outgoing invitation frames.
    pub vendor_ext: Option<Vec<u8>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dev_addr: MacAddr::ZERO,
            country: *b"XX\x04",
            channels: ChannelSet::from_pairs(&[(81, 1), (81, 6), (81, 11)]),
            op_reg_class: 81,
            op_channel: 11,
            cfg_op_channel: false,
            listen_reg_class: 81,
            listen_channel: 6,
            go_timeout: 100,
            client_timeout: 20,
            strict: false,
            device_name: String::new(),
            config_methods: 0,
            pri_dev_type: [0; 8],
            vendor_ext: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_channels_sane() {
        let cfg = Config::default();
        assert!(cfg.channels.includes(cfg.op_reg_class, cfg.op_channel));
        assert!(cfg.channels.includes(cfg.listen_reg_class, cfg.listen_channel));
        assert!(!cfg.cfg_op_channel);
    }
}
