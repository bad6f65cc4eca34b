//! Peer device records and the per-interface peer table.

use std::collections::HashMap;

use crate::addr::MacAddr;
use crate::channels::ChannelSet;

/// Default maximum number of tracked peers.
pub const DEFAULT_MAX_PEERS: usize = 128;

/// Per-peer state flags.
pub mod flags {
    /// Peer demanded a fixed operating frequency.
    pub const FORCE_FREQ: u8 = 0b0000_0001;
    /// Do not send our operating-channel preference to this peer.
    pub const NO_PREF_CHAN: u8 = 0b0000_0010;
    /// Peer is only known as a client of some group.
    pub const GROUP_CLIENT_ONLY: u8 = 0b0000_0100;
    /// Record was created from a probe request only; not a fully
    /// discovered device.
    pub const PROBE_REQ_ONLY: u8 = 0b0000_1000;

    /// Check if a specific flag is set.
    #[inline]
    pub fn has_flag(flags: u8, flag: u8) -> bool {
        flags & flag != 0
    }
}

/// Device capability bits (subset relevant to invitations).
pub mod dev_capab {
    /// Client discoverability: the device can be reached through its GO
    /// while operating as a group client.
    pub const CLIENT_DISCOVERABILITY: u8 = 0b0000_0010;
}

/// Everything the invitation procedure tracks about one peer.
#[derive(Debug, Clone)]
pub struct PeerDevice {
    /// P2P Device Address.
    pub addr: MacAddr,
    /// Frequency the peer was last heard listening on, in MHz.
    pub listen_freq: Option<u32>,
    /// Operating frequency of the peer's group, if it runs one.
    pub oper_freq: Option<u32>,
    /// Channels the peer declared support for.
    pub channels: ChannelSet,
    /// State flags (see [`flags`]).
    pub flags: u8,
    /// Device capability bitmap from the peer's Device Info.
    pub dev_capab: u8,
    /// Last dialog token used towards this peer (1..=255, never 0).
    pub dialog_token: u8,
    /// Invitation Requests transmitted to this peer since the last
    /// `invite()`; upper layers use it to cap their retry loops.
    pub invitation_reqs: u32,
}

impl PeerDevice {
    /// Create a fresh record for a device address.
    pub fn new(addr: MacAddr) -> Self {
        Self {
            addr,
            listen_freq: None,
            oper_freq: None,
            channels: ChannelSet::new(),
            flags: 0,
            dev_capab: 0,
            dialog_token: 0,
            invitation_reqs: 0,
        }
    }

    /// Advance and return the dialog token for the next exchange.
    ///
    /// Wraps 255 -> 1; the value 0 is reserved and skipped.
    pub fn next_dialog_token(&mut self) -> u8 {
        self.dialog_token = self.dialog_token.wrapping_add(1);
        if self.dialog_token == 0 {
            self.dialog_token = 1;
        }
        self.dialog_token
    }

    /// Check a state flag.
    #[inline]
    pub fn has_flag(&self, flag: u8) -> bool {
        flags::has_flag(self.flags, flag)
    }

    /// The frequency to transmit an Invitation Request on: the peer's
    /// listen frequency, else its group's operating frequency.
    pub fn invite_freq(&self) -> Option<u32> {
        self.listen_freq.or(self.oper_freq)
    }
}

/// Table of known peers, keyed by device address.
pub struct PeerTable {
    peers: HashMap<MacAddr, PeerDevice>,
    max_peers: usize,
}

impl PeerTable {
    /// Create an empty table with the default size limit.
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_MAX_PEERS)
    }

    /// Create an empty table holding at most `max_peers` records.
    pub fn with_limit(max_peers: usize) -> Self {
        Self {
            peers: HashMap::new(),
            max_peers,
        }
    }

    /// Look up a peer.
    pub fn get(&self, addr: &MacAddr) -> Option<&PeerDevice> {
        self.peers.get(addr)
    }

    /// Look up a peer for mutation.
    pub fn get_mut(&mut self, addr: &MacAddr) -> Option<&mut PeerDevice> {
        self.peers.get_mut(addr)
    }

    /// Insert or replace a peer record.
    pub fn insert(&mut self, peer: PeerDevice) -> Option<&mut PeerDevice> {
        if !self.peers.contains_key(&peer.addr) && self.peers.len() >= self.max_peers {
            return None;
        }
        let addr = peer.addr;
        self.peers.insert(addr, peer);
        self.peers.get_mut(&addr)
    }

    /// Add a minimal record for a previously unknown device.
    ///
    /// Returns `None` when the table is full, which the responder maps to
    /// `FailInfoCurrentlyUnavailable`.
    pub fn add_unknown(&mut self, addr: MacAddr, rx_freq: u32) -> Option<&mut PeerDevice> {
        if let Some(existing) = self.peers.get_mut(&addr) {
            // Upgrade a probe-only record into a real one.
            existing.flags &= !flags::PROBE_REQ_ONLY;
            if rx_freq > 0 {
                existing.listen_freq = Some(rx_freq);
            }
            return self.peers.get_mut(&addr);
        }
        if self.peers.len() >= self.max_peers {
            return None;
        }
        let mut peer = PeerDevice::new(addr);
        if rx_freq > 0 {
            peer.listen_freq = Some(rx_freq);
        }
        self.peers.insert(addr, peer);
        self.peers.get_mut(&addr)
    }

    /// Number of tracked peers.
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

impl Default for PeerTable {
    fn default() -> Self {
        Self::new()
    }
}
