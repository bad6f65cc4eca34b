//! P2P Device Address - the 6-byte MAC identifying a peer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Length of a MAC address in bytes.
pub const MAC_LEN: usize = 6;

/// A 6-byte 802.11 device address.
///
/// Used both as the P2P Device Address identifying a peer and as a group
/// BSSID. The all-zero address is treated as "not set" in attribute bodies.
///
/// # Example
///
/// ```
/// use p2p_invite::addr::MacAddr;
///
/// let addr = MacAddr::new([0x02, 0x11, 0x22, 0x33, 0x44, 0x55]);
/// assert_eq!(addr.to_string(), "02:11:22:33:44:55");
/// assert!(!addr.is_zero());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MacAddr([u8; MAC_LEN]);

impl MacAddr {
    /// The all-zero address.
    pub const ZERO: MacAddr = MacAddr([0; MAC_LEN]);

    /// Create an address from raw bytes.
    pub const fn new(bytes: [u8; MAC_LEN]) -> Self {
        Self(bytes)
    }

    /// Create an address from a byte slice.
    ///
    /// Returns `None` if the slice is not exactly 6 bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; MAC_LEN] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    /// Get the raw bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; MAC_LEN] {
        &self.0
    }

    /// Check whether this is the all-zero address.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == [0; MAC_LEN]
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl From<[u8; MAC_LEN]> for MacAddr {
    fn from(bytes: [u8; MAC_LEN]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for MacAddr {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for MacAddr {
    type Err = String;

    /// Parse "aa:bb:cc:dd:ee:ff" notation.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; MAC_LEN];
        let mut parts = s.split(':');
        for byte in bytes.iter_mut() {
            let part = parts.next().ok_or_else(|| format!("bad MAC: {s}"))?;
            *byte = u8::from_str_radix(part, 16).map_err(|_| format!("bad MAC: {s}"))?;
        }
        if parts.next().is_some() {
            return Err(format!("bad MAC: {s}"));
        }
        Ok(Self(bytes))
    }
}
