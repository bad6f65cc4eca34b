//! Channel sets and regulatory-class / frequency conversion.
//!
//! A [`ChannelSet`] is an ordered collection of (regulatory class, channel
//! number) pairs, grouped per class the way the Channel List attribute lays
//! them out on the wire. Order is preserved because it doubles as the
//! device's preference order during channel reselection.

use serde::{Deserialize, Serialize};

use crate::error::{InviteError, Result};

/// Channels belonging to one regulatory class, in preference order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegClassChannels {
    /// Regulatory (operating) class.
    pub reg_class: u8,
    /// Channel numbers within the class.
    pub channels: Vec<u8>,
}

/// Ordered set of (regulatory class, channel) pairs.
///
/// # Example
///
/// ```
/// use p2p_invite::channels::ChannelSet;
///
/// let own = ChannelSet::from_pairs(&[(81, 1), (81, 6), (81, 11)]);
/// let peer = ChannelSet::from_pairs(&[(81, 6), (81, 11), (115, 36)]);
/// let common = own.intersect(&peer);
///
/// assert!(common.includes(81, 6));
/// assert!(!common.includes(115, 36));
/// assert_eq!(common.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSet {
    classes: Vec<RegClassChannels>,
}

impl ChannelSet {
    /// Create an empty channel set.
    pub fn new() -> Self {
        Self { classes: Vec::new() }
    }

    /// Build a set from (reg class, channel) pairs, preserving order.
    pub fn from_pairs(pairs: &[(u8, u8)]) -> Self {
        let mut set = Self::new();
        for &(reg_class, channel) in pairs {
            set.push(reg_class, channel);
        }
        set
    }

    /// Append a (reg class, channel) pair, keeping per-class grouping.
    ///
    /// Duplicates are ignored.
    pub fn push(&mut self, reg_class: u8, channel: u8) {
        if self.includes(reg_class, channel) {
            return;
        }
        if let Some(entry) = self.classes.iter_mut().find(|c| c.reg_class == reg_class) {
            entry.channels.push(channel);
        } else {
            self.classes.push(RegClassChannels {
                reg_class,
                channels: vec![channel],
            });
        }
    }

    /// Membership test for a (reg class, channel) pair.
    pub fn includes(&self, reg_class: u8, channel: u8) -> bool {
        self.classes
            .iter()
            .any(|c| c.reg_class == reg_class && c.channels.contains(&channel))
    }

    /// Pairwise intersection.
    ///
    /// Keeps `self`'s ordering, so `a.intersect(&b)` and `b.intersect(&a)`
    /// contain the same pairs (commutative as sets) even though the listing
    /// order follows the receiver.
    pub fn intersect(&self, other: &ChannelSet) -> ChannelSet {
        let mut out = ChannelSet::new();
        for (reg_class, channel) in self.iter() {
            if other.includes(reg_class, channel) {
                out.push(reg_class, channel);
            }
        }
        out
    }

    /// Iterate all (reg class, channel) pairs in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.classes
            .iter()
            .flat_map(|c| c.channels.iter().map(move |&ch| (c.reg_class, ch)))
    }

    /// Iterate the per-class groups (the wire layout of the attribute).
    pub fn groups(&self) -> &[RegClassChannels] {
        &self.classes
    }

    /// Total number of (reg class, channel) pairs.
    pub fn len(&self) -> usize {
        self.classes.iter().map(|c| c.channels.len()).sum()
    }

    /// Check if the set contains no channels.
    pub fn is_empty(&self) -> bool {
        self.classes.iter().all(|c| c.channels.is_empty())
    }
}

/// Supported regulatory classes: (class, valid channels, base freq in MHz).
///
/// Subset of the global operating class table covering 2.4 GHz and the
/// common 5 GHz P2P classes.
const REG_CLASSES: &[(u8, &[u8], u32)] = &[
    (81, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13], 2407),
    (82, &[14], 2414),
    (115, &[36, 40, 44, 48], 5000),
    (124, &[149, 153, 157, 161], 5000),
];

/// Convert a (reg class, channel) pair to a frequency in MHz.
pub fn channel_to_freq(reg_class: u8, channel: u8) -> Result<u32> {
    for &(class, channels, base) in REG_CLASSES {
        if class == reg_class && channels.contains(&channel) {
            return Ok(base + 5 * channel as u32);
        }
    }
    Err(InviteError::UnknownChannel { reg_class, channel })
}

/// Convert a frequency in MHz to its (reg class, channel) pair.
pub fn freq_to_channel(freq: u32) -> Result<(u8, u8)> {
    for &(class, channels, base) in REG_CLASSES {
        for &channel in channels {
            if base + 5 * channel as u32 == freq {
                return Ok((class, channel));
            }
        }
    }
    Err(InviteError::UnknownFrequency(freq))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_groups_by_class() {
        let mut set = ChannelSet::new();
        set.push(81, 1);
        set.push(115, 36);
        set.push(81, 6);

        assert_eq!(set.groups().len(), 2);
        assert_eq!(set.groups()[0].channels, vec![1, 6]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_push_ignores_duplicates() {
        let mut set = ChannelSet::from_pairs(&[(81, 1), (81, 1), (81, 1)]);
        set.push(81, 1);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_includes() {
        let set = ChannelSet::from_pairs(&[(81, 1), (124, 149)]);
        assert!(set.includes(81, 1));
        assert!(set.includes(124, 149));
        assert!(!set.includes(81, 149));
        assert!(!set.includes(124, 1));
    }

    #[test]
    fn test_intersect_commutative() {
        let a = ChannelSet::from_pairs(&[(81, 1), (81, 6), (81, 11), (115, 36)]);
        let b = ChannelSet::from_pairs(&[(115, 36), (81, 11), (81, 3)]);

        let ab = a.intersect(&b);
        let ba = b.intersect(&a);

        let mut ab_pairs: Vec<_> = ab.iter().collect();
        let mut ba_pairs: Vec<_> = ba.iter().collect();
        ab_pairs.sort_unstable();
        ba_pairs.sort_unstable();
        assert_eq!(ab_pairs, ba_pairs);
        assert_eq!(ab_pairs, vec![(81, 11), (115, 36)]);
    }

    #[test]
    fn test_intersect_associative() {
        let a = ChannelSet::from_pairs(&[(81, 1), (81, 6), (81, 11)]);
        let b = ChannelSet::from_pairs(&[(81, 6), (81, 11), (124, 149)]);
        let c = ChannelSet::from_pairs(&[(81, 11), (81, 6), (81, 1)]);

        let left = a.intersect(&b).intersect(&c);
        let right = a.intersect(&b.intersect(&c));

        let mut l: Vec<_> = left.iter().collect();
        let mut r: Vec<_> = right.iter().collect();
        l.sort_unstable();
        r.sort_unstable();
        assert_eq!(l, r);
    }

    #[test]
    fn test_intersect_empty() {
        let a = ChannelSet::from_pairs(&[(81, 1), (81, 6), (81, 11)]);
        let b = ChannelSet::from_pairs(&[(81, 3)]);
        assert!(a.intersect(&b).is_empty());
        assert!(a.intersect(&ChannelSet::new()).is_empty());
    }

    #[test]
    fn test_channel_to_freq_24ghz() {
        assert_eq!(channel_to_freq(81, 1).unwrap(), 2412);
        assert_eq!(channel_to_freq(81, 6).unwrap(), 2437);
        assert_eq!(channel_to_freq(81, 11).unwrap(), 2462);
        assert_eq!(channel_to_freq(82, 14).unwrap(), 2484);
    }

    #[test]
    fn test_channel_to_freq_5ghz() {
        assert_eq!(channel_to_freq(115, 36).unwrap(), 5180);
        assert_eq!(channel_to_freq(124, 149).unwrap(), 5745);
    }

    #[test]
    fn test_channel_to_freq_rejects_out_of_class() {
        assert!(channel_to_freq(81, 14).is_err());
        assert!(channel_to_freq(115, 149).is_err());
        assert!(channel_to_freq(0, 0).is_err());
    }

    #[test]
    fn test_freq_to_channel() {
        assert_eq!(freq_to_channel(2412).unwrap(), (81, 1));
        assert_eq!(freq_to_channel(2484).unwrap(), (82, 14));
        assert_eq!(freq_to_channel(5180).unwrap(), (115, 36));
        assert_eq!(freq_to_channel(5805).unwrap(), (124, 161));
        assert!(freq_to_channel(5999).is_err());
    }

    #[test]
    fn test_freq_channel_roundtrip() {
        for &(class, channels, _) in REG_CLASSES {
            for &ch in channels {
                let freq = channel_to_freq(class, ch).unwrap();
                assert_eq!(freq_to_channel(freq).unwrap(), (class, ch));
            }
        }
    }
}
