//! Operating-channel negotiation.
//!
//! Resolves the channel a (re)formed group will run on from the local
//! default, the peer's declared preference, the channel-set intersection and
//! an optional forced frequency, with a reselection fallback when the first
//! choice is not mutually supported.
//!
//! Fallback tiers, in order:
//! 1. A forced frequency (from the responder's policy hook) wins outright,
//!    but must be a member of the intersection.
//! 2. Start from the local default operating channel.
//! 3. Adopt the peer's declared operating-channel preference when it lies in
//!    the intersection and the peer is not flagged no-preferred-channel.
//! 4. If the pair is still not mutually supported, reselect a member of the
//!    intersection via the [`ReselectStrategy`].
//! 5. Otherwise, when the peer does not demand a fixed frequency and no
//!    operating channel was pinned in configuration, re-run reselection with
//!    the peer's channel set to look for a better match; `None` from the
//!    strategy keeps the already valid pair.

use tracing::debug;

use crate::channels::{channel_to_freq, freq_to_channel, ChannelSet};
use crate::config::Config;
use crate::error::{InviteError, Result};

/// The outcome of channel negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedChannel {
    /// Regulatory class of the operating channel.
    pub reg_class: u8,
    /// Channel number.
    pub channel: u8,
    /// The channel's frequency in MHz.
    pub freq: u32,
}

/// Strategy for picking an operating channel out of the intersection.
///
/// Called in two situations: with `current == None` when the tentative
/// channel is not mutually supported and a member of the intersection *must*
/// be found, and with `current == Some(pair)` when `pair` is already valid
/// and the strategy may return a better match or `None` to keep it.
/// Implementations must only return members of `intersection`.
pub trait ReselectStrategy: Send {
    /// Pick a (reg class, channel) pair from `intersection`.
    ///
    /// `peer_order` is the peer's declared channel list when known;
    /// `local_order` is the local configured list.
    fn reselect(
        &self,
        intersection: &ChannelSet,
        peer_order: Option<&ChannelSet>,
        local_order: &ChannelSet,
        current: Option<(u8, u8)>,
    ) -> Option<(u8, u8)>;
}

/// Default strategy.
///
/// When a pick is mandatory (`current == None`): first pair of the peer's
/// declared order that is in the intersection, else first of the local
/// order, else the intersection's first member. When the current pair is
/// already valid, the only "better match" offered is an upgrade from a
/// 2.4 GHz channel to a mutually supported 5 GHz one, peer order first.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferPeerOrder;

/// 5 GHz regulatory classes this crate knows about.
const CLASSES_5GHZ: [u8; 2] = [115, 124];

impl ReselectStrategy for PreferPeerOrder {
    fn reselect(
        &self,
        intersection: &ChannelSet,
        peer_order: Option<&ChannelSet>,
        local_order: &ChannelSet,
        current: Option<(u8, u8)>,
    ) -> Option<(u8, u8)> {
        if let Some((reg_class, _)) = current {
            if CLASSES_5GHZ.contains(&reg_class) {
                return None;
            }
            return peer_order
                .into_iter()
                .chain(std::iter::once(local_order))
                .flat_map(|set| set.iter())
                .find(|&(rc, ch)| CLASSES_5GHZ.contains(&rc) && intersection.includes(rc, ch));
        }

        if let Some(peer) = peer_order {
            if let Some(pair) = peer
                .iter()
                .find(|&(rc, ch)| intersection.includes(rc, ch))
            {
                return Some(pair);
            }
        }
        local_order
            .iter()
            .find(|&(rc, ch)| intersection.includes(rc, ch))
            .or_else(|| intersection.iter().next())
    }
}

/// Inputs describing the peer's side of the negotiation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeerChannelInfo<'a> {
    /// The peer's Operating Channel attribute, when it sent one.
    pub preferred: Option<(u8, u8)>,
    /// The peer's declared channel set, for reselection preference order.
    pub channels: Option<&'a ChannelSet>,
    /// Peer demands a fixed operating frequency.
    pub force_freq: bool,
    /// Peer was flagged as having no channel preference we should honor.
    pub no_pref_chan: bool,
}

/// Resolve the operating channel for a (re)formed group.
///
/// Fails with [`InviteError::NoCommonChannels`] when the intersection offers
/// nothing usable or a forced frequency lies outside it.
pub fn select_operating_channel(
    cfg: &Config,
    peer: PeerChannelInfo<'_>,
    intersection: &ChannelSet,
    forced_freq: Option<u32>,
    strategy: &dyn ReselectStrategy,
) -> Result<SelectedChannel> {
    if let Some(freq) = forced_freq {
        debug!(freq, "invitation processing forced a frequency");
        let (reg_class, channel) = freq_to_channel(freq)?;
        if !intersection.includes(reg_class, channel) {
            debug!(freq, "forced frequency not in the channel intersection");
            return Err(InviteError::NoCommonChannels);
        }
        return Ok(SelectedChannel {
            reg_class,
            channel,
            freq,
        });
    }

    // Default to our own configuration as a starting point.
    let mut reg_class = cfg.op_reg_class;
    let mut channel = cfg.op_channel;
    debug!(reg_class, channel, "own default operating channel");

    if let Some((pref_class, pref_channel)) = peer.preferred {
        if !peer.no_pref_chan && intersection.includes(pref_class, pref_channel) {
            reg_class = pref_class;
            channel = pref_channel;
            debug!(reg_class, channel, "using peer operating channel preference");
        } else {
            debug!("cannot use peer channel preference");
        }
    }

    if !intersection.includes(reg_class, channel) {
        debug!(
            reg_class,
            channel, "selected channel not in intersection, reselecting"
        );
        let (new_class, new_channel) = strategy
            .reselect(intersection, peer.channels, &cfg.channels, None)
            .ok_or(InviteError::NoCommonChannels)?;
        if !intersection.includes(new_class, new_channel) {
            debug!(
                reg_class = new_class,
                channel = new_channel,
                "peer does not support reselected operating channel"
            );
            return Err(InviteError::NoCommonChannels);
        }
        reg_class = new_class;
        channel = new_channel;
        debug!(reg_class, channel, "reselection result");
    } else if !peer.force_freq && !cfg.cfg_op_channel {
        // The pair is already valid; look for a better match now that the
        // peer's channel set is known. Keep the valid pair otherwise.
        if let Some((new_class, new_channel)) = strategy.reselect(
            intersection,
            peer.channels,
            &cfg.channels,
            Some((reg_class, channel)),
        ) {
            if intersection.includes(new_class, new_channel) {
                reg_class = new_class;
                channel = new_channel;
                debug!(reg_class, channel, "reselected with peer channel information");
            }
        }
    }

    let freq = channel_to_freq(reg_class, channel).map_err(|_| {
        debug!(reg_class, channel, "no frequency known for operating channel");
        InviteError::NoCommonChannels
    })?;
    debug!(freq, "selected operating channel");
    Ok(SelectedChannel {
        reg_class,
        channel,
        freq,
    })
}
