//! Outbound side of the bot.
//!
//! A connection implements [`ChannelOutbound`] (one line to one channel) and
//! [`JoinedChannels`] (which channels it currently sits in). [`ChannelRelay`]
//! builds fan-out and external-event delivery on top of those two seams.

pub mod error;
pub mod event;
pub mod gating;
pub mod outbound;
pub mod relay;

pub use {
    error::{Error, Result},
    event::OutboundEvent,
    outbound::{ChannelOutbound, JoinedChannels},
    relay::ChannelRelay,
};
