//! Inbound webhook intake.
//!
//! GitHub deliveries are verified, normalized into [`OutboundEvent`]s and
//! relayed to every connected chat session.
//!
//! [`OutboundEvent`]: zbot_channels::OutboundEvent

pub mod error;
pub mod normalize;
pub mod server;
pub mod signature;

pub use {
    error::{Error, Result},
    normalize::EventNormalizer,
    server::{WebhookState, build_app, serve},
};
