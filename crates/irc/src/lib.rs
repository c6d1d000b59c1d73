//! IRC connection session.
//!
//! One [`IrcSession`] per configured server: registration, keepalive,
//! channel membership tracking, and delivery of channel messages to the
//! dispatcher. Outbound lines share one writer through [`IrcOutbound`].

pub mod error;
pub mod message;
pub mod outbound;
pub mod session;
pub mod state;

pub use {
    error::{Error, Result},
    message::IrcMessage,
    outbound::IrcOutbound,
    session::{IrcSession, start_session},
    state::JoinedChannelList,
};
