use async_trait::async_trait;

use crate::Result;

/// Send one line of text to one channel.
///
/// Implementations must serialize concurrent callers so that two lines never
/// interleave within a single write.
#[async_trait]
pub trait ChannelOutbound: Send + Sync {
    async fn send_text(&self, to: &str, text: &str) -> Result<()>;
}

/// Read-only view of the channels a connection is currently joined to.
///
/// The connection owns and mutates the list; everything else only reads it.
pub trait JoinedChannels: Send + Sync {
    fn joined_channels(&self) -> Vec<String>;
}
