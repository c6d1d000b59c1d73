use std::sync::RwLock;

use zbot_channels::JoinedChannels;

/// Channels the session currently sits in, in join order.
///
/// Only the session mutates this; the relay reads it through
/// [`JoinedChannels`].
#[derive(Debug, Default)]
pub struct JoinedChannelList {
    channels: RwLock<Vec<String>>,
}

impl JoinedChannelList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when already present (names compare case-insensitively).
    pub fn add(&self, channel: &str) -> bool {
        let mut channels = self.channels.write().unwrap_or_else(|e| e.into_inner());
        if channels.iter().any(|c| c.eq_ignore_ascii_case(channel)) {
            return false;
        }
        channels.push(channel.to_string());
        true
    }

    pub fn remove(&self, channel: &str) -> bool {
        let mut channels = self.channels.write().unwrap_or_else(|e| e.into_inner());
        let before = channels.len();
        channels.retain(|c| !c.eq_ignore_ascii_case(channel));
        channels.len() != before
    }

    pub fn contains(&self, channel: &str) -> bool {
        self.channels
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|c| c.eq_ignore_ascii_case(channel))
    }

    pub fn clear(&self) {
        self.channels
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl JoinedChannels for JoinedChannelList {
    fn joined_channels(&self) -> Vec<String> {
        self.channels
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
