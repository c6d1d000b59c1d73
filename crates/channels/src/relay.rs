use std::sync::Arc;

use tracing::{debug, warn};

use crate::{ChannelOutbound, JoinedChannels, OutboundEvent, Result};

/// Formats results into chat lines and fans them out to channels.
///
/// Delivery is best-effort: a failed send is logged and the remaining
/// channels still receive the message. Nothing is rolled back.
#[derive(Clone)]
pub struct ChannelRelay {
    network: String,
    outbound: Arc<dyn ChannelOutbound>,
    joined: Arc<dyn JoinedChannels>,
}

impl ChannelRelay {
    pub fn new(
        network: impl Into<String>,
        outbound: Arc<dyn ChannelOutbound>,
        joined: Arc<dyn JoinedChannels>,
    ) -> Self {
        Self {
            network: network.into(),
            outbound,
            joined,
        }
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    /// Send `message` to one channel.
    ///
    /// Chat lines cannot carry newlines, so each non-blank line of a
    /// multi-line message goes out as its own line, in order.
    pub async fn send_to(&self, channel: &str, message: &str) -> Result<()> {
        for line in message.lines().filter(|l| !l.trim().is_empty()) {
            debug!(network = %self.network, channel, message = line, "sending");
            self.outbound.send_text(channel, line).await?;
        }
        Ok(())
    }

    /// Send `message` to each channel in order. Returns how many channels
    /// received it.
    pub async fn send_to_many(&self, channels: &[String], message: &str) -> usize {
        let mut delivered = 0;
        for channel in channels {
            match self.send_to(channel, message).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(network = %self.network, channel, error = %e, "failed to send to channel");
                },
            }
        }
        delivered
    }

    /// Send `message` to every channel the connection is currently joined to.
    pub async fn send_to_all(&self, message: &str) -> usize {
        let channels = self.joined.joined_channels();
        self.send_to_many(&channels, message).await
    }

    /// Deliver a normalized external event. Silent events send nothing.
    pub async fn receive_external_event(&self, event: &OutboundEvent) -> usize {
        match event.message.as_deref() {
            Some(message) => self.send_to_many(&event.channels, message).await,
            None => {
                debug!(network = %self.network, "silent external event");
                0
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, crate::Error, async_trait::async_trait, std::sync::Mutex};

    #[derive(Default)]
    struct RecordingOutbound {
        sent: Mutex<Vec<(String, String)>>,
        fail_on: Option<String>,
    }

    #[async_trait]
    impl ChannelOutbound for RecordingOutbound {
        async fn send_text(&self, to: &str, text: &str) -> Result<()> {
            if self.fail_on.as_deref() == Some(to) {
                return Err(Error::unavailable("not joined"));
            }
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), text.to_string()));
            Ok(())
        }
    }

    struct FixedJoined(Vec<String>);

    impl JoinedChannels for FixedJoined {
        fn joined_channels(&self) -> Vec<String> {
            self.0.clone()
        }
    }

    fn relay(outbound: Arc<RecordingOutbound>, joined: &[&str]) -> ChannelRelay {
        ChannelRelay::new(
            "test",
            outbound,
            Arc::new(FixedJoined(joined.iter().map(|s| s.to_string()).collect())),
        )
    }

    fn sent(outbound: &RecordingOutbound) -> Vec<(String, String)> {
        outbound.sent.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn silent_event_sends_nothing() {
        let outbound = Arc::new(RecordingOutbound::default());
        let relay = relay(Arc::clone(&outbound), &["#a"]);
        let event = OutboundEvent {
            channels: vec!["#a".into(), "#b".into()],
            message: None,
        };
        assert_eq!(relay.receive_external_event(&event).await, 0);
        assert!(sent(&outbound).is_empty());
    }

    #[tokio::test]
    async fn event_fans_out_in_order() {
        let outbound = Arc::new(RecordingOutbound::default());
        let relay = relay(Arc::clone(&outbound), &[]);
        let event = OutboundEvent::new(vec!["a".into(), "b".into()], "X");
        assert_eq!(relay.receive_external_event(&event).await, 2);
        assert_eq!(
            sent(&outbound),
            vec![("a".into(), "X".into()), ("b".into(), "X".into())]
        );
    }

    #[tokio::test]
    async fn failure_does_not_block_later_channels() {
        let outbound = Arc::new(RecordingOutbound {
            fail_on: Some("#broken".into()),
            ..Default::default()
        });
        let relay = relay(Arc::clone(&outbound), &[]);
        let channels = vec!["#broken".to_string(), "#ok".to_string()];
        assert_eq!(relay.send_to_many(&channels, "hello").await, 1);
        assert_eq!(sent(&outbound), vec![("#ok".into(), "hello".into())]);
    }

    #[tokio::test]
    async fn send_to_all_uses_joined_channels() {
        let outbound = Arc::new(RecordingOutbound::default());
        let relay = relay(Arc::clone(&outbound), &["#one", "#two"]);
        assert_eq!(relay.send_to_all("hi").await, 2);
        let targets: Vec<String> = sent(&outbound).into_iter().map(|(to, _)| to).collect();
        assert_eq!(targets, vec!["#one", "#two"]);
    }

    #[tokio::test]
    async fn multi_line_message_is_split() {
        let outbound = Arc::new(RecordingOutbound::default());
        let relay = relay(Arc::clone(&outbound), &[]);
        relay
            .send_to("#dev", "Tree updated.\n\nOld: a New: b")
            .await
            .unwrap();
        assert_eq!(
            sent(&outbound),
            vec![
                ("#dev".into(), "Tree updated.".into()),
                ("#dev".into(), "Old: a New: b".into()),
            ]
        );
    }
}
