use serde::{Deserialize, Serialize};

/// A normalized external event ready for delivery.
///
/// `message: None` marks a silent event: it is accepted but nothing is sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEvent {
    pub channels: Vec<String>,
    pub message: Option<String>,
}

impl OutboundEvent {
    #[must_use]
    pub fn silent() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn new(channels: Vec<String>, message: impl Into<String>) -> Self {
        Self {
            channels,
            message: Some(message.into()),
        }
    }
}
