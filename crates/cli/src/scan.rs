//! `zbot scan`: push one line through the router without a connection.

use std::sync::Arc;

use async_trait::async_trait;

use {
    zbot_channels::{ChannelOutbound, ChannelRelay, JoinedChannels},
    zbot_config::ZbotConfig,
    zbot_dispatch::{IncomingLine, MessageRouter, Outcome},
};

use crate::wiring;

/// Prints every line the router would send.
struct StdoutOutbound;

#[async_trait]
impl ChannelOutbound for StdoutOutbound {
    async fn send_text(&self, to: &str, text: &str) -> zbot_channels::Result<()> {
        println!("{to} <- {text}");
        Ok(())
    }
}

impl JoinedChannels for StdoutOutbound {
    fn joined_channels(&self) -> Vec<String> {
        Vec::new()
    }
}

pub fn offline_router(config: &ZbotConfig) -> anyhow::Result<MessageRouter> {
    let outbound = Arc::new(StdoutOutbound);
    let relay = ChannelRelay::new("scan", outbound.clone(), outbound);
    Ok(MessageRouter::new(
        Arc::new(wiring::build_table()?),
        Arc::new(wiring::build_services(config)?),
        relay,
        wiring::router_config(config, None),
    ))
}

pub async fn scan_line(
    config: &ZbotConfig,
    channel: &str,
    user: &str,
    text: &str,
) -> anyhow::Result<()> {
    let router = offline_router(config)?;
    let outcome = router
        .handle_line(&IncomingLine::new(channel, user, text))
        .await;
    match outcome {
        Outcome::Ignored => eprintln!("sender is ignored"),
        Outcome::NoCommand => eprintln!("no command matched"),
        Outcome::Command { keyword, replied } => {
            eprintln!("command {keyword} ({})", if replied { "replied" } else { "silent" });
        },
        Outcome::Scanned { attempts } => eprintln!("{attempts} reference(s) resolved"),
    }
    Ok(())
}
