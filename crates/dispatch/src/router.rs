use std::sync::Arc;

use tracing::{debug, warn};

use zbot_channels::{ChannelRelay, gating::is_ignored};

use crate::{
    command::{CommandTable, Services},
    handlers::{resolve_commit, resolve_file, resolve_pr},
    reference::{ReferenceMatch, classify},
};

/// One chat line as delivered by a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingLine {
    pub channel: String,
    /// Full sender mask, `nick!ident@host`.
    pub user: String,
    pub raw_text: String,
}

impl IncomingLine {
    pub fn new(
        channel: impl Into<String>,
        user: impl Into<String>,
        raw_text: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            user: user.into(),
            raw_text: raw_text.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub prefix: char,
    /// Reference resolutions allowed per scanned line.
    pub max_references: usize,
    pub ignore_list: Vec<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            prefix: '!',
            max_references: 3,
            ignore_list: Vec::new(),
        }
    }
}

/// What the router did with a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Sender is on the ignore list.
    Ignored,
    /// Prefixed line with no tokens or an unknown keyword.
    NoCommand,
    Command { keyword: String, replied: bool },
    /// Un-prefixed line; `attempts` references were resolved.
    Scanned { attempts: usize },
}

/// Turns chat lines into command invocations or reference lookups and sends
/// any reply back to the originating channel.
#[derive(Clone)]
pub struct MessageRouter {
    table: Arc<CommandTable>,
    services: Arc<Services>,
    relay: ChannelRelay,
    config: RouterConfig,
}

impl MessageRouter {
    pub fn new(
        table: Arc<CommandTable>,
        services: Arc<Services>,
        relay: ChannelRelay,
        config: RouterConfig,
    ) -> Self {
        Self {
            table,
            services,
            relay,
            config,
        }
    }

    pub fn relay(&self) -> &ChannelRelay {
        &self.relay
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub async fn handle_line(&self, line: &IncomingLine) -> Outcome {
        if is_ignored(&line.user, &self.config.ignore_list) {
            debug!(user = %line.user, channel = %line.channel, "ignoring sender");
            return Outcome::Ignored;
        }
        match line.raw_text.strip_prefix(self.config.prefix) {
            Some(rest) => self.dispatch_command(line, rest).await,
            None => self.scan(line).await,
        }
    }

    async fn dispatch_command(&self, line: &IncomingLine, rest: &str) -> Outcome {
        let args: Vec<String> = rest.split_whitespace().map(String::from).collect();
        let Some(keyword) = args.first().filter(|k| self.table.lookup(k).is_some()) else {
            return Outcome::NoCommand;
        };
        debug!(
            channel = %line.channel,
            user = %line.user,
            keyword = %keyword,
            "dispatching command"
        );
        let reply = self
            .table
            .invoke(
                &self.services,
                self.config.prefix,
                &line.channel,
                &line.user,
                &args,
            )
            .await;
        let replied = match reply {
            Some(message) => self.reply(&line.channel, &message).await,
            None => false,
        };
        Outcome::Command {
            keyword: keyword.clone(),
            replied,
        }
    }

    async fn scan(&self, line: &IncomingLine) -> Outcome {
        let mut attempts = 0;
        for token in line.raw_text.split_whitespace() {
            if attempts >= self.config.max_references {
                break;
            }
            let Some(reference) = classify(token) else {
                continue;
            };
            attempts += 1;
            debug!(channel = %line.channel, ?reference, "resolving reference");
            if let Some(message) = self.resolve(&reference, &line.channel).await {
                self.reply(&line.channel, &message).await;
            }
        }
        Outcome::Scanned { attempts }
    }

    async fn resolve(&self, reference: &ReferenceMatch, channel: &str) -> Option<String> {
        match reference {
            ReferenceMatch::Issue(digits) => {
                let Ok(number) = digits.parse::<u64>() else {
                    debug!(digits = %digits, "issue number out of range");
                    return None;
                };
                resolve_pr(&self.services, number, channel).await
            },
            ReferenceMatch::File { path, line } => {
                resolve_file(&self.services, path, line.as_deref()).await
            },
            ReferenceMatch::Commit(hash) => resolve_commit(&self.services, hash).await,
        }
    }

    async fn reply(&self, channel: &str, message: &str) -> bool {
        match self.relay.send_to(channel, message).await {
            Ok(()) => true,
            Err(e) => {
                warn!(channel, error = %e, "failed to send reply");
                false
            },
        }
    }
}
