use std::{sync::Arc, time::Duration};

use {
    secrecy::ExposeSecret,
    tokio::{
        io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader},
        net::TcpStream,
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use {
    zbot_channels::ChannelRelay,
    zbot_config::ServerConfig,
    zbot_dispatch::{IncomingLine, MessageRouter},
};

use crate::{
    Error, IrcOutbound, JoinedChannelList, Result,
    message::{IrcMessage, ctcp_body, is_channel},
};

const ERR_NICKNAMEINUSE: &str = "433";
const RPL_WELCOME: &str = "001";

/// One IRC server connection, reconnected after a fixed delay whenever it
/// drops.
pub struct IrcSession {
    config: ServerConfig,
    outbound: Arc<IrcOutbound>,
    joined: Arc<JoinedChannelList>,
    nickname: std::sync::Mutex<String>,
}

impl IrcSession {
    pub fn new(config: ServerConfig) -> Self {
        let nickname = config.info.nickname.clone();
        Self {
            outbound: Arc::new(IrcOutbound::new(config.name.clone())),
            joined: Arc::new(JoinedChannelList::new()),
            nickname: std::sync::Mutex::new(nickname),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Outbound view of this session for the dispatcher and webhook relays.
    pub fn relay(&self) -> ChannelRelay {
        ChannelRelay::new(
            self.config.name.clone(),
            Arc::<IrcOutbound>::clone(&self.outbound),
            Arc::<JoinedChannelList>::clone(&self.joined),
        )
    }

    pub fn joined(&self) -> &JoinedChannelList {
        &self.joined
    }

    pub fn current_nick(&self) -> String {
        self.nickname
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn set_nick(&self, nick: &str) {
        *self.nickname.lock().unwrap_or_else(|e| e.into_inner()) = nick.to_string();
    }

    fn is_me(&self, nick: Option<&str>) -> bool {
        nick.is_some_and(|n| n.eq_ignore_ascii_case(&self.current_nick()))
    }

    /// Connect, serve, and reconnect until `cancel` fires.
    pub async fn run(self: Arc<Self>, router: MessageRouter, cancel: CancellationToken) {
        let delay = Duration::from_secs(self.config.reconnect_delay_secs);
        loop {
            if cancel.is_cancelled() {
                break;
            }
            match self.connect_and_serve(&router, &cancel).await {
                Ok(()) => info!(server = %self.config.name, "connection closed"),
                Err(e) => warn!(server = %self.config.name, error = %e, "connection failed"),
            }
            self.set_nick(&self.config.info.nickname);
            if cancel.is_cancelled() {
                break;
            }
            info!(
                server = %self.config.name,
                delay_secs = delay.as_secs(),
                "reconnecting after delay"
            );
            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(delay) => {},
            }
        }
        info!(server = %self.config.name, "session stopped");
    }

    async fn connect_and_serve(
        &self,
        router: &MessageRouter,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let address = format!("{}:{}", self.config.host, self.config.port);
        info!(server = %self.config.name, %address, "connecting");
        let stream = TcpStream::connect((self.config.host.as_str(), self.config.port))
            .await
            .map_err(|source| Error::Connect {
                address: address.clone(),
                source,
            })?;
        let (reader, writer) = stream.into_split();
        self.serve(reader, writer, router, cancel).await
    }

    /// Register and process lines from an established connection until it
    /// closes or `cancel` fires. Each line is fully dispatched before the
    /// next one is read.
    pub async fn serve<R, W>(
        &self,
        reader: R,
        writer: W,
        router: &MessageRouter,
        cancel: &CancellationToken,
    ) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        self.outbound.attach(writer).await;
        let result = self.read_loop(reader, router, cancel).await;
        self.outbound.detach().await;
        self.joined.clear();
        result
    }

    async fn read_loop<R: AsyncRead + Unpin>(
        &self,
        reader: R,
        router: &MessageRouter,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.register().await?;
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::with_capacity(512);
        loop {
            buf.clear();
            let read = tokio::select! {
                () = cancel.cancelled() => {
                    let quit = IrcMessage::new("QUIT", vec!["Shutting down".into()]);
                    if let Err(e) = self.outbound.send(&quit).await {
                        debug!(server = %self.config.name, error = %e, "QUIT not sent");
                    }
                    return Ok(());
                },
                read = reader.read_until(b'\n', &mut buf) => read?,
            };
            if read == 0 {
                return Ok(());
            }
            let line = String::from_utf8_lossy(&buf);
            let Some(message) = IrcMessage::parse(&line) else {
                continue;
            };
            self.handle(&message, router).await?;
        }
    }

    async fn register(&self) -> Result<()> {
        let info = &self.config.info;
        self.outbound
            .send(&IrcMessage::nick(&self.current_nick()))
            .await?;
        self.outbound
            .send(&IrcMessage::user(&info.username, &info.realname))
            .await?;
        Ok(())
    }

    async fn handle(&self, message: &IrcMessage, router: &MessageRouter) -> Result<()> {
        let server = self.config.name.as_str();
        match message.command.as_str() {
            "PING" => {
                let token = message.param(0).unwrap_or_default();
                self.outbound.send(&IrcMessage::pong(token)).await?;
            },
            ERR_NICKNAMEINUSE => {
                let taken = self.current_nick();
                let next = if taken == self.config.info.nickname {
                    self.config.info.alt_nickname.clone()
                } else {
                    format!("{taken}_")
                };
                warn!(server, taken = %taken, next = %next, "nickname in use");
                self.set_nick(&next);
                self.outbound.send(&IrcMessage::nick(&next)).await?;
            },
            RPL_WELCOME => {
                if let Some(nick) = message.param(0) {
                    self.set_nick(nick);
                }
                info!(server, nick = %self.current_nick(), "signed on");
                self.identify().await?;
                for channel in &self.config.channels {
                    self.outbound.send(&IrcMessage::join(channel)).await?;
                }
            },
            "JOIN" if self.is_me(message.source_nick()) => {
                if let Some(channel) = message.param(0) {
                    self.joined.add(channel);
                    info!(server, channel, "joined");
                }
            },
            "PART" if self.is_me(message.source_nick()) => {
                if let Some(channel) = message.param(0) {
                    self.joined.remove(channel);
                    info!(server, channel, "left");
                }
            },
            "KICK" if self.is_me(message.param(1)) => {
                if let Some(channel) = message.param(0) {
                    self.joined.remove(channel);
                    warn!(
                        server,
                        channel,
                        by = message.source_nick().unwrap_or_default(),
                        "kicked"
                    );
                }
            },
            "NICK" if self.is_me(message.source_nick()) => {
                if let Some(nick) = message.param(0) {
                    self.set_nick(nick);
                    info!(server, nick, "nick changed");
                }
            },
            "PRIVMSG" => self.handle_privmsg(message, router).await,
            "ERROR" => {
                warn!(
                    server,
                    reason = message.param(0).unwrap_or_default(),
                    "server closing link"
                );
            },
            _ => {},
        }
        Ok(())
    }

    async fn identify(&self) -> Result<()> {
        let nickserv = &self.config.nickserv;
        if !nickserv.enabled {
            return Ok(());
        }
        let password = nickserv.password.expose_secret();
        if password.is_empty() {
            warn!(server = %self.config.name, "NickServ enabled without a password");
            return Ok(());
        }
        debug!(server = %self.config.name, "identifying with NickServ");
        self.outbound
            .send(&IrcMessage::privmsg(
                "NickServ",
                &format!("IDENTIFY {password}"),
            ))
            .await?;
        Ok(())
    }

    async fn handle_privmsg(&self, message: &IrcMessage, router: &MessageRouter) {
        let (Some(target), Some(text)) = (message.param(0), message.param(1)) else {
            return;
        };
        let user = message.prefix.as_deref().unwrap_or_default();
        if let Some(query) = ctcp_body(text) {
            info!(server = %self.config.name, user, target, query, "CTCP query");
            return;
        }
        if !is_channel(target) {
            debug!(server = %self.config.name, user, "ignoring private message");
            return;
        }
        debug!(server = %self.config.name, channel = target, user, text, "incoming line");
        router
            .handle_line(&IncomingLine::new(target, user, text))
            .await;
    }
}

/// Spawn the session's reconnect loop. Cancel the returned token to stop it.
pub fn start_session(session: Arc<IrcSession>, router: MessageRouter) -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move { session.run(router, token).await });
    cancel
}
