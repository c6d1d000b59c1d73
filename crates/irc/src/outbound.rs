use {
    async_trait::async_trait,
    tokio::{
        io::{AsyncWrite, AsyncWriteExt},
        sync::Mutex,
    },
    tracing::debug,
};

use zbot_channels::{ChannelOutbound, Error, Result};

use crate::message::{IrcMessage, MAX_LINE_LEN, sanitize};

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Body bytes per PRIVMSG. Leaves room for the command, target, and the
/// source prefix the server prepends when relaying.
const MAX_TEXT_BYTES: usize = MAX_LINE_LEN - 112;

/// Writer half of the current connection.
///
/// Every line goes through one mutex, so concurrent senders (dispatch and
/// webhook relays) interleave whole lines only. Between connections there is
/// no writer and sends fail with [`Error::Unavailable`].
pub struct IrcOutbound {
    server: String,
    writer: Mutex<Option<BoxedWriter>>,
}

impl IrcOutbound {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            writer: Mutex::new(None),
        }
    }

    pub async fn attach<W: AsyncWrite + Send + Unpin + 'static>(&self, writer: W) {
        *self.writer.lock().await = Some(Box::new(writer));
    }

    pub async fn detach(&self) {
        self.writer.lock().await.take();
    }

    pub async fn is_connected(&self) -> bool {
        self.writer.lock().await.is_some()
    }

    pub async fn send(&self, message: &IrcMessage) -> Result<()> {
        let mut line = sanitize(&message.to_string());
        line.push_str("\r\n");
        let mut guard = self.writer.lock().await;
        let writer = guard
            .as_mut()
            .ok_or_else(|| Error::unavailable(format!("{} is not connected", self.server)))?;
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| Error::external("write failed", e))?;
        writer
            .flush()
            .await
            .map_err(|e| Error::external("flush failed", e))?;
        Ok(())
    }
}

/// Split `text` into pieces of at most `max` bytes on char boundaries.
fn chunk(text: &str, max: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text;
    while rest.len() > max {
        let mut cut = max;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        let (head, tail) = rest.split_at(cut);
        chunks.push(head);
        rest = tail;
    }
    if !rest.is_empty() {
        chunks.push(rest);
    }
    chunks
}

#[async_trait]
impl ChannelOutbound for IrcOutbound {
    async fn send_text(&self, to: &str, text: &str) -> Result<()> {
        if to.is_empty() || to.contains(' ') {
            return Err(Error::invalid_input(format!("bad target {to:?}")));
        }
        let text = sanitize(text);
        for piece in chunk(&text, MAX_TEXT_BYTES) {
            debug!(server = %self.server, to, "PRIVMSG");
            self.send(&IrcMessage::privmsg(to, piece)).await?;
        }
        Ok(())
    }
}
