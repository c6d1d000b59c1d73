//! IRC line parsing and serialization (RFC 1459 framing, IRCv3 tags skipped).

use std::fmt;

/// Longest line the server accepts, including the trailing CRLF.
pub const MAX_LINE_LEN: usize = 512;

const CTCP_DELIM: char = '\u{1}';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcMessage {
    /// Source without the leading `:`, e.g. `nick!ident@host`.
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
}

impl IrcMessage {
    pub fn new(command: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            prefix: None,
            command: command.into(),
            params,
        }
    }

    /// Parse one line. Returns `None` for blank lines and lines with no
    /// command.
    pub fn parse(line: &str) -> Option<Self> {
        let mut rest = line.trim_end_matches(['\r', '\n']);
        if let Some(tagged) = rest.strip_prefix('@') {
            rest = tagged.split_once(' ')?.1;
        }
        rest = rest.trim_start_matches(' ');

        let prefix = match rest.strip_prefix(':') {
            Some(sourced) => {
                let (prefix, tail) = sourced.split_once(' ')?;
                rest = tail;
                Some(prefix.to_string())
            },
            None => None,
        };

        let (head, trailing) = match rest.split_once(" :") {
            Some((head, trailing)) => (head, Some(trailing)),
            None => (rest, None),
        };
        let mut words = head.split(' ').filter(|w| !w.is_empty());
        let command = words.next()?.to_ascii_uppercase();
        let mut params: Vec<String> = words.map(String::from).collect();
        if let Some(trailing) = trailing {
            params.push(trailing.to_string());
        }
        Some(Self {
            prefix,
            command,
            params,
        })
    }

    /// Nick part of the prefix.
    pub fn source_nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        Some(prefix.split_once('!').map_or(prefix, |(nick, _)| nick))
    }

    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    // ── Builders ────────────────────────────────────────────────────────────

    pub fn nick(nickname: &str) -> Self {
        Self::new("NICK", vec![nickname.into()])
    }

    pub fn user(username: &str, realname: &str) -> Self {
        Self::new("USER", vec![
            username.into(),
            "0".into(),
            "*".into(),
            realname.into(),
        ])
    }

    pub fn pong(token: &str) -> Self {
        Self::new("PONG", vec![token.into()])
    }

    pub fn join(channel: &str) -> Self {
        Self::new("JOIN", vec![channel.into()])
    }

    pub fn privmsg(target: &str, text: &str) -> Self {
        Self::new("PRIVMSG", vec![target.into(), text.into()])
    }
}

impl fmt::Display for IrcMessage {
    /// Wire form without the CRLF. With two or more parameters the last
    /// one is sent in trailing form; a lone parameter only when it needs it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{prefix} ")?;
        }
        f.write_str(&self.command)?;
        if let Some((last, middle)) = self.params.split_last() {
            for param in middle {
                write!(f, " {param}")?;
            }
            if !middle.is_empty() || last.is_empty() || last.contains(' ') || last.starts_with(':')
            {
                write!(f, " :{last}")?;
            } else {
                write!(f, " {last}")?;
            }
        }
        Ok(())
    }
}

/// Body of a CTCP message (`\x01VERSION\x01` → `VERSION`).
pub fn ctcp_body(text: &str) -> Option<&str> {
    text.strip_prefix(CTCP_DELIM)
        .map(|inner| inner.strip_suffix(CTCP_DELIM).unwrap_or(inner))
}

/// Channel names start with `#`, `&`, `+` or `!`.
pub fn is_channel(target: &str) -> bool {
    target.starts_with(['#', '&', '+', '!'])
}

/// Remove characters that would break IRC framing.
pub fn sanitize(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '\r' | '\n' | '\0')).collect()
}
