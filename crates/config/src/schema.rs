/// Config schema types (dispatch, github, symbols, webhook, servers).
use std::collections::HashMap;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ZbotConfig {
    pub dispatch: DispatchConfig,
    pub github: GithubConfig,
    pub symbols: SymbolsConfig,
    pub webhook: WebhookConfig,
    pub servers: Vec<ServerConfig>,
}

/// How chat lines are interpreted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Command prefix character. Lines starting with it are explicit commands.
    pub prefix: char,
    /// Maximum reference resolutions attempted for one un-prefixed line.
    pub max_references: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            prefix: '!',
            max_references: 3,
        }
    }
}

/// Code-hosting repository the bot resolves references against.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub owner: String,
    pub repo: String,
    /// Branch used for tree lookups and blob links.
    pub branch: String,
    /// Personal access token. Empty means unauthenticated requests.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,
    /// REST API base URL.
    pub api_url: String,
    /// Public web base URL used to build blob links.
    pub web_url: String,
    /// Per-channel `owner/repo` overrides for issue and PR lookups.
    pub channel_repos: HashMap<String, String>,
}

impl std::fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubConfig")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("token", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            branch: "master".into(),
            token: Secret::new(String::new()),
            api_url: "https://api.github.com".into(),
            web_url: "https://github.com".into(),
            channel_repos: HashMap::new(),
        }
    }
}

/// Prebuilt symbol index used by definition lookups.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolsConfig {
    /// Path to the JSON index file. `None` disables definition lookups.
    pub index_path: Option<String>,
}

/// Inbound webhook server.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub enabled: bool,
    pub bind: String,
    pub port: u16,
    /// Shared HMAC secret. `None` disables signature verification.
    #[serde(
        serialize_with = "serialize_opt_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub secret: Option<Secret<String>>,
    /// Channels that receive events with no repository-specific routing.
    pub channels: Vec<String>,
    /// `owner/repo` → channels.
    pub repo_channels: HashMap<String, Vec<String>>,
}

impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("enabled", &self.enabled)
            .field("bind", &self.bind)
            .field("port", &self.port)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind: "127.0.0.1".into(),
            port: 8787,
            secret: None,
            channels: Vec::new(),
            repo_channels: HashMap::new(),
        }
    }
}

/// One chat network connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Display name used in logs.
    pub name: String,
    pub host: String,
    pub port: u16,
    pub info: IdentityConfig,
    pub nickserv: NickservConfig,
    /// Channels joined after sign-on.
    pub channels: Vec<String>,
    /// Nicks whose lines are dropped before dispatch (case-insensitive).
    pub ignore_list: Vec<String>,
    /// Delay before reconnecting after the connection drops.
    pub reconnect_delay_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "default".into(),
            host: String::new(),
            port: 6667,
            info: IdentityConfig::default(),
            nickserv: NickservConfig::default(),
            channels: Vec::new(),
            ignore_list: Vec::new(),
            reconnect_delay_secs: 10,
        }
    }
}

/// Nick and user registration details.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub nickname: String,
    /// Nick tried when the primary one is already in use.
    pub alt_nickname: String,
    pub realname: String,
    pub username: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            nickname: "ZBot".into(),
            alt_nickname: "ZBot_".into(),
            realname: "ZBot".into(),
            username: "ZBot".into(),
        }
    }
}

/// Services identification sent after sign-on.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NickservConfig {
    pub enabled: bool,
    #[serde(serialize_with = "serialize_secret")]
    pub password: Secret<String>,
}

impl std::fmt::Debug for NickservConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NickservConfig")
            .field("enabled", &self.enabled)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Default for NickservConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            password: Secret::new(String::new()),
        }
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

fn serialize_opt_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}
