//! Query interfaces for the collaborators the dispatcher consults.
//!
//! Each trait has a `Noop` implementation that answers every lookup with a
//! miss, allowing the bot to run before a repository or symbol index is
//! configured.

use {async_trait::async_trait, tracing::debug};

/// Error type returned by collaborator lookups.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{message}")]
    Message { message: String },
    #[error("{0}")]
    Serde(#[from] serde_json::Error),
}

impl ServiceError {
    #[must_use]
    pub fn message(message: impl std::fmt::Display) -> Self {
        Self::Message {
            message: message.to_string(),
        }
    }
}

impl From<String> for ServiceError {
    fn from(value: String) -> Self {
        Self::message(value)
    }
}

impl From<&str> for ServiceError {
    fn from(value: &str) -> Self {
        Self::message(value)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

// ── Code host ───────────────────────────────────────────────────────────────

/// Summary of a pull request or issue.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PrInfo {
    pub title: String,
    pub number: u64,
    pub author: String,
    pub url: String,
}

impl PrInfo {
    /// One-line chat rendering: `"<title>" (#<n>) by <author> - <url>`.
    #[must_use]
    pub fn to_chat_line(&self) -> String {
        format!(
            "\"{}\" (#{}) by {} - {}",
            self.title, self.number, self.author, self.url
        )
    }
}

/// Commit, file, and pull request lookups against the configured repository.
///
/// `Ok(None)` is a miss; `Err` is a transport or decoding failure. Callers in
/// the dispatch path treat both as "nothing to say".
#[async_trait]
pub trait CodeHost: Send + Sync {
    /// Web URL of the commit whose hash starts with `hash`.
    async fn commit_url(&self, hash: &str) -> ServiceResult<Option<String>>;

    /// Web URL of the tree entry best matching `path`, anchored at `line`
    /// (digits only) when given.
    async fn file_url(&self, path: &str, line: Option<&str>) -> ServiceResult<Option<String>>;

    /// Pull request or issue `number`. `channel` selects a per-channel
    /// repository override.
    async fn pr_info(&self, number: u64, channel: &str) -> ServiceResult<Option<PrInfo>>;

    /// SHA of the cached tree, or a placeholder when nothing is cached.
    async fn tree_sha(&self) -> String;

    /// Refresh the cached tree. Without `force` an unchanged SHA is a no-op.
    async fn update_tree(&self, force: bool) -> ServiceResult<()>;

    /// Blob link for a repository-relative path.
    fn blob_url(&self, path: &str, line: Option<&str>) -> String;
}

pub struct NoopCodeHost;

#[async_trait]
impl CodeHost for NoopCodeHost {
    async fn commit_url(&self, hash: &str) -> ServiceResult<Option<String>> {
        debug!(hash, "code host not configured");
        Ok(None)
    }

    async fn file_url(&self, path: &str, _line: Option<&str>) -> ServiceResult<Option<String>> {
        debug!(path, "code host not configured");
        Ok(None)
    }

    async fn pr_info(&self, number: u64, _channel: &str) -> ServiceResult<Option<PrInfo>> {
        debug!(number, "code host not configured");
        Ok(None)
    }

    async fn tree_sha(&self) -> String {
        "none".into()
    }

    async fn update_tree(&self, _force: bool) -> ServiceResult<()> {
        Err("code host not configured".into())
    }

    fn blob_url(&self, path: &str, line: Option<&str>) -> String {
        match line {
            Some(line) => format!("{path}#L{line}"),
            None => path.to_string(),
        }
    }
}

// ── Symbol index ────────────────────────────────────────────────────────────

/// Definition search over the repository's source symbols.
#[async_trait]
pub trait SymbolIndex: Send + Sync {
    /// Locate the definition of `name`, returned as `"path:line"`.
    ///
    /// `kind` is the symbol kind (`proc`, `var`); `parent` narrows the search
    /// to one owning type.
    async fn find_definition(
        &self,
        name: &str,
        kind: &str,
        parent: Option<&str>,
    ) -> ServiceResult<Option<String>>;
}

pub struct NoopSymbolIndex;

#[async_trait]
impl SymbolIndex for NoopSymbolIndex {
    async fn find_definition(
        &self,
        _name: &str,
        _kind: &str,
        _parent: Option<&str>,
    ) -> ServiceResult<Option<String>> {
        Ok(None)
    }
}
