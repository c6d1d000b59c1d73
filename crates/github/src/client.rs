use std::collections::HashMap;

use {
    async_trait::async_trait,
    reqwest::{Client, RequestBuilder, StatusCode, header},
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    tokio::sync::RwLock,
    tracing::{debug, info},
};

use {
    zbot_config::GithubConfig,
    zbot_service_traits::{CodeHost, PrInfo, ServiceResult},
};

use crate::{Error, Result, TreeCache, error::Context};

const USER_AGENT: &str = concat!("zbot/", env!("CARGO_PKG_VERSION"));

// ── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CommitResponse {
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct IssueResponse {
    title: String,
    number: u64,
    html_url: String,
    user: IssueUser,
}

#[derive(Debug, Deserialize)]
struct IssueUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct BranchResponse {
    commit: BranchCommit,
}

#[derive(Debug, Deserialize)]
struct BranchCommit {
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    tree: ShaRef,
}

#[derive(Debug, Deserialize)]
struct ShaRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    sha: String,
    #[serde(default)]
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

// ── Client ──────────────────────────────────────────────────────────────────

/// GitHub REST client for one repository, with an in-memory tree cache.
///
/// Requests are made once; there is no retry or backoff.
pub struct GithubClient {
    http: Client,
    api_url: String,
    web_url: String,
    owner: String,
    repo: String,
    branch: String,
    token: Secret<String>,
    channel_repos: HashMap<String, String>,
    tree: RwLock<TreeCache>,
}

impl GithubClient {
    pub fn from_config(config: &GithubConfig) -> Result<Self> {
        if config.owner.is_empty() || config.repo.is_empty() {
            return Err(Error::message("github.owner and github.repo must be set"));
        }
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            web_url: config.web_url.trim_end_matches('/').to_string(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            branch: config.branch.clone(),
            token: config.token.clone(),
            channel_repos: config.channel_repos.clone(),
            tree: RwLock::new(TreeCache::default()),
        })
    }

    /// `owner/repo` for issue lookups from `channel`.
    pub fn repo_for_channel(&self, channel: &str) -> String {
        self.channel_repos
            .get(channel)
            .cloned()
            .unwrap_or_else(|| format!("{}/{}", self.owner, self.repo))
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.api_url);
        let req = self
            .http
            .get(url)
            .header(header::ACCEPT, "application/vnd.github+json");
        let token = self.token.expose_secret();
        if token.is_empty() {
            req
        } else {
            req.bearer_auth(token)
        }
    }

    /// Send a GET and decode the body. 404 and 422 are a miss.
    async fn fetch<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let resp = self
            .get(path)
            .send()
            .await
            .map_err(|source| Error::external(format!("GET {path} failed"), source))?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::UNPROCESSABLE_ENTITY {
            debug!(path, status = status.as_u16(), "not found");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: path.to_string(),
            });
        }
        let body = resp
            .json::<T>()
            .await
            .map_err(|source| Error::external(format!("failed to decode {path}"), source))?;
        Ok(Some(body))
    }

    async fn fetch_commit_url(&self, hash: &str) -> Result<Option<String>> {
        if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_hexdigit() || c == '~') {
            debug!(hash, "not a commit hash, skipping lookup");
            return Ok(None);
        }
        let path = format!("/repos/{}/{}/commits/{hash}", self.owner, self.repo);
        Ok(self
            .fetch::<CommitResponse>(&path)
            .await?
            .map(|c| c.html_url))
    }

    async fn fetch_issue(&self, number: u64, channel: &str) -> Result<Option<PrInfo>> {
        let slug = self.repo_for_channel(channel);
        let path = format!("/repos/{slug}/issues/{number}");
        Ok(self.fetch::<IssueResponse>(&path).await?.map(|i| PrInfo {
            title: i.title,
            number: i.number,
            author: i.user.login,
            url: i.html_url,
        }))
    }

    /// Tree SHA at the head of the configured branch.
    async fn fetch_head_tree_sha(&self) -> Result<String> {
        let path = format!(
            "/repos/{}/{}/branches/{}",
            self.owner, self.repo, self.branch
        );
        let branch = self
            .fetch::<BranchResponse>(&path)
            .await?
            .with_context(|| format!("branch {} not found", self.branch))?;
        Ok(branch.commit.commit.tree.sha)
    }

    async fn fetch_tree(&self, sha: &str) -> Result<TreeCache> {
        let path = format!(
            "/repos/{}/{}/git/trees/{sha}?recursive=1",
            self.owner, self.repo
        );
        let tree = self
            .fetch::<TreeResponse>(&path)
            .await?
            .with_context(|| format!("tree {sha} not found"))?;
        if tree.truncated {
            info!(sha = %tree.sha, "tree listing truncated by GitHub");
        }
        let paths = tree
            .tree
            .into_iter()
            .filter(|e| e.kind == "blob")
            .map(|e| e.path)
            .collect();
        Ok(TreeCache::new(tree.sha, paths))
    }

    /// Refresh the cached tree. Returns whether the cache changed.
    pub async fn refresh_tree(&self, force: bool) -> Result<bool> {
        let head = self.fetch_head_tree_sha().await?;
        let current = self.tree.read().await.sha().map(str::to_string);
        if !force && current.as_deref() == Some(head.as_str()) {
            debug!(sha = %head, "tree unchanged");
            return Ok(false);
        }
        let fresh = self.fetch_tree(&head).await?;
        info!(
            old = current.as_deref().unwrap_or("none"),
            new = %head,
            files = fresh.len(),
            "tree updated"
        );
        *self.tree.write().await = fresh;
        Ok(true)
    }

    async fn find_file(&self, query: &str) -> Result<Option<String>> {
        if self.tree.read().await.sha().is_none() {
            self.refresh_tree(false).await?;
        }
        Ok(self.tree.read().await.find(query).map(str::to_string))
    }
}

#[async_trait]
impl CodeHost for GithubClient {
    async fn commit_url(&self, hash: &str) -> ServiceResult<Option<String>> {
        Ok(self.fetch_commit_url(hash).await?)
    }

    async fn file_url(&self, path: &str, line: Option<&str>) -> ServiceResult<Option<String>> {
        Ok(self
            .find_file(path)
            .await?
            .map(|found| self.blob_url(&found, line)))
    }

    async fn pr_info(&self, number: u64, channel: &str) -> ServiceResult<Option<PrInfo>> {
        Ok(self.fetch_issue(number, channel).await?)
    }

    async fn tree_sha(&self) -> String {
        self.tree.read().await.sha().unwrap_or("none").to_string()
    }

    async fn update_tree(&self, force: bool) -> ServiceResult<()> {
        self.refresh_tree(force).await?;
        Ok(())
    }

    fn blob_url(&self, path: &str, line: Option<&str>) -> String {
        let base = format!(
            "{}/{}/{}/blob/{}/{}",
            self.web_url,
            self.owner,
            self.repo,
            self.branch,
            path.trim_start_matches('/')
        );
        match line {
            Some(line) => format!("{base}#L{line}"),
            None => base,
        }
    }
}
