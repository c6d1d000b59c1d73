/// In-memory copy of the repository tree at one SHA.
#[derive(Debug, Clone, Default)]
pub struct TreeCache {
    sha: Option<String>,
    paths: Vec<String>,
}

impl TreeCache {
    pub fn new(sha: impl Into<String>, paths: Vec<String>) -> Self {
        Self {
            sha: Some(sha.into()),
            paths,
        }
    }

    pub fn sha(&self) -> Option<&str> {
        self.sha.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Best path for `query`.
    ///
    /// Tries, in order: the exact path, the shortest path ending in
    /// `/<query>`, and the shortest path containing `query` ignoring case.
    pub fn find(&self, query: &str) -> Option<&str> {
        let query = query.trim_start_matches('/');
        if query.is_empty() {
            return None;
        }
        if let Some(exact) = self.paths.iter().find(|p| p.as_str() == query) {
            return Some(exact);
        }

        let suffix = format!("/{query}");
        if let Some(hit) = self.shortest(|p| p.ends_with(&suffix)) {
            return Some(hit);
        }

        let needle = query.to_lowercase();
        self.shortest(|p| p.to_lowercase().contains(&needle))
    }

    fn shortest(&self, pred: impl Fn(&str) -> bool) -> Option<&str> {
        self.paths
            .iter()
            .map(String::as_str)
            .filter(|p| pred(p))
            .min_by_key(|p| p.len())
    }
}
