use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use {
    async_trait::async_trait,
    serde::Deserialize,
    tracing::{debug, info},
};

use zbot_service_traits::{ServiceResult, SymbolIndex};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Proc,
    Var,
}

impl SymbolKind {
    /// Accepts `proc`/`procs`/`var`/`vars`, any case.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "proc" | "procs" => Some(Self::Proc),
            "var" | "vars" => Some(Self::Var),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SymbolEntry {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    pub path: String,
    pub line: u32,
}

impl SymbolEntry {
    /// `path:line` with `/` separators.
    pub fn location(&self) -> String {
        format!("{}:{}", self.path.replace('\\', "/"), self.line)
    }

    fn parent_is(&self, parent: &str) -> bool {
        self.parent
            .as_deref()
            .is_some_and(|own| normalize_type(own) == normalize_type(parent))
    }
}

fn normalize_type(path: &str) -> &str {
    path.trim_matches('/')
}

#[derive(Debug, Default, Deserialize)]
struct IndexFile {
    #[serde(default)]
    procs: Vec<SymbolEntry>,
    #[serde(default)]
    vars: Vec<SymbolEntry>,
}

/// Symbol index loaded once from a JSON file and kept in memory.
#[derive(Debug, Default)]
pub struct FileSymbolIndex {
    by_name: HashMap<(SymbolKind, String), Vec<SymbolEntry>>,
    source: Option<PathBuf>,
}

impl FileSymbolIndex {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut index = Self::from_json(&data).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        index.source = Some(path.to_path_buf());
        info!(path = %path.display(), symbols = index.len(), "loaded symbol index");
        Ok(index)
    }

    pub fn from_json(data: &str) -> serde_json::Result<Self> {
        let file: IndexFile = serde_json::from_str(data)?;
        let mut by_name: HashMap<(SymbolKind, String), Vec<SymbolEntry>> = HashMap::new();
        let tagged = file
            .procs
            .into_iter()
            .map(|e| (SymbolKind::Proc, e))
            .chain(file.vars.into_iter().map(|e| (SymbolKind::Var, e)));
        for (kind, entry) in tagged {
            by_name
                .entry((kind, entry.name.clone()))
                .or_default()
                .push(entry);
        }
        Ok(Self {
            by_name,
            source: None,
        })
    }

    pub fn len(&self) -> usize {
        self.by_name.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// File the index was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// First entry of `kind` named `name`, restricted to `parent` when given.
    pub fn lookup(&self, kind: SymbolKind, name: &str, parent: Option<&str>) -> Option<&SymbolEntry> {
        let candidates = self.by_name.get(&(kind, name.to_string()))?;
        match parent {
            Some(parent) => candidates.iter().find(|e| e.parent_is(parent)),
            None => candidates.first(),
        }
    }
}

#[async_trait]
impl SymbolIndex for FileSymbolIndex {
    async fn find_definition(
        &self,
        name: &str,
        kind: &str,
        parent: Option<&str>,
    ) -> ServiceResult<Option<String>> {
        let Some(kind) = SymbolKind::parse(kind) else {
            debug!(kind, "unknown symbol kind");
            return Ok(None);
        };
        Ok(self.lookup(kind, name, parent).map(SymbolEntry::location))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, std::io::Write};

    const INDEX: &str = r#"{
        "procs": [
            { "name": "Initialize", "parent": "/atom", "path": "code\\game\\atoms.dm", "line": 120 },
            { "name": "Initialize", "parent": "/obj/item", "path": "code/game/objects/items.dm", "line": 55 }
        ],
        "vars": [
            { "name": "health", "parent": "/mob", "path": "code/modules/mob/mob.dm", "line": 7 }
        ]
    }"#;

    fn index() -> FileSymbolIndex {
        FileSymbolIndex::from_json(INDEX).unwrap()
    }

    #[test]
    fn kind_parsing() {
        assert_eq!(SymbolKind::parse("proc"), Some(SymbolKind::Proc));
        assert_eq!(SymbolKind::parse("VARS"), Some(SymbolKind::Var));
        assert_eq!(SymbolKind::parse("verb"), None);
    }

    #[tokio::test]
    async fn finds_first_definition_without_parent() {
        let found = index()
            .find_definition("Initialize", "proc", None)
            .await
            .unwrap();
        assert_eq!(found.as_deref(), Some("code/game/atoms.dm:120"));
    }

    #[tokio::test]
    async fn parent_narrows_and_ignores_slashes() {
        let index = index();
        let found = index
            .find_definition("Initialize", "proc", Some("obj/item/"))
            .await
            .unwrap();
        assert_eq!(found.as_deref(), Some("code/game/objects/items.dm:55"));
        assert_eq!(
            index
                .find_definition("Initialize", "proc", Some("/turf"))
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn kind_separates_namespaces() {
        let index = index();
        assert_eq!(
            index.find_definition("health", "proc", None).await.unwrap(),
            None
        );
        assert_eq!(
            index
                .find_definition("health", "var", None)
                .await
                .unwrap()
                .as_deref(),
            Some("code/modules/mob/mob.dm:7")
        );
        assert_eq!(
            index.find_definition("health", "verb", None).await.unwrap(),
            None
        );
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(INDEX.as_bytes()).unwrap();
        let index = FileSymbolIndex::load(file.path()).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.source(), Some(file.path()));
    }

    #[test]
    fn load_reports_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        let err = FileSymbolIndex::load(file.path()).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = FileSymbolIndex::load(Path::new("/nonexistent/symbols.json")).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }
}
