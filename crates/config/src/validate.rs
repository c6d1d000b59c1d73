//! Configuration validation.
//!
//! Validates TOML configuration files against the known schema, detects
//! unknown/misspelled fields, and reports values the bot cannot run with.

use std::{collections::HashMap, path::Path};

use secrecy::ExposeSecret;

use crate::schema::ZbotConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "dispatch",
    /// "server", "security", "file-ref"
    pub category: &'static str,
    /// Dotted path, e.g. "dispatch.prefix"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration file.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<std::path::PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

// ── Schema tree for unknown-field detection ─────────────────────────────────

enum KnownKeys {
    Struct(HashMap<&'static str, KnownKeys>),
    /// Dynamic keys (channel names, repository slugs) with scalar values.
    Map,
    Array(Box<KnownKeys>),
    Leaf,
}

fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Array, Leaf, Map, Struct};

    let server = Struct(HashMap::from([
        ("name", Leaf),
        ("host", Leaf),
        ("port", Leaf),
        (
            "info",
            Struct(HashMap::from([
                ("nickname", Leaf),
                ("alt_nickname", Leaf),
                ("realname", Leaf),
                ("username", Leaf),
            ])),
        ),
        (
            "nickserv",
            Struct(HashMap::from([("enabled", Leaf), ("password", Leaf)])),
        ),
        ("channels", Leaf),
        ("ignore_list", Leaf),
        ("reconnect_delay_secs", Leaf),
    ]));

    Struct(HashMap::from([
        (
            "dispatch",
            Struct(HashMap::from([("prefix", Leaf), ("max_references", Leaf)])),
        ),
        (
            "github",
            Struct(HashMap::from([
                ("owner", Leaf),
                ("repo", Leaf),
                ("branch", Leaf),
                ("token", Leaf),
                ("api_url", Leaf),
                ("web_url", Leaf),
                ("channel_repos", Map),
            ])),
        ),
        ("symbols", Struct(HashMap::from([("index_path", Leaf)]))),
        (
            "webhook",
            Struct(HashMap::from([
                ("enabled", Leaf),
                ("bind", Leaf),
                ("port", Leaf),
                ("secret", Leaf),
                ("channels", Leaf),
                ("repo_channels", Map),
            ])),
        ),
        ("servers", Array(Box::new(server))),
    ]))
}

// ── Levenshtein distance ────────────────────────────────────────────────────

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut curr = Vec::with_capacity(prev.len());
        curr.push(i + 1);
        for (j, cb) in b_chars.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != *cb);
            curr.push(substitution.min(prev[j + 1] + 1).min(curr[j] + 1));
        }
        prev = curr;
    }
    prev[b_chars.len()]
}

/// Closest candidate within `max_distance` edits, if any.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|c| (*c, levenshtein(needle, c)))
        .filter(|(_, d)| *d > 0 && *d <= max_distance)
        .min_by_key(|(_, d)| *d)
        .map(|(c, _)| c)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or the discovered config file
/// if `path` is `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => crate::loader::find_config_file(),
    };

    let Some(ref actual_path) = config_path else {
        return ValidationResult {
            diagnostics: vec![Diagnostic {
                severity: Severity::Info,
                category: "file-ref",
                path: String::new(),
                message: "no config file found; using defaults".into(),
            }],
            config_path: None,
        };
    };

    let is_toml = actual_path
        .extension()
        .and_then(|e| e.to_str())
        .is_none_or(|ext| ext == "toml");

    let mut result = if is_toml {
        match std::fs::read_to_string(actual_path) {
            Ok(content) => validate_toml_str(&crate::env_subst::substitute_env(&content)),
            Err(e) => ValidationResult {
                diagnostics: vec![Diagnostic {
                    severity: Severity::Error,
                    category: "syntax",
                    path: String::new(),
                    message: format!("failed to read config file: {e}"),
                }],
                config_path: None,
            },
        }
    } else {
        // Field-level checks only exist for TOML; other formats get the
        // parse and semantic passes.
        let mut diagnostics = Vec::new();
        match crate::loader::load_config(actual_path) {
            Ok(config) => check_semantics(&config, &mut diagnostics),
            Err(e) => diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "type-error",
                path: String::new(),
                message: e.to_string(),
            }),
        }
        ValidationResult {
            diagnostics,
            config_path: None,
        }
    };

    result.config_path = Some(actual_path.clone());
    result
}

/// Validate a TOML string without touching the file system.
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    let mut diagnostics = Vec::new();

    let toml_value: toml::Value = match toml::from_str(toml_str) {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "syntax",
                path: String::new(),
                message: format!("TOML syntax error: {e}"),
            });
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    check_unknown_fields(&toml_value, &build_schema_map(), "", &mut diagnostics);

    match toml::from_str::<ZbotConfig>(toml_str) {
        Ok(config) => check_semantics(&config, &mut diagnostics),
        Err(e) => diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "type-error",
            path: String::new(),
            message: format!("type error: {e}"),
        }),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn check_unknown_fields(
    value: &toml::Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match (value, schema) {
        (toml::Value::Table(table), KnownKeys::Struct(fields)) => {
            let known_keys: Vec<&str> = fields.keys().copied().collect();
            for (key, child_value) in table {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                if let Some(child_schema) = fields.get(key.as_str()) {
                    check_unknown_fields(child_value, child_schema, &path, diagnostics);
                    continue;
                }
                let message = match suggest(key, &known_keys, 3) {
                    Some(s) => format!("unknown field (did you mean \"{s}\"?)"),
                    None => "unknown field".to_string(),
                };
                diagnostics.push(Diagnostic {
                    severity: Severity::Error,
                    category: "unknown-field",
                    path,
                    message,
                });
            }
        },
        (toml::Value::Array(items), KnownKeys::Array(item_schema)) => {
            for (i, item) in items.iter().enumerate() {
                check_unknown_fields(item, item_schema, &format!("{prefix}[{i}]"), diagnostics);
            }
        },
        // Dynamic maps, leaves and type mismatches stop here; type errors are
        // reported by the deserialization pass.
        _ => {},
    }
}

fn is_localhost(bind: &str) -> bool {
    matches!(bind, "127.0.0.1" | "localhost" | "::1")
}

/// Run semantic checks on a successfully parsed config.
fn check_semantics(config: &ZbotConfig, diagnostics: &mut Vec<Diagnostic>) {
    if config.dispatch.prefix.is_whitespace() {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "dispatch",
            path: "dispatch.prefix".into(),
            message: "command prefix must not be whitespace".into(),
        });
    }

    if config.dispatch.max_references == 0 {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "dispatch",
            path: "dispatch.max_references".into(),
            message: "max_references is 0; embedded references will never be resolved".into(),
        });
    }

    if config.servers.is_empty() {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "server",
            path: "servers".into(),
            message: "no [[servers]] configured; the bot has nothing to connect to".into(),
        });
    }

    for (i, server) in config.servers.iter().enumerate() {
        if server.host.trim().is_empty() {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "server",
                path: format!("servers[{i}].host"),
                message: format!("server \"{}\" has no host", server.name),
            });
        }
        if server.nickserv.enabled && server.nickserv.password.expose_secret().is_empty() {
            diagnostics.push(Diagnostic {
                severity: Severity::Warning,
                category: "server",
                path: format!("servers[{i}].nickserv.password"),
                message: "nickserv is enabled but no password is set".into(),
            });
        }
        if server.info.nickname == server.info.alt_nickname {
            diagnostics.push(Diagnostic {
                severity: Severity::Warning,
                category: "server",
                path: format!("servers[{i}].info.alt_nickname"),
                message: "alt_nickname equals nickname; a nick collision cannot be resolved"
                    .into(),
            });
        }
    }

    if (config.github.owner.is_empty() || config.github.repo.is_empty())
        && !config.servers.is_empty()
    {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "server",
            path: "github".into(),
            message: "github.owner/github.repo not set; reference lookups will all miss".into(),
        });
    }

    if config.webhook.enabled && config.webhook.secret.is_none() && !is_localhost(&config.webhook.bind)
    {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "security",
            path: "webhook.secret".into(),
            message: format!(
                "webhook listens on {} without a secret; anyone can post events",
                config.webhook.bind
            ),
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const MINIMAL: &str = r##"
[github]
owner = "tgstation"
repo = "tgstation"

[[servers]]
name = "rizon"
host = "irc.rizon.net"
channels = ["#coderbus"]
"##;

    #[test]
    fn minimal_config_is_clean() {
        let result = validate_toml_str(MINIMAL);
        assert!(
            result.diagnostics.is_empty(),
            "unexpected diagnostics: {:?}",
            result.diagnostics
        );
    }

    #[test]
    fn syntax_error_reported() {
        let result = validate_toml_str("[dispatch\nprefix = ");
        assert!(result.has_errors());
        assert_eq!(result.diagnostics[0].category, "syntax");
    }

    #[test]
    fn misspelled_field_gets_suggestion() {
        let toml = format!("{MINIMAL}\n[dispatch]\nmax_refrences = 2\n");
        let result = validate_toml_str(&toml);
        let diag = result
            .diagnostics
            .iter()
            .find(|d| d.path == "dispatch.max_refrences")
            .expect("unknown field diagnostic");
        assert!(diag.message.contains("max_references"), "{}", diag.message);
    }

    #[test]
    fn unknown_field_inside_server_array() {
        let toml = format!("{MINIMAL}nick = \"Relay\"\n");
        let result = validate_toml_str(&toml);
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.path == "servers[0].nick" && d.category == "unknown-field")
        );
    }

    #[test]
    fn channel_repo_keys_are_free_form() {
        let toml = format!("{MINIMAL}\n[github.channel_repos]\n\"#dev\" = \"a/b\"\n");
        let result = validate_toml_str(&toml);
        assert!(!result.has_errors(), "{:?}", result.diagnostics);
    }

    #[test]
    fn wrong_type_is_type_error() {
        let toml = format!("{MINIMAL}\n[dispatch]\nmax_references = \"three\"\n");
        let result = validate_toml_str(&toml);
        assert!(result.diagnostics.iter().any(|d| d.category == "type-error"));
    }

    #[test]
    fn missing_servers_is_error() {
        let result = validate_toml_str("[github]\nowner = \"a\"\nrepo = \"b\"\n");
        assert!(result.diagnostics.iter().any(|d| d.path == "servers"));
    }

    #[test]
    fn nickserv_without_password_warned() {
        let toml = format!("{MINIMAL}\n[servers.nickserv]\nenabled = true\n");
        let result = validate_toml_str(&toml);
        assert!(result.diagnostics.iter().any(|d| {
            d.severity == Severity::Warning && d.path == "servers[0].nickserv.password"
        }));
    }

    #[test]
    fn public_webhook_without_secret_warned() {
        let toml = format!("{MINIMAL}\n[webhook]\nenabled = true\nbind = \"0.0.0.0\"\n");
        let result = validate_toml_str(&toml);
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.category == "security" && d.path == "webhook.secret")
        );
    }

    #[test]
    fn zero_max_references_warned() {
        let toml = format!("{MINIMAL}\n[dispatch]\nmax_references = 0\n");
        let result = validate_toml_str(&toml);
        assert_eq!(result.count(Severity::Warning), 1);
    }

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
    }
}
