//! GitHub event → chat line.

use std::collections::HashMap;

use {serde_json::Value, tracing::debug};

use {zbot_channels::OutboundEvent, zbot_config::WebhookConfig};

/// Turns webhook payloads into outbound events and picks target channels.
///
/// Events for a repository listed in `repo_channels` go to those channels;
/// everything else goes to the default channel list.
#[derive(Debug, Clone, Default)]
pub struct EventNormalizer {
    default_channels: Vec<String>,
    repo_channels: HashMap<String, Vec<String>>,
}

impl EventNormalizer {
    pub fn new(default_channels: Vec<String>, repo_channels: HashMap<String, Vec<String>>) -> Self {
        Self {
            default_channels,
            repo_channels,
        }
    }

    pub fn from_config(config: &WebhookConfig) -> Self {
        Self::new(config.channels.clone(), config.repo_channels.clone())
    }

    pub fn channels_for(&self, repo: Option<&str>) -> Vec<String> {
        repo.and_then(|r| self.repo_channels.get(r))
            .unwrap_or(&self.default_channels)
            .clone()
    }

    /// Normalize one delivery. Unsupported event types and uninteresting
    /// actions produce a silent event.
    pub fn normalize(&self, event_type: &str, payload: &Value) -> OutboundEvent {
        let repo = str_at(payload, &["repository", "full_name"]);
        let channels = self.channels_for(repo);
        let message = match event_type {
            "push" => format_push(payload),
            "pull_request" => format_pull_request(payload),
            "issues" => format_issue(payload),
            "issue_comment" => format_issue_comment(payload),
            "release" => format_release(payload),
            _ => None,
        };
        match message {
            Some(body) => {
                let line = match repo {
                    Some(repo) => format!("[{repo}] {body}"),
                    None => body,
                };
                OutboundEvent::new(channels, line)
            },
            None => {
                debug!(event_type, repo, "event has no chat rendering");
                OutboundEvent {
                    channels,
                    message: None,
                }
            },
        }
    }
}

fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(value, |v, key| v.get(key))
        .and_then(Value::as_str)
}

fn u64_at(value: &Value, path: &[&str]) -> Option<u64> {
    path.iter()
        .try_fold(value, |v, key| v.get(key))
        .and_then(Value::as_u64)
}

fn format_push(p: &Value) -> Option<String> {
    let pusher = str_at(p, &["pusher", "name"])
        .or_else(|| str_at(p, &["sender", "login"]))
        .unwrap_or("someone");
    let branch = str_at(p, &["ref"])?;
    let branch = branch.strip_prefix("refs/heads/").unwrap_or(branch);
    if p.get("deleted").and_then(Value::as_bool) == Some(true) {
        return Some(format!("{pusher} deleted {branch}"));
    }
    let count = p
        .get("commits")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    if count == 0 {
        return None;
    }
    let noun = if count == 1 { "commit" } else { "commits" };
    let mut line = format!("{pusher} pushed {count} {noun} to {branch}");
    if let Some(compare) = str_at(p, &["compare"]) {
        line.push_str(&format!(": {compare}"));
    }
    Some(line)
}

fn format_pull_request(p: &Value) -> Option<String> {
    let action = match str_at(p, &["action"])? {
        "closed" if p["pull_request"]["merged"].as_bool() == Some(true) => "merged",
        a @ ("opened" | "closed" | "reopened") => a,
        _ => return None,
    };
    let user = str_at(p, &["sender", "login"]).unwrap_or("someone");
    let number = u64_at(p, &["pull_request", "number"])?;
    let title = str_at(p, &["pull_request", "title"]).unwrap_or_default();
    let url = str_at(p, &["pull_request", "html_url"]).unwrap_or_default();
    Some(format!(
        "{user} {action} pull request #{number}: {title} - {url}"
    ))
}

fn format_issue(p: &Value) -> Option<String> {
    let action = match str_at(p, &["action"])? {
        a @ ("opened" | "closed" | "reopened") => a,
        _ => return None,
    };
    let user = str_at(p, &["sender", "login"]).unwrap_or("someone");
    let number = u64_at(p, &["issue", "number"])?;
    let title = str_at(p, &["issue", "title"]).unwrap_or_default();
    let url = str_at(p, &["issue", "html_url"]).unwrap_or_default();
    Some(format!("{user} {action} issue #{number}: {title} - {url}"))
}

fn format_issue_comment(p: &Value) -> Option<String> {
    if str_at(p, &["action"])? != "created" {
        return None;
    }
    let user = str_at(p, &["comment", "user", "login"])
        .or_else(|| str_at(p, &["sender", "login"]))
        .unwrap_or("someone");
    let number = u64_at(p, &["issue", "number"])?;
    let title = str_at(p, &["issue", "title"]).unwrap_or_default();
    let url = str_at(p, &["comment", "html_url"]).unwrap_or_default();
    Some(format!("{user} commented on #{number}: {title} - {url}"))
}

fn format_release(p: &Value) -> Option<String> {
    if str_at(p, &["action"])? != "published" {
        return None;
    }
    let user = str_at(p, &["sender", "login"]).unwrap_or("someone");
    let tag = str_at(p, &["release", "tag_name"])?;
    let url = str_at(p, &["release", "html_url"]).unwrap_or_default();
    match str_at(p, &["release", "name"]).filter(|n| !n.is_empty() && *n != tag) {
        Some(name) => Some(format!("{user} published release {tag} ({name}) - {url}")),
        None => Some(format!("{user} published release {tag} - {url}")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, serde_json::json};

    fn normalizer() -> EventNormalizer {
        EventNormalizer::new(
            vec!["#dev".into()],
            HashMap::from([("o/special".to_string(), vec!["#special".to_string()])]),
        )
    }

    #[test]
    fn push_with_commits() {
        let payload = json!({
            "ref": "refs/heads/master",
            "compare": "https://github.com/o/r/compare/a...b",
            "repository": { "full_name": "o/r" },
            "pusher": { "name": "dev" },
            "commits": [{}, {}]
        });
        let event = normalizer().normalize("push", &payload);
        assert_eq!(event.channels, vec!["#dev"]);
        assert_eq!(
            event.message.as_deref(),
            Some("[o/r] dev pushed 2 commits to master: https://github.com/o/r/compare/a...b")
        );
    }

    #[test]
    fn push_without_commits_is_silent() {
        let payload = json!({ "ref": "refs/tags/v1", "commits": [] });
        assert_eq!(normalizer().normalize("push", &payload).message, None);
    }

    #[test]
    fn merged_pull_request_routed_by_repo() {
        let payload = json!({
            "action": "closed",
            "repository": { "full_name": "o/special" },
            "sender": { "login": "maint" },
            "pull_request": {
                "number": 12345,
                "title": "Fix atmos",
                "merged": true,
                "html_url": "https://github.com/o/special/pull/12345"
            }
        });
        let event = normalizer().normalize("pull_request", &payload);
        assert_eq!(event.channels, vec!["#special"]);
        assert_eq!(
            event.message.as_deref(),
            Some(
                "[o/special] maint merged pull request #12345: Fix atmos - https://github.com/o/special/pull/12345"
            )
        );
    }

    #[test]
    fn uninteresting_pull_request_action_is_silent() {
        let payload = json!({
            "action": "labeled",
            "pull_request": { "number": 1, "title": "x" }
        });
        assert_eq!(normalizer().normalize("pull_request", &payload).message, None);
    }

    #[test]
    fn issue_opened() {
        let payload = json!({
            "action": "opened",
            "sender": { "login": "player" },
            "issue": { "number": 77, "title": "Crash on round start", "html_url": "u" }
        });
        assert_eq!(
            normalizer().normalize("issues", &payload).message.as_deref(),
            Some("player opened issue #77: Crash on round start - u")
        );
    }

    #[test]
    fn issue_comment_created() {
        let payload = json!({
            "action": "created",
            "repository": { "full_name": "o/r" },
            "issue": { "number": 5, "title": "Bug" },
            "comment": { "user": { "login": "helper" }, "html_url": "c" }
        });
        assert_eq!(
            normalizer()
                .normalize("issue_comment", &payload)
                .message
                .as_deref(),
            Some("[o/r] helper commented on #5: Bug - c")
        );
    }

    #[test]
    fn release_published() {
        let payload = json!({
            "action": "published",
            "sender": { "login": "rel" },
            "release": { "tag_name": "v2.0", "name": "Big one", "html_url": "r" }
        });
        assert_eq!(
            normalizer().normalize("release", &payload).message.as_deref(),
            Some("rel published release v2.0 (Big one) - r")
        );
    }

    #[test]
    fn ping_and_unknown_are_silent() {
        let n = normalizer();
        assert_eq!(n.normalize("ping", &json!({ "zen": "hi" })).message, None);
        assert_eq!(n.normalize("watch", &json!({})).message, None);
    }
}
