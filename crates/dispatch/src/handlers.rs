//! Built-in commands.
//!
//! The `resolve_*` functions are shared by the explicit command path and the
//! implicit reference scan, so a reference in chat and the matching command
//! produce the same reply.

use {
    futures::future::BoxFuture,
    tracing::{debug, warn},
};

use zbot_service_traits::ServiceResult;

use crate::{
    command::{Command, CommandContext, Services},
    reference::is_commit_hash,
};

/// The standard command set, in help-listing order.
pub fn builtin_commands() -> Vec<Command> {
    vec![
        Command::new("commit", "Usage: <cmd> <commit hash>", commit).requires_args(1),
        Command::new("kek", "kek", kek),
        Command::new("pr", "Usage: <cmd> <number>", pr).requires_args(1),
        Command::new(
            "sdef",
            "Usage: <cmd> <proc/var> <name> <parent type(if any)>",
            sdef,
        )
        .requires_args(2),
        Command::new(
            "sfile",
            "Usage: <cmd> <file name> <#L + line number(if any)>",
            sfile,
        )
        .requires_args(1),
        Command::new("shatree", "Returns the current tree's SHA.", shatree),
        Command::new(
            "shelp",
            "Usage: <cmd> <command(or none to display all available commands)>",
            shelp,
        ),
        Command::new(
            "update_tree",
            "Updates the current tree with configured repo's latest.",
            update_tree,
        ),
    ]
}

// ── Resolvers ───────────────────────────────────────────────────────────────

fn absorb<T>(lookup: &'static str, result: ServiceResult<Option<T>>) -> Option<T> {
    match result {
        Ok(found) => found,
        Err(e) => {
            warn!(lookup, error = %e, "collaborator lookup failed");
            None
        },
    }
}

pub async fn resolve_commit(services: &Services, hash: &str) -> Option<String> {
    absorb("commit", services.code_host.commit_url(hash).await)
}

pub async fn resolve_file(services: &Services, path: &str, line: Option<&str>) -> Option<String> {
    absorb("file", services.code_host.file_url(path, line).await)
}

pub async fn resolve_pr(services: &Services, number: u64, channel: &str) -> Option<String> {
    absorb("pr", services.code_host.pr_info(number, channel).await).map(|info| info.to_chat_line())
}

/// `#L42`, `#42`, `L42` or `42` → `42`.
fn parse_line_anchor(raw: &str) -> Option<&str> {
    let digits = raw.strip_prefix('#').unwrap_or(raw);
    let digits = digits.strip_prefix('L').unwrap_or(digits);
    (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())).then_some(digits)
}

// ── Handlers ────────────────────────────────────────────────────────────────

fn commit<'a>(ctx: &'a CommandContext<'a>) -> BoxFuture<'a, Option<String>> {
    Box::pin(async move {
        let hash = ctx.arg(1)?;
        if !is_commit_hash(hash) {
            debug!(arg = hash, "commit argument is not a hash");
            return None;
        }
        resolve_commit(ctx.services, hash).await
    })
}

fn kek<'a>(_ctx: &'a CommandContext<'a>) -> BoxFuture<'a, Option<String>> {
    Box::pin(async { Some("kek".to_string()) })
}

fn pr<'a>(ctx: &'a CommandContext<'a>) -> BoxFuture<'a, Option<String>> {
    Box::pin(async move {
        let raw = ctx.arg(1)?;
        let Ok(number) = raw.trim_start_matches('#').parse::<u64>() else {
            debug!(arg = raw, "pr argument is not a number");
            return None;
        };
        resolve_pr(ctx.services, number, ctx.channel).await
    })
}

fn sdef<'a>(ctx: &'a CommandContext<'a>) -> BoxFuture<'a, Option<String>> {
    Box::pin(async move {
        let kind = ctx.arg(1)?;
        let name = ctx.arg(2)?;
        let parent = ctx.arg(3);
        let location = absorb(
            "definition",
            ctx.services
                .symbols
                .find_definition(name, kind, parent)
                .await,
        )?;
        let location = location.replace('\\', "/");
        let url = match location.rsplit_once(':') {
            Some((file, line)) => ctx.services.code_host.blob_url(file, Some(line)),
            None => ctx.services.code_host.blob_url(&location, None),
        };
        Some(url)
    })
}

fn sfile<'a>(ctx: &'a CommandContext<'a>) -> BoxFuture<'a, Option<String>> {
    Box::pin(async move {
        let path = ctx.arg(1)?;
        let line = ctx.arg(2).and_then(parse_line_anchor);
        resolve_file(ctx.services, path, line).await
    })
}

fn shatree<'a>(ctx: &'a CommandContext<'a>) -> BoxFuture<'a, Option<String>> {
    Box::pin(async move { Some(format!("SHA: {}", ctx.services.code_host.tree_sha().await)) })
}

fn shelp<'a>(ctx: &'a CommandContext<'a>) -> BoxFuture<'a, Option<String>> {
    Box::pin(async move {
        match ctx.arg(1) {
            None => Some(ctx.table.help_listing()),
            Some(topic) => {
                let detail = ctx.table.help_detail(topic, ctx.prefix);
                if detail.is_none() {
                    debug!(topic, "help requested for unknown command");
                }
                detail
            },
        }
    })
}

fn update_tree<'a>(ctx: &'a CommandContext<'a>) -> BoxFuture<'a, Option<String>> {
    Box::pin(async move {
        let force = ctx.arg(1) == Some("force");
        let host = &ctx.services.code_host;
        let old = host.tree_sha().await;
        if let Err(e) = host.update_tree(force).await {
            warn!(force, error = %e, "tree update failed");
            return None;
        }
        let new = host.tree_sha().await;
        Some(format!("Tree updated.\nOld: {old} New: {new}"))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {
        super::*,
        crate::CommandTable,
        async_trait::async_trait,
        std::sync::{Arc, Mutex},
        zbot_service_traits::{CodeHost, PrInfo, ServiceError, SymbolIndex},
    };

    #[derive(Default)]
    struct FakeHost {
        calls: Mutex<Vec<String>>,
        sha: Mutex<String>,
        fail: bool,
    }

    impl FakeHost {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn record(&self, call: String) -> Result<(), ServiceError> {
            self.calls.lock().unwrap().push(call);
            if self.fail {
                return Err("boom".into());
            }
            Ok(())
        }
    }

    #[async_trait]
    impl CodeHost for FakeHost {
        async fn commit_url(&self, hash: &str) -> ServiceResult<Option<String>> {
            self.record(format!("commit {hash}"))?;
            Ok((hash != "fffff").then(|| format!("https://example.test/commit/{hash}")))
        }

        async fn file_url(&self, path: &str, line: Option<&str>) -> ServiceResult<Option<String>> {
            self.record(format!("file {path} {line:?}"))?;
            Ok(Some(self.blob_url(path, line)))
        }

        async fn pr_info(&self, number: u64, channel: &str) -> ServiceResult<Option<PrInfo>> {
            self.record(format!("pr {number} {channel}"))?;
            Ok((number == 12345).then(|| PrInfo {
                title: "Adds things".into(),
                number,
                author: "dev".into(),
                url: format!("https://example.test/pull/{number}"),
            }))
        }

        async fn tree_sha(&self) -> String {
            let sha = self.sha.lock().unwrap();
            if sha.is_empty() { "none".into() } else { sha.clone() }
        }

        async fn update_tree(&self, force: bool) -> ServiceResult<()> {
            self.record(format!("update {force}"))?;
            *self.sha.lock().unwrap() = "abc123".into();
            Ok(())
        }

        fn blob_url(&self, path: &str, line: Option<&str>) -> String {
            match line {
                Some(line) => format!("https://example.test/blob/master/{path}#L{line}"),
                None => format!("https://example.test/blob/master/{path}"),
            }
        }
    }

    struct FakeSymbols;

    #[async_trait]
    impl SymbolIndex for FakeSymbols {
        async fn find_definition(
            &self,
            name: &str,
            kind: &str,
            parent: Option<&str>,
        ) -> ServiceResult<Option<String>> {
            Ok(match (kind, name, parent) {
                ("proc", "Initialize", None) => Some(r"code\game\atoms.dm:120".into()),
                ("var", "health", Some("/mob")) => Some("code/modules/mob/mob.dm:7".into()),
                _ => None,
            })
        }
    }

    fn table() -> CommandTable {
        CommandTable::builder()
            .commands(builtin_commands())
            .build()
            .unwrap()
    }

    fn services(host: Arc<FakeHost>) -> Services {
        Services::new(host, Arc::new(FakeSymbols))
    }

    async fn run(services: &Services, line: &str) -> Option<String> {
        let args: Vec<String> = line.split_whitespace().map(String::from).collect();
        table().invoke(services, '!', "#dev", "alice", &args).await
    }

    fn calls(host: &FakeHost) -> Vec<String> {
        host.calls.lock().unwrap().clone()
    }

    #[test]
    fn builtin_table_order() {
        let keywords: Vec<&str> = table().keywords().collect();
        assert_eq!(keywords, vec![
            "commit",
            "kek",
            "pr",
            "sdef",
            "sfile",
            "shatree",
            "shelp",
            "update_tree"
        ]);
    }

    #[test]
    fn line_anchor_forms() {
        assert_eq!(parse_line_anchor("#L42"), Some("42"));
        assert_eq!(parse_line_anchor("#42"), Some("42"));
        assert_eq!(parse_line_anchor("L7"), Some("7"));
        assert_eq!(parse_line_anchor("#L"), None);
        assert_eq!(parse_line_anchor("#Lx"), None);
    }

    #[tokio::test]
    async fn kek_replies_kek() {
        let host = Arc::new(FakeHost::default());
        assert_eq!(run(&services(host), "kek").await.as_deref(), Some("kek"));
    }

    #[tokio::test]
    async fn bare_commit_shows_usage_without_lookup() {
        let host = Arc::new(FakeHost::default());
        let reply = run(&services(Arc::clone(&host)), "commit").await;
        assert_eq!(reply.as_deref(), Some("Usage: !commit <commit hash>"));
        assert!(calls(&host).is_empty());
    }

    #[tokio::test]
    async fn commit_hit_and_miss() {
        let host = Arc::new(FakeHost::default());
        let services = services(Arc::clone(&host));
        assert_eq!(
            run(&services, "commit a1b2c3").await.as_deref(),
            Some("https://example.test/commit/a1b2c3")
        );
        assert_eq!(run(&services, "commit fffff").await, None);
    }

    #[tokio::test]
    async fn commit_argument_must_be_a_hash() {
        let host = Arc::new(FakeHost::default());
        let services = services(Arc::clone(&host));
        assert_eq!(run(&services, "commit ../x").await, None);
        assert_eq!(run(&services, "commit ../../../../user").await, None);
        assert_eq!(run(&services, "commit main").await, None);
        assert!(calls(&host).is_empty());
    }

    #[tokio::test]
    async fn pr_formats_and_strips_hash() {
        let host = Arc::new(FakeHost::default());
        let services = services(Arc::clone(&host));
        assert_eq!(
            run(&services, "pr #12345").await.as_deref(),
            Some("\"Adds things\" (#12345) by dev - https://example.test/pull/12345")
        );
        assert_eq!(calls(&host), vec!["pr 12345 #dev"]);
    }

    #[tokio::test]
    async fn pr_non_numeric_is_silent() {
        let host = Arc::new(FakeHost::default());
        assert_eq!(run(&services(Arc::clone(&host)), "pr abc").await, None);
        assert!(calls(&host).is_empty());
    }

    #[tokio::test]
    async fn sdef_normalizes_separators() {
        let host = Arc::new(FakeHost::default());
        let services = services(host);
        assert_eq!(
            run(&services, "sdef proc Initialize").await.as_deref(),
            Some("https://example.test/blob/master/code/game/atoms.dm#L120")
        );
        assert_eq!(
            run(&services, "sdef var health /mob").await.as_deref(),
            Some("https://example.test/blob/master/code/modules/mob/mob.dm#L7")
        );
        assert_eq!(run(&services, "sdef proc Missing").await, None);
    }

    #[tokio::test]
    async fn sdef_needs_two_arguments() {
        let host = Arc::new(FakeHost::default());
        assert_eq!(
            run(&services(host), "sdef proc").await.as_deref(),
            Some("Usage: !sdef <proc/var> <name> <parent type(if any)>")
        );
    }

    #[tokio::test]
    async fn sfile_passes_line_anchor() {
        let host = Arc::new(FakeHost::default());
        let services = services(Arc::clone(&host));
        run(&services, "sfile atoms.dm #L10").await;
        run(&services, "sfile atoms.dm").await;
        assert_eq!(calls(&host), vec![
            "file atoms.dm Some(\"10\")",
            "file atoms.dm None"
        ]);
    }

    #[tokio::test]
    async fn shelp_listing_detail_and_unknown() {
        let host = Arc::new(FakeHost::default());
        let services = services(host);
        assert_eq!(
            run(&services, "shelp").await.as_deref(),
            Some("Available commands: commit, kek, pr, sdef, sfile, shatree, shelp, update_tree")
        );
        assert_eq!(
            run(&services, "shelp pr").await.as_deref(),
            Some("Usage: !pr <number>")
        );
        assert_eq!(run(&services, "shelp nothing").await, None);
    }

    #[tokio::test]
    async fn update_tree_reports_old_and_new() {
        let host = Arc::new(FakeHost::default());
        let services = services(Arc::clone(&host));
        assert_eq!(
            run(&services, "shatree").await.as_deref(),
            Some("SHA: none")
        );
        assert_eq!(
            run(&services, "update_tree force").await.as_deref(),
            Some("Tree updated.\nOld: none New: abc123")
        );
        assert_eq!(calls(&host), vec!["update true"]);
    }

    #[tokio::test]
    async fn collaborator_errors_are_absorbed() {
        let host = Arc::new(FakeHost::failing());
        let services = services(Arc::clone(&host));
        assert_eq!(run(&services, "commit a1b2c3").await, None);
        assert_eq!(run(&services, "pr 12345").await, None);
        assert_eq!(run(&services, "update_tree").await, None);
        assert_eq!(calls(&host).len(), 3);
    }
}
