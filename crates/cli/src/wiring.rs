//! Builds the long-lived pieces shared by every session from loaded config.

use std::{path::Path, sync::Arc};

use {anyhow::Context, tracing::info};

use {
    zbot_config::{ServerConfig, ZbotConfig},
    zbot_dispatch::{CommandTable, RouterConfig, Services, builtin_commands},
    zbot_github::GithubClient,
    zbot_service_traits::{CodeHost, NoopCodeHost, NoopSymbolIndex, SymbolIndex},
    zbot_symbols::FileSymbolIndex,
};

/// Code host and symbol index. Either falls back to its no-op variant when
/// the config leaves it unset.
pub fn build_services(config: &ZbotConfig) -> anyhow::Result<Services> {
    let code_host: Arc<dyn CodeHost> =
        if config.github.owner.is_empty() || config.github.repo.is_empty() {
            info!("no github repository configured; code lookups disabled");
            Arc::new(NoopCodeHost)
        } else {
            let client = GithubClient::from_config(&config.github)?;
            info!(
                owner = %config.github.owner,
                repo = %config.github.repo,
                branch = %config.github.branch,
                "github client ready"
            );
            Arc::new(client)
        };

    let symbols: Arc<dyn SymbolIndex> = match config.symbols.index_path.as_deref() {
        Some(path) => {
            let index = FileSymbolIndex::load(Path::new(path))
                .with_context(|| format!("loading symbol index {path}"))?;
            info!(path, entries = index.len(), "symbol index loaded");
            Arc::new(index)
        },
        None => Arc::new(NoopSymbolIndex),
    };

    Ok(Services::new(code_host, symbols))
}

pub fn build_table() -> anyhow::Result<CommandTable> {
    let table = CommandTable::builder()
        .commands(builtin_commands())
        .build()?;
    Ok(table)
}

/// Router settings for one server: global prefix and bound, per-server
/// ignore list.
pub fn router_config(config: &ZbotConfig, server: Option<&ServerConfig>) -> RouterConfig {
    RouterConfig {
        prefix: config.dispatch.prefix,
        max_references: config.dispatch.max_references,
        ignore_list: server.map(|s| s.ignore_list.clone()).unwrap_or_default(),
    }
}
