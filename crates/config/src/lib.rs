//! Configuration loading, validation, and env substitution.
//!
//! Config files: `zbot.toml`, `zbot.yaml`, or `zbot.json`
//! Searched in `./` then `~/.config/zbot/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{config_dir, discover_and_load, load_config},
    schema::{
        DispatchConfig, GithubConfig, IdentityConfig, NickservConfig, ServerConfig,
        SymbolsConfig, WebhookConfig, ZbotConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult},
};
