mod config_commands;
mod scan;
mod wiring;

use std::{path::PathBuf, sync::Arc, time::Duration};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    tracing::{error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    zbot_config::ZbotConfig,
    zbot_dispatch::MessageRouter,
    zbot_irc::{IrcSession, start_session},
    zbot_webhook::WebhookState,
};

/// Time sessions get to send `QUIT` after shutdown is requested.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

#[derive(Parser)]
#[command(name = "zbot", about = "zbot, an IRC bot for GitHub references and events")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery in ./ and ~/.config/zbot/).
    #[arg(long, global = true, env = "ZBOT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to every configured server and serve webhooks (default).
    Run,
    /// Validate the configuration file and report errors/warnings.
    CheckConfig {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
    /// Run one chat line through the router and print the replies.
    Scan {
        /// The line, as it would appear in a channel.
        text: String,
        #[arg(long, default_value = "#scan")]
        channel: String,
        #[arg(long, default_value = "you!you@localhost")]
        user: String,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ZbotConfig> {
    match cli.config.as_deref() {
        Some(path) => zbot_config::load_config(path),
        None => Ok(zbot_config::discover_and_load()),
    }
}

async fn run(config: ZbotConfig) -> anyhow::Result<()> {
    if config.servers.is_empty() {
        anyhow::bail!("no servers configured; add a [[servers]] entry");
    }

    let services = Arc::new(wiring::build_services(&config)?);
    let table = Arc::new(wiring::build_table()?);

    let mut tokens = Vec::with_capacity(config.servers.len());
    let mut relays = Vec::with_capacity(config.servers.len());
    for server in &config.servers {
        let session = Arc::new(IrcSession::new(server.clone()));
        let relay = session.relay();
        let router = MessageRouter::new(
            Arc::clone(&table),
            Arc::clone(&services),
            relay.clone(),
            wiring::router_config(&config, Some(server)),
        );
        relays.push(relay);
        tokens.push(start_session(session, router));
    }
    info!(sessions = tokens.len(), "sessions started");

    let webhook = if config.webhook.enabled {
        let state = WebhookState::from_config(&config.webhook, relays);
        let webhook_config = config.webhook.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = zbot_webhook::serve(&webhook_config, state).await {
                error!(error = %e, "webhook server stopped");
            }
        }))
    } else {
        None
    };

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("shutdown requested");

    for token in &tokens {
        token.cancel();
    }
    if let Some(handle) = webhook {
        handle.abort();
    }
    tokio::time::sleep(SHUTDOWN_GRACE).await;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "zbot starting");

    match cli.command {
        None | Some(Commands::Run) => {
            let config = load_config(&cli)?;
            let validation = zbot_config::validate::validate(cli.config.as_deref());
            for d in validation
                .diagnostics
                .iter()
                .filter(|d| d.severity != zbot_config::Severity::Info)
            {
                warn!(severity = %d.severity, path = %d.path, "{}", d.message);
            }
            run(config).await
        },
        Some(Commands::CheckConfig { verbose }) => {
            config_commands::check(cli.config.as_deref(), verbose)
        },
        Some(Commands::Scan {
            ref text,
            ref channel,
            ref user,
        }) => {
            let config = load_config(&cli)?;
            scan::scan_line(&config, channel, user, text).await
        },
    }
}
