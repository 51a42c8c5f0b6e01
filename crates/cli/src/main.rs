//! Feedstore - terminal client for ordering feed from the Feedstore backend.
//!
//! # Usage
//!
//! ```bash
//! # Backend URL from the environment (or .env)
//! FEEDSTORE_API_BASE_URL=https://example.com/webhook feedstore
//!
//! # Backend URL and timeout from flags, JSON logs on stderr
//! feedstore --api-base-url http://localhost:5678/webhook --timeout-secs 5 --log-json
//! ```
//!
//! Commands are read from stdin one per line; type `help` for the list.
//! Logs go to stderr so they do not interleave with command output.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::{self, Write};

use clap::Parser;
use feedstore_client::{ClientConfig, ConfigError, GatewayError, HttpGateway, Storefront};
use sentry::integrations::tracing as sentry_tracing;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{Flow, execute, parse_line};

#[derive(Parser)]
#[command(name = "feedstore")]
#[command(author, version, about = "Order feed products from the Feedstore backend")]
struct Cli {
    /// Backend base URL (overrides `FEEDSTORE_API_BASE_URL`)
    #[arg(long)]
    api_base_url: Option<String>,

    /// Per-request timeout in seconds (overrides `FEEDSTORE_HTTP_TIMEOUT_SECS`)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

/// Errors that end the program.
#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("could not create HTTP client: {0}")]
    Gateway(#[from] GatewayError),

    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(log_json: bool) {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "feedstore_client=info,feedstore_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(log_json.then(|| tracing_subscriber::fmt::layer().json().with_writer(io::stderr)))
        .with((!log_json).then(|| tracing_subscriber::fmt::layer().with_writer(io::stderr)))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config =
        match ClientConfig::from_env_with_overrides(cli.api_base_url.as_deref(), cli.timeout_secs)
        {
            Ok(config) => config,
            Err(e) => {
                let _ = writeln!(io::stderr(), "feedstore: {e}");
                std::process::exit(2);
            }
        };

    // Must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing(cli.log_json);

    if let Err(e) = run(&config).await {
        tracing::error!("Fatal: {e}");
        std::process::exit(1);
    }
}

async fn run(config: &ClientConfig) -> Result<(), CliError> {
    let gateway = HttpGateway::new(config)?;
    let storefront = Storefront::new(gateway);
    tracing::info!(api_base_url = %config.api_base_url, "Ready");

    {
        let mut out = io::stdout().lock();
        writeln!(out, "Feedstore client. Type 'help' for commands.")?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        {
            let mut out = io::stdout().lock();
            write!(out, "> ")?;
            out.flush()?;
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let mut out = io::stdout().lock();
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                writeln!(out, "{e}")?;
                continue;
            }
        };

        if execute(&storefront, command, &mut out).await? == Flow::Quit {
            break;
        }
    }

    storefront.logout();
    Ok(())
}
