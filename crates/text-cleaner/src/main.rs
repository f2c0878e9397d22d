mod cli;
mod config;
mod host;
mod io;
mod watch;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use run_journal::Journal;
use text_normalizer::Normalizer;

use crate::cli::Cli;
use crate::config::Config;
use crate::host::Host;
use crate::io::InputSource;
use crate::watch::WatchSettings;

fn init_tracing(cfg: &Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.logging.level));

    // stdout carries the cleaned text, so logs go to stderr.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    if cfg.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Spawn a task that broadcasts once on ctrl-c or SIGTERM.
fn spawn_shutdown_listener() -> tokio::sync::broadcast::Sender<()> {
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (ctrl-c)"),
                        _ = sigterm.recv() => info!("received SIGTERM"),
                    }
                }
                Err(err) => {
                    warn!(%err, "failed to register SIGTERM handler");
                    ctrl_c.await.ok();
                    info!("received SIGINT (ctrl-c)");
                }
            }
        }

        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
            info!("received SIGINT (ctrl-c)");
        }

        let _ = signal_tx.send(());
    });

    shutdown_tx
}

async fn run(cli: &Cli, cfg: &Config, host: &Host) -> Result<()> {
    if cli.watch {
        let input = cli
            .input
            .clone()
            .context("--watch needs an input file")?;
        watch::check_input(&input)?;

        let settings = WatchSettings {
            poll_interval: cfg.watch.poll_interval(),
            debounce: cfg.watch.debounce(),
        };
        let shutdown_tx = spawn_shutdown_listener();
        watch::run(
            host,
            settings,
            input,
            cli.output.clone(),
            shutdown_tx.subscribe(),
        )
        .await?;
        return Ok(());
    }

    let input = InputSource::from_arg(cli.input.as_deref());
    host.clean_once(&input, cli.output.as_deref()).await
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Parse CLI args.
    let cli = Cli::parse();

    // 2. Load config, then merge CLI overrides.
    let loaded = config::load(&cli.config)?;
    let config_found = loaded.is_some();
    let mut cfg = loaded.unwrap_or_default();

    if let Some(ref level) = cli.log_level {
        cfg.logging.level = level.clone();
    }
    if let Some(ref journal) = cli.journal {
        cfg.journal.path = journal.clone();
        cfg.journal.enabled = true;
    }

    // 3. Logging.
    init_tracing(&cfg);

    if !config_found {
        warn!(
            path = %cli.config.display(),
            "configuration file not found; using defaults"
        );
    }

    info!(
        config_file = %cli.config.display(),
        watch = cli.watch,
        journal = cfg.journal.enabled,
        max_input_bytes = cfg.limits.max_input_bytes,
        "text-cleaner starting"
    );

    // 4. Journal.
    let journal = if cfg.journal.enabled {
        let journal = Journal::open(&cfg.journal.path).context("failed to open journal")?;
        info!(path = %journal.path().display(), "journaling runs");
        Some(journal)
    } else {
        None
    };

    // 5. Compile the rules.
    let normalizer = Normalizer::new().context("failed to compile cleaning rules")?;
    info!(rules = ?normalizer.rule_names(), "cleaning pipeline ready");

    let host = Host::new(
        normalizer,
        journal,
        cfg.limits.max_input_bytes,
        cli.report,
    );

    // 6. Do the work.
    run(&cli, &cfg, &host).await
}
