mod logging;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use setgrab_core::{
    load_config, load_setlist, validate_config, Config, IdentityChannel, Orchestrator,
    RunContext, SanitizedConfig, TorIdentityChannel, WebDriverSessionFactory,
};

/// Exit code for configuration or logging failures.
const SETUP_FAILURE: u8 = 1;
/// Exit code when the setlist or downloads folder is missing.
const PRECONDITION_FAILURE: u8 = 2;
/// Exit code when a second interrupt arrives before the run has stopped.
const FORCED_EXIT: u8 = 130;

#[derive(Parser)]
#[command(name = "setgrab", version, about = "Download a setlist through a browser routed over Tor")]
struct Cli {
    /// Configuration file
    #[arg(long, env = "SETGRAB_CONFIG", default_value = "config.toml")]
    config: PathBuf,
    /// Setlist file, overriding `setlist_path` from the config
    #[arg(long)]
    setlist: Option<PathBuf>,
    /// Parse and print the setlist without starting a browser
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(SETUP_FAILURE);
        }
    };

    if let Err(e) = logging::init(&config.logging) {
        eprintln!("Error: {:#}", e);
        return ExitCode::from(SETUP_FAILURE);
    }

    info!(
        "Configuration: {}",
        serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default()
    );

    if cli.dry_run {
        return dry_run(&config).await;
    }

    match run(config).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            ExitCode::from(SETUP_FAILURE)
        }
    }
}

fn load(cli: &Cli) -> Result<Config> {
    let mut config = load_config(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    if let Some(setlist) = &cli.setlist {
        config.setlist_path = setlist.clone();
    }
    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

async fn dry_run(config: &Config) -> ExitCode {
    let parsed = match load_setlist(&config.setlist_path).await {
        Ok(parsed) => parsed,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(PRECONDITION_FAILURE);
        }
    };

    for item in &parsed.setlist {
        println!("{}\t{}\t{}\t{}", item.line, item.artist, item.track, item.source_url);
    }
    for rejected in &parsed.rejected {
        warn!("line {} skipped: {}", rejected.line, rejected.reason);
    }
    info!(
        "{} item(s), {} line(s) skipped",
        parsed.setlist.len(),
        parsed.rejected.len()
    );
    ExitCode::SUCCESS
}

async fn run(config: Config) -> Result<u8> {
    let sessions = Arc::new(
        WebDriverSessionFactory::new(config.browser.clone(), config.downloads_folder_path.clone())
            .context("Failed to configure browser sessions")?,
    );
    let tor_managed = config.tor.launch_path.is_some();
    let identity = Arc::new(TorIdentityChannel::new(config.tor.clone()));

    let cancel = CancellationToken::new();
    let context =
        RunContext::new(config, sessions, identity.clone()).with_cancel(cancel.clone());
    let orchestrator = Orchestrator::new(context);

    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Interrupted, stopping after the current step (interrupt again to quit now)");
        cancel.cancel();
        shutdown_signal().await;
        warn!("Interrupted again, exiting");
        std::process::exit(i32::from(FORCED_EXIT));
    });

    let report = orchestrator.run_from_config().await;

    if tor_managed {
        if let Err(e) = identity.terminate().await {
            warn!("Failed to stop Tor: {}", e);
        }
    }

    if let Some(diagnostic) = &report.diagnostic {
        error!("Run ended {}: {}", report.status, diagnostic);
    }
    u8::try_from(report.exit_code()).context("Exit code out of range")
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
