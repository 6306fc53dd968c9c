pub mod cli;
pub mod commands;
pub mod config;
pub mod data;
pub mod error;
pub mod models;
pub mod runtime;
pub mod scope_path;
pub mod services;
pub mod shell;
pub mod state;
pub mod ui;

#[cfg(test)]
pub(crate) mod testutil;

use std::io::{BufRead, Write};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use commands::update_commands::{self, UpdateOutcome};
use config::{AppConfig, AppPaths, APP_VERSION};
use models::version::VersionDescriptor;
use services::preview_service::PdftoppmRenderer;
use services::update_service::UpdateInstaller;
use state::AppState;

fn init_logging(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn ask_to_install(descriptor: &VersionDescriptor) -> bool {
    print!(
        "pdfhub {} is available (running {APP_VERSION}). Install now? [y/N] ",
        descriptor.version
    );
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match std::io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

/// Returns `true` when the process should exit so the helper can swap the binary.
fn run_startup_update(cli: &Cli, config: &AppConfig) -> bool {
    let timeout = Duration::from_secs(config.update_timeout_secs.max(1));
    let installer = match UpdateInstaller::for_current_process(timeout) {
        Ok(installer) => installer,
        Err(e) => {
            tracing::warn!("update check skipped: {e}");
            return false;
        }
    };

    let outcome = if cli.yes {
        update_commands::startup_update(config, APP_VERSION, &installer, |_| true)
    } else {
        update_commands::startup_update(config, APP_VERSION, &installer, ask_to_install)
    };

    match outcome {
        UpdateOutcome::Skipped | UpdateOutcome::UpToDate => false,
        UpdateOutcome::Declined(version) => {
            println!("Keeping {APP_VERSION}; {version} can be installed on next start.");
            false
        }
        UpdateOutcome::HandedOff(version) => {
            println!("Installing {version}. pdfhub will restart in a moment.");
            true
        }
        UpdateOutcome::Failed(e) => {
            eprintln!("Update failed, continuing with {APP_VERSION}: {e}");
            false
        }
    }
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let paths = AppPaths::resolve(cli.config_dir.as_deref())
        .context("failed to resolve the config directory")?;
    let mut config = AppConfig::load(&paths.config_dir)
        .with_context(|| format!("failed to load config from {}", paths.config_dir.display()))?;
    if let Some(url) = &cli.update_url {
        config.update_url = url.clone();
    }
    tracing::info!(config_dir = %paths.config_dir.display(), version = APP_VERSION, "starting");

    if !cli.no_update && run_startup_update(&cli, &config) {
        std::process::exit(0);
    }

    let renderer = PdftoppmRenderer::new(std::env::temp_dir());
    let mut state = AppState::new(config, paths, Box::new(renderer))
        .context("failed to open the folder index")?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the event loop")?;
    let result = rt.block_on(runtime::run_event_loop(&mut state));
    // The stdin reader sits on a blocking thread that never returns on its own.
    rt.shutdown_background();
    result?;

    state.shutdown().context("failed to save the folder index")?;
    Ok(())
}
