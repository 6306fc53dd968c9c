use std::time::Duration;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::version::{Version, VersionDescriptor};
use crate::services::update_service::{self, UpdateInstaller};

#[derive(Debug)]
pub enum UpdateOutcome {
    Skipped,
    UpToDate,
    Declined(Version),
    /// The helper is running; the caller must exit the process now.
    HandedOff(Version),
    Failed(AppError),
}

/// Startup update flow: check, ask, install. Runs before the event loop.
pub fn startup_update<F>(
    config: &AppConfig,
    current_version: &str,
    installer: &UpdateInstaller,
    confirm: F,
) -> UpdateOutcome
where
    F: FnOnce(&VersionDescriptor) -> bool,
{
    if config.update_url.trim().is_empty() {
        return UpdateOutcome::Skipped;
    }

    let timeout = Duration::from_secs(config.update_timeout_secs.max(1));
    let Some(descriptor) = update_service::check(&config.update_url, current_version, timeout)
    else {
        return UpdateOutcome::UpToDate;
    };

    if !confirm(&descriptor) {
        tracing::info!(version = %descriptor.version, "update declined");
        return UpdateOutcome::Declined(descriptor.version);
    }

    match installer.install(&descriptor) {
        Ok(()) => UpdateOutcome::HandedOff(descriptor.version),
        Err(e) => UpdateOutcome::Failed(e.logged()),
    }
}
