//! Wiring configuration and concrete adapters into the update runs.

use log::debug;
use thiserror::Error;

use super::update::{Collaborators, UpdateError, UpdateOptions, UpdateOutcome};
use crate::config::{Config, ConfigError};
use crate::infrastructure::{
    CommandLockfileGenerator, GithubError, GithubPlatform, JsonFormatter, TerminalSelector,
};

/// Errors that can occur during command orchestration.
#[derive(Debug, Error)]
pub enum AppError {
    /// The configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The GitHub client could not be initialized.
    #[error(transparent)]
    Github(#[from] GithubError),

    /// The update run failed.
    #[error(transparent)]
    Update(#[from] UpdateError),
}

/// Hosting platforms turnup can publish to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlatformKind {
    /// github.com or a Github Enterprise server.
    #[default]
    Github,
}

/// Github client for the configured token and API root.
fn github(config: &Config) -> Result<GithubPlatform, GithubError> {
    let platform = GithubPlatform::new(config.settings.github_token.clone())?;
    Ok(match config.github_api_url() {
        Some(url) => {
            debug!("Using Github API at {url}");
            platform.with_api_base(url)
        }
        None => platform,
    })
}

/// Run a single package update against the configured platform.
///
/// # Errors
///
/// Returns [`AppError::Github`] if the platform client cannot be created.
/// Returns [`AppError::Update`] if the update run fails.
pub fn update(
    config: &Config,
    platform: PlatformKind,
    package_spec: &str,
    options: UpdateOptions,
) -> Result<UpdateOutcome, AppError> {
    let merged = config.merge_options(options);
    match platform {
        PlatformKind::Github => {
            let client = github(config)?;
            let collaborators = Collaborators {
                platform: &client,
                formatter: &JsonFormatter::default(),
                generator: &CommandLockfileGenerator::new(),
                selector: &TerminalSelector::new(),
            };
            Ok(super::update::update(package_spec, &collaborators, &merged)?)
        }
    }
}

/// Run an update of every dependency against the configured platform.
///
/// # Errors
///
/// Returns [`AppError::Github`] if the platform client cannot be created.
/// Returns [`AppError::Update`] if the update run fails.
pub fn update_all(
    config: &Config,
    platform: PlatformKind,
    options: UpdateOptions,
) -> Result<UpdateOutcome, AppError> {
    let merged = config.merge_options(options);
    match platform {
        PlatformKind::Github => {
            let client = github(config)?;
            let collaborators = Collaborators {
                platform: &client,
                formatter: &JsonFormatter::default(),
                generator: &CommandLockfileGenerator::new(),
                selector: &TerminalSelector::new(),
            };
            Ok(super::update::update_all(&collaborators, &merged)?)
        }
    }
}
