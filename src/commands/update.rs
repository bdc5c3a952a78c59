//! The `update` and `update_all` runs.

use log::info;
use thiserror::Error;

use super::gather::gather;
use super::publish::{PublishError, PublishOptions, PublishReport, Publisher};
use crate::domain::{
    LockfileGenerator, ManifestFormatter, PackageSpec, PackageSpecError, Platform, PlatformError,
    Repository, SelectError, Selector, UpdateTarget, classify, with_manifest,
};

/// Options shared by `update` and `update_all`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Repositories to consider, as `owner/name`.
    pub repositories: Vec<String>,
    /// User or organization whose repositories are considered.
    pub owner: Option<String>,
    /// Skip lockfile regeneration.
    pub no_lockfile: bool,
    /// Do not open pull requests.
    pub no_pull_request: bool,
    /// Publish to every candidate without asking the operator.
    pub skip_selection: bool,
    /// Registry passed to the package manager.
    pub registry: Option<String>,
}

impl UpdateOptions {
    /// The subset of the options that the per-repository pipeline needs.
    fn publish_options(&self) -> PublishOptions {
        PublishOptions {
            no_lockfile: self.no_lockfile,
            no_pull_request: self.no_pull_request,
            registry: self.registry.clone(),
        }
    }
}

/// How a run ended when nothing went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// No repository needed the update.
    UpToDate,
    /// The operator did not choose any repository.
    NothingSelected,
    /// Every selected repository was published, in order.
    Published(Vec<PublishReport>),
}

/// Errors that end an update run.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// The package specifier could not be parsed.
    #[error(transparent)]
    InvalidPackageSpec(#[from] PackageSpecError),

    /// Neither the named repositories nor the owner yielded any repository.
    #[error("no repositories found")]
    NoRepositoriesFound,

    /// Gathering repositories or manifests failed.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// The operator could not be asked for a selection.
    #[error(transparent)]
    Select(#[from] SelectError),

    /// Publishing to a repository failed; later repositories were not attempted.
    #[error("failed to update {repository}")]
    Publish {
        /// Full name of the repository that failed.
        repository: String,
        /// What went wrong.
        #[source]
        source: PublishError,
    },
}

/// The collaborators an update run talks to.
pub struct Collaborators<'run, P, F, G, S> {
    /// Source of repositories and target of the updates.
    pub platform: &'run P,
    /// Renders updated manifests.
    pub formatter: &'run F,
    /// Regenerates lockfiles.
    pub generator: &'run G,
    /// Asks the operator which repositories to update.
    pub selector: &'run S,
}

/// Update one package, given as `name@version`, in every repository that depends on an
/// older declaration of it.
///
/// # Errors
///
/// Returns [`UpdateError::InvalidPackageSpec`] before any platform call if the specifier is invalid.
/// Returns [`UpdateError::NoRepositoriesFound`] if gathering yields nothing.
/// Returns [`UpdateError::Platform`] if repositories or manifests cannot be fetched.
/// Returns [`UpdateError::Select`] if the interactive selection fails.
/// Returns [`UpdateError::Publish`] for the first repository that fails to publish.
pub fn update<P, F, G, S>(
    package_spec: &str,
    collaborators: &Collaborators<'_, P, F, G, S>,
    options: &UpdateOptions,
) -> Result<UpdateOutcome, UpdateError>
where
    P: Platform,
    F: ManifestFormatter,
    G: LockfileGenerator,
    S: Selector,
{
    let spec = PackageSpec::parse(package_spec)?;
    info!("Looking for repositories depending on {}...", spec.name);

    let repositories = fetch_candidates(collaborators.platform, options)?;
    let candidates = classify(repositories, &spec.name, &spec.version);
    if candidates.is_empty() {
        info!("No repository needs {spec}.");
        return Ok(UpdateOutcome::UpToDate);
    }

    info!("Repositories to update to {spec}:");
    for repo in &candidates {
        if let Some(rel) = repo.dependency_relationship() {
            info!("~ {repo} ({} {})", rel.kind, rel.current_version);
        }
    }

    select_and_publish(&UpdateTarget::Package(spec), candidates, collaborators, options)
}

/// Update every dependency in every gathered repository that has a manifest.
///
/// # Errors
///
/// Returns [`UpdateError::NoRepositoriesFound`] if gathering yields nothing.
/// Returns [`UpdateError::Platform`] if repositories or manifests cannot be fetched.
/// Returns [`UpdateError::Select`] if the interactive selection fails.
/// Returns [`UpdateError::Publish`] for the first repository that fails to publish.
pub fn update_all<P, F, G, S>(
    collaborators: &Collaborators<'_, P, F, G, S>,
    options: &UpdateOptions,
) -> Result<UpdateOutcome, UpdateError>
where
    P: Platform,
    F: ManifestFormatter,
    G: LockfileGenerator,
    S: Selector,
{
    info!("Looking for repositories with a manifest...");

    let repositories = fetch_candidates(collaborators.platform, options)?;
    let candidates = with_manifest(repositories);
    if candidates.is_empty() {
        info!("No repository has a manifest to update.");
        return Ok(UpdateOutcome::UpToDate);
    }

    select_and_publish(&UpdateTarget::All, candidates, collaborators, options)
}

/// Gather repositories and attach their manifests.
fn fetch_candidates<P: Platform>(
    platform: &P,
    options: &UpdateOptions,
) -> Result<Vec<Repository>, UpdateError> {
    let repositories = gather(platform, &options.repositories, options.owner.as_deref())?;
    Ok(platform.fetch_package_definitions(repositories)?)
}

/// Ask for a selection unless skipped, then publish one repository at a time.
/// The first failure stops the run.
fn select_and_publish<P, F, G, S>(
    target: &UpdateTarget,
    candidates: Vec<Repository>,
    collaborators: &Collaborators<'_, P, F, G, S>,
    options: &UpdateOptions,
) -> Result<UpdateOutcome, UpdateError>
where
    P: Platform,
    F: ManifestFormatter,
    G: LockfileGenerator,
    S: Selector,
{
    let selected = if options.skip_selection {
        candidates
    } else {
        collaborators.selector.select(candidates)?
    };
    if selected.is_empty() {
        info!("No repositories selected.");
        return Ok(UpdateOutcome::NothingSelected);
    }

    let publisher = Publisher::new(
        collaborators.platform,
        collaborators.formatter,
        collaborators.generator,
    );
    let publish_options = options.publish_options();
    let total = selected.len();
    let mut reports = Vec::with_capacity(total);

    for (position, repository) in (1_usize..).zip(selected) {
        info!("[{position}/{total}] {repository}");
        let name = repository.full_name().to_owned();
        let report = publisher
            .publish(repository, target, &publish_options)
            .map_err(|source| UpdateError::Publish {
                repository: name,
                source,
            })?;
        reports.push(report);
    }

    info!(
        "{} repositor{} updated.",
        reports.len(),
        if reports.len() == 1 { "y" } else { "ies" }
    );
    Ok(UpdateOutcome::Published(reports))
}
