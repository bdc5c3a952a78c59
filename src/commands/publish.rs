//! Publishing an update to a single repository.

use log::{debug, info};
use thiserror::Error;

use crate::domain::{
    Commit, FileChange, FormatError, LockfileError, LockfileGenerator, MANIFEST_FILE_NAME,
    Manifest, ManifestFormatter, Platform, PlatformError, PullRequest, PullRequestDraft,
    Repository, UpdateTarget,
};

/// Switches for the optional publish steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishOptions {
    /// Skip lockfile regeneration.
    pub no_lockfile: bool,
    /// Stop after committing, without opening a pull request.
    pub no_pull_request: bool,
    /// Registry passed to the package manager when regenerating lockfiles.
    pub registry: Option<String>,
}

/// What was published for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    /// Full name of the repository.
    pub repository: String,
    /// Branch the update was pushed to.
    pub branch: String,
    /// Whether a regenerated lockfile was written to the branch.
    pub lockfile_updated: bool,
    /// The pull request, unless it was skipped.
    pub pull_request: Option<PullRequest>,
}

/// Errors that can occur while publishing an update to one repository.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The repository has no manifest to update.
    #[error("{repository} has no {MANIFEST_FILE_NAME}")]
    MissingManifest {
        /// Full name of the repository.
        repository: String,
    },

    /// The repository was never matched against the package being updated.
    #[error("{repository} has no recorded dependency on the package")]
    NotClassified {
        /// Full name of the repository.
        repository: String,
    },

    /// The manifest could not be formatted.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// The lockfile could not be regenerated.
    #[error(transparent)]
    Lockfile(#[from] LockfileError),

    /// The platform rejected a request.
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Drives one repository through manifest update, lockfile regeneration, branch,
/// commit and pull request.
pub struct Publisher<'run, P, F, G> {
    /// Where branches, commits and pull requests go.
    platform: &'run P,
    /// Renders the updated manifest.
    formatter: &'run F,
    /// Regenerates lockfiles.
    generator: &'run G,
}

impl<'run, P, F, G> Publisher<'run, P, F, G>
where
    P: Platform,
    F: ManifestFormatter,
    G: LockfileGenerator,
{
    /// Publisher over the given collaborators.
    #[must_use]
    pub fn new(platform: &'run P, formatter: &'run F, generator: &'run G) -> Self {
        Self {
            platform,
            formatter,
            generator,
        }
    }

    /// Publish `target` to `repository`. Each step runs only after the previous one succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::MissingManifest`] if the repository has no manifest.
    /// Returns [`PublishError::NotClassified`] if a single package update has no dependency relationship.
    /// Returns [`PublishError::Format`] if the manifest cannot be formatted.
    /// Returns [`PublishError::Lockfile`] if the lockfile cannot be regenerated.
    /// Returns [`PublishError::Platform`] if any platform call fails, except a missing lockfile.
    pub fn publish(
        &self,
        repository: Repository,
        target: &UpdateTarget,
        options: &PublishOptions,
    ) -> Result<PublishReport, PublishError> {
        info!("Updating {target} in {repository}");

        let manifest = updated_manifest(&repository, target)?;
        let formatted = self.formatter.format(&manifest)?;
        debug!("Formatted {MANIFEST_FILE_NAME} for {repository}");

        let (prepared, lockfile) = if options.no_lockfile {
            debug!("Skipping lockfile update for {repository}");
            (repository, None)
        } else {
            self.regenerate_lockfile(repository, &formatted, target, options.registry.as_deref())?
        };

        let branch = target.branch_name();
        self.platform.create_branch(&prepared, &branch)?;

        let commit = Commit {
            message: target.commit_message(),
            manifest: FileChange {
                path: MANIFEST_FILE_NAME.to_owned(),
                content: formatted,
            },
            lockfile,
        };
        let lockfile_updated = self
            .platform
            .commit_package_definition(&prepared, &branch, &commit)?;
        info!("Committed {target} to {prepared}@{branch}");

        let pull_request = if options.no_pull_request {
            debug!("Skipping pull request for {prepared}");
            None
        } else {
            let draft = PullRequestDraft {
                title: target.pull_request_title(),
                body: target.pull_request_body(&prepared, lockfile_updated),
            };
            let opened = self
                .platform
                .create_pull_request(&prepared, &branch, &draft)?;
            info!("Opened pull request {opened} on {prepared}");
            Some(opened)
        };

        Ok(PublishReport {
            repository: prepared.full_name().to_owned(),
            branch,
            lockfile_updated,
            pull_request,
        })
    }

    /// Fetch the current lockfile and regenerate it for the formatted manifest.
    ///
    /// A repository without a lockfile is published with the manifest alone.
    fn regenerate_lockfile(
        &self,
        repository: Repository,
        manifest: &str,
        target: &UpdateTarget,
        registry: Option<&str>,
    ) -> Result<(Repository, Option<FileChange>), PublishError> {
        let current = match self.platform.fetch_lockfile_definition(&repository) {
            Ok(found) => found,
            Err(e) if e.is_not_found() => {
                info!("No lockfile in {repository}, updating {MANIFEST_FILE_NAME} only");
                return Ok((repository, None));
            }
            Err(e) => return Err(e.into()),
        };

        let package_manager = current.package_manager;
        let path = current.file_name().to_owned();
        let with_lockfile = repository.with_lockfile(current);

        debug!("Regenerating {path} for {with_lockfile} with {package_manager}");
        let content = self.generator.generate(
            target.lockfile_strategy(),
            manifest,
            package_manager,
            registry,
        )?;

        Ok((with_lockfile, Some(FileChange { path, content })))
    }
}

/// The manifest to commit: the recorded dependency set to the target version, or
/// the manifest as fetched when updating everything.
fn updated_manifest(repository: &Repository, target: &UpdateTarget) -> Result<Manifest, PublishError> {
    let manifest = repository
        .manifest()
        .ok_or_else(|| PublishError::MissingManifest {
            repository: repository.full_name().to_owned(),
        })?;

    match target {
        UpdateTarget::Package(spec) => {
            let relationship =
                repository
                    .dependency_relationship()
                    .ok_or_else(|| PublishError::NotClassified {
                        repository: repository.full_name().to_owned(),
                    })?;
            Ok(manifest.with_dependency(relationship.kind, &spec.name, &spec.version))
        }
        UpdateTarget::All => Ok(manifest.clone()),
    }
}
