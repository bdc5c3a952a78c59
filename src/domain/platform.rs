//! The hosting platform seam and the values exchanged through it.

use log::debug;
use std::fmt;
use thiserror::Error;

use super::{LockfileEntity, Repository};

/// Errors reported by a hosting platform.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The platform needs an access token for this operation.
    #[error("{platform} token required for this operation")]
    TokenRequired {
        /// Platform name.
        platform: &'static str,
    },

    /// The requested resource does not exist (HTTP 404 or equivalent).
    #[error("{resource} not found")]
    NotFound {
        /// What was looked up.
        resource: String,
    },

    /// Any other transport, status or decoding failure.
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

impl PlatformError {
    /// Whether the error means the resource does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Repositories listed for an owner. An empty listing is distinct from a failed one.
#[derive(Debug, Clone, PartialEq)]
pub enum OwnerListing {
    /// At least one repository.
    Found(Vec<Repository>),
    /// The owner exists but has no repositories.
    Empty,
}

impl OwnerListing {
    /// Classify a listing by whether it is empty.
    #[must_use]
    pub fn from_repositories(repositories: Vec<Repository>) -> Self {
        if repositories.is_empty() {
            Self::Empty
        } else {
            Self::Found(repositories)
        }
    }
}

/// A file written as part of a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Path from the repository root.
    pub path: String,
    /// Full new file content.
    pub content: String,
}

/// The files of one publish commit. The manifest is always written before the lockfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Commit message used for every file write.
    pub message: String,
    /// The updated manifest.
    pub manifest: FileChange,
    /// The regenerated lockfile, when there is one.
    pub lockfile: Option<FileChange>,
}

/// Title and body of a pull request about to be opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestDraft {
    /// Pull request title.
    pub title: String,
    /// Pull request description.
    pub body: String,
}

/// A pull request opened on the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    /// Platform-assigned number.
    pub number: u64,
    /// Web address of the pull request.
    pub url: String,
}

impl fmt::Display for PullRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.number, self.url)
    }
}

/// Capabilities a hosting platform provides to the update pipeline.
pub trait Platform {
    /// Human readable platform name (e.g., "GitHub").
    fn name(&self) -> &str;

    /// Stable identifier used on the command line (e.g., "github").
    fn key(&self) -> &str;

    /// Fetch repositories by `owner/name`. Names that do not exist are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if any lookup fails for a reason other than not found.
    fn fetch_repositories(&self, names: &[String]) -> Result<Vec<Repository>, PlatformError>;

    /// List the repositories of a user account.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::NotFound`] if the owner is not a user.
    fn fetch_user_repositories(&self, owner: &str) -> Result<OwnerListing, PlatformError>;

    /// List the repositories of an organization.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::NotFound`] if the owner is not an organization.
    fn fetch_organization_repositories(&self, owner: &str) -> Result<OwnerListing, PlatformError>;

    /// List an owner's repositories, trying user repositories before organization ones.
    ///
    /// Organization repositories are only queried when the user listing is empty
    /// or the owner is not a user.
    ///
    /// # Errors
    ///
    /// Propagates any error other than a not-found user, and any organization lookup error.
    fn fetch_repositories_by_owner(&self, owner: &str) -> Result<Vec<Repository>, PlatformError> {
        match self.fetch_user_repositories(owner) {
            Ok(OwnerListing::Found(repositories)) => return Ok(repositories),
            Ok(OwnerListing::Empty) => debug!("No user repositories for {owner}"),
            Err(e) if e.is_not_found() => debug!("{owner} is not a user: {e}"),
            Err(e) => return Err(e),
        }

        match self.fetch_organization_repositories(owner)? {
            OwnerListing::Found(repositories) => Ok(repositories),
            OwnerListing::Empty => Ok(Vec::new()),
        }
    }

    /// Attach the decoded manifest to each repository that has one.
    /// Repositories without a manifest are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if a fetch fails for a reason other than not found.
    fn fetch_package_definitions(
        &self,
        repositories: Vec<Repository>,
    ) -> Result<Vec<Repository>, PlatformError>;

    /// Fetch the lockfile from the repository's default branch.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::NotFound`] if the repository has no known lockfile.
    fn fetch_lockfile_definition(
        &self,
        repository: &Repository,
    ) -> Result<LockfileEntity, PlatformError>;

    /// Create `branch` from the head of the repository's default branch.
    ///
    /// # Errors
    ///
    /// Returns an error if the branch cannot be created.
    fn create_branch(&self, repository: &Repository, branch: &str) -> Result<(), PlatformError>;

    /// Write the commit's files to `branch`, manifest first.
    ///
    /// Returns whether the lockfile was written. An implementation may skip the
    /// lockfile once the manifest is on the branch.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be written.
    fn commit_package_definition(
        &self,
        repository: &Repository,
        branch: &str,
        commit: &Commit,
    ) -> Result<bool, PlatformError>;

    /// Open a pull request from `branch` into the default branch.
    ///
    /// # Errors
    ///
    /// Returns an error if the pull request cannot be opened.
    fn create_pull_request(
        &self,
        repository: &Repository,
        branch: &str,
        draft: &PullRequestDraft,
    ) -> Result<PullRequest, PlatformError>;
}
