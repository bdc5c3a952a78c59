//! Lockfiles, the package managers that own them and how they are regenerated.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The package manager that owns a repository's lockfile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManager {
    /// `package-lock.json`.
    Npm,
    /// `yarn.lock`.
    Yarn,
    /// `pnpm-lock.yaml`.
    Pnpm,
}

impl PackageManager {
    /// Order in which lockfiles are probed on the remote repository.
    pub const ALL: [Self; 3] = [Self::Npm, Self::Yarn, Self::Pnpm];

    /// Name of the lockfile this package manager writes.
    #[must_use]
    pub fn lockfile_name(self) -> &'static str {
        match self {
            Self::Npm => "package-lock.json",
            Self::Yarn => "yarn.lock",
            Self::Pnpm => "pnpm-lock.yaml",
        }
    }

    /// Executable used to regenerate the lockfile.
    #[must_use]
    pub fn program(self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Yarn => "yarn",
            Self::Pnpm => "pnpm",
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program())
    }
}

/// A lockfile fetched from a repository's default branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockfileEntity {
    /// The package manager that wrote the lockfile.
    pub package_manager: PackageManager,
    /// Raw lockfile text.
    pub content: String,
    /// Blob hash reported by the platform.
    pub sha: String,
}

impl LockfileEntity {
    /// A lockfile as fetched from the platform.
    #[must_use]
    pub fn new(package_manager: PackageManager, content: String, sha: String) -> Self {
        Self {
            package_manager,
            content,
            sha,
        }
    }

    /// Path of the lockfile at the repository root.
    #[must_use]
    pub fn file_name(&self) -> &'static str {
        self.package_manager.lockfile_name()
    }
}

/// How a lockfile should be regenerated from a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockfileStrategy {
    /// Resolve the manifest as written (single package update).
    Create,
    /// Move every dependency to its newest allowed version (update all).
    Update,
}

/// Errors that can occur while regenerating a lockfile.
#[derive(Debug, Error)]
pub enum LockfileError {
    /// The scratch directory could not be created.
    #[error("failed to create a working directory for {package_manager}")]
    TempDir {
        /// The package manager that was about to run.
        package_manager: PackageManager,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest could not be written to the scratch directory.
    #[error("failed to write {}", path.display())]
    Write {
        /// The manifest path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The package manager could not be started.
    #[error("failed to run {program}")]
    Spawn {
        /// The executable name.
        program: &'static str,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The package manager exited unsuccessfully.
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        /// The executable name.
        program: &'static str,
        /// The exit status.
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// The generated lockfile could not be read back.
    #[error("failed to read generated {}", path.display())]
    Read {
        /// The lockfile path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Produces updated lockfile text for a manifest.
pub trait LockfileGenerator {
    /// Generate a lockfile resolving the manifest exactly as written.
    ///
    /// # Errors
    ///
    /// Returns an error if the package manager cannot produce a lockfile.
    fn create(
        &self,
        manifest: &str,
        package_manager: PackageManager,
        registry: Option<&str>,
    ) -> Result<String, LockfileError>;

    /// Generate a lockfile with every dependency moved to its newest allowed version.
    ///
    /// # Errors
    ///
    /// Returns an error if the package manager cannot produce a lockfile.
    fn update(
        &self,
        manifest: &str,
        package_manager: PackageManager,
        registry: Option<&str>,
    ) -> Result<String, LockfileError>;

    /// Dispatch to [`create`](Self::create) or [`update`](Self::update).
    ///
    /// # Errors
    ///
    /// Propagates the error of the selected operation.
    fn generate(
        &self,
        strategy: LockfileStrategy,
        manifest: &str,
        package_manager: PackageManager,
        registry: Option<&str>,
    ) -> Result<String, LockfileError> {
        match strategy {
            LockfileStrategy::Create => self.create(manifest, package_manager, registry),
            LockfileStrategy::Update => self.update(manifest, package_manager, registry),
        }
    }
}
