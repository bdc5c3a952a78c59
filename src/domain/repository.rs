//! The repository entity and the state a run attaches to it.

use std::fmt;

use super::{DependencyKind, LockfileEntity, Manifest};

/// A manifest fetched from a repository together with its blob hash.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageDefinition {
    /// The decoded manifest.
    pub decoded: Manifest,
    /// Blob hash of the manifest on the default branch.
    pub sha: String,
}

impl PackageDefinition {
    /// Pair a decoded manifest with its blob hash.
    #[must_use]
    pub fn new(decoded: Manifest, sha: &str) -> Self {
        Self {
            decoded,
            sha: sha.to_owned(),
        }
    }
}

/// How a repository currently depends on the package being updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRelationship {
    /// The dependency map the package is declared in.
    pub kind: DependencyKind,
    /// The package being updated.
    pub package_name: String,
    /// The version the package is updated to.
    pub package_version: String,
    /// The version currently declared.
    pub current_version: String,
}

/// A hosted repository and the state accumulated for it during a run.
///
/// Values are never changed in place: every `with_*` method consumes the
/// repository and returns the next state.
#[derive(Debug, Clone, PartialEq)]
pub struct Repository {
    /// Short repository name.
    name: String,
    /// `owner/name`.
    full_name: String,
    /// Branch new work is based on.
    default_branch: String,
    /// Manifest fetched from the default branch.
    package_definition: Option<PackageDefinition>,
    /// Set once the repository has been classified.
    dependency_relationship: Option<DependencyRelationship>,
    /// Lockfile fetched while publishing.
    lockfile: Option<LockfileEntity>,
}

impl Repository {
    /// A repository with no state attached yet.
    #[must_use]
    pub fn new(name: &str, full_name: &str, default_branch: &str) -> Self {
        Self {
            name: name.to_owned(),
            full_name: full_name.to_owned(),
            default_branch: default_branch.to_owned(),
            package_definition: None,
            dependency_relationship: None,
            lockfile: None,
        }
    }

    /// Short repository name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `owner/name`, unique per platform.
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Branch new work is based on.
    #[must_use]
    pub fn default_branch(&self) -> &str {
        &self.default_branch
    }

    /// Manifest and blob hash, if the repository has a manifest.
    #[must_use]
    pub fn package_definition(&self) -> Option<&PackageDefinition> {
        self.package_definition.as_ref()
    }

    /// Decoded manifest, if the repository has one.
    #[must_use]
    pub fn manifest(&self) -> Option<&Manifest> {
        self.package_definition.as_ref().map(|p| &p.decoded)
    }

    /// How the repository depends on the package being updated.
    #[must_use]
    pub fn dependency_relationship(&self) -> Option<&DependencyRelationship> {
        self.dependency_relationship.as_ref()
    }

    /// Lockfile attached while publishing.
    #[must_use]
    pub fn lockfile(&self) -> Option<&LockfileEntity> {
        self.lockfile.as_ref()
    }

    /// Attach a fetched manifest.
    #[must_use]
    pub fn with_package_definition(self, package_definition: PackageDefinition) -> Self {
        Self {
            package_definition: Some(package_definition),
            ..self
        }
    }

    /// Attach the classification result.
    #[must_use]
    pub fn with_dependency_relationship(self, relationship: DependencyRelationship) -> Self {
        Self {
            dependency_relationship: Some(relationship),
            ..self
        }
    }

    /// Attach a fetched lockfile.
    #[must_use]
    pub fn with_lockfile(self, lockfile: LockfileEntity) -> Self {
        Self {
            lockfile: Some(lockfile),
            ..self
        }
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name)
    }
}
