//! Matching repositories against the package being updated.

use log::debug;

use super::{DependencyRelationship, Repository};

/// Keep the repositories whose manifest declares `package` at a version other than `version`.
///
/// Each kept repository carries a [`DependencyRelationship`] describing where the
/// package is declared and which version it currently has. Repositories without a
/// manifest are dropped. Input order is preserved.
#[must_use]
pub fn classify(repositories: Vec<Repository>, package: &str, version: &str) -> Vec<Repository> {
    repositories
        .into_iter()
        .filter_map(|repo| {
            let relationship = relationship_for(&repo, package, version)?;
            debug!(
                "{repo} depends on {package}@{} ({})",
                relationship.current_version, relationship.kind
            );
            Some(repo.with_dependency_relationship(relationship))
        })
        .collect()
}

/// Keep every repository that has a manifest. Used when updating all dependencies.
#[must_use]
pub fn with_manifest(repositories: Vec<Repository>) -> Vec<Repository> {
    repositories
        .into_iter()
        .filter(|repo| repo.package_definition().is_some())
        .collect()
}

/// The relationship to record for `repo`, or `None` when it should not be updated.
fn relationship_for(
    repo: &Repository,
    package: &str,
    version: &str,
) -> Option<DependencyRelationship> {
    let (kind, current) = repo.manifest()?.find_dependency(package)?;
    if current == version {
        return None;
    }
    Some(DependencyRelationship {
        kind,
        package_name: package.to_owned(),
        package_version: version.to_owned(),
        current_version: current.to_owned(),
    })
}
