//! Collecting the repositories a run considers.

use log::{debug, info};
use std::collections::HashSet;

use super::update::UpdateError;
use crate::domain::{Platform, Repository};

/// Collect the repositories named explicitly and those owned by `owner`.
///
/// Named repositories come first. Duplicates are dropped by full name, keeping the
/// first occurrence, so the discovery order is preserved.
///
/// # Errors
///
/// Returns [`UpdateError::NoRepositoriesFound`] if nothing was found.
/// Returns [`UpdateError::Platform`] if the platform lookup fails.
pub fn gather<P: Platform>(
    platform: &P,
    repositories: &[String],
    owner: Option<&str>,
) -> Result<Vec<Repository>, UpdateError> {
    let mut gathered = Vec::new();

    if !repositories.is_empty() {
        debug!("Fetching {} named repositories", repositories.len());
        gathered.extend(platform.fetch_repositories(repositories)?);
    }

    if let Some(login) = owner {
        debug!("Fetching repositories owned by {login}");
        gathered.extend(platform.fetch_repositories_by_owner(login)?);
    }

    let unique = dedupe(gathered);
    if unique.is_empty() {
        return Err(UpdateError::NoRepositoriesFound);
    }

    info!(
        "Found {} repositor{} on {}",
        unique.len(),
        if unique.len() == 1 { "y" } else { "ies" },
        platform.name()
    );
    Ok(unique)
}

/// Drop repositories already seen by full name, keeping the first occurrence.
fn dedupe(repositories: Vec<Repository>) -> Vec<Repository> {
    let mut seen = HashSet::new();
    repositories
        .into_iter()
        .filter(|repo| seen.insert(repo.full_name().to_owned()))
        .collect()
}
