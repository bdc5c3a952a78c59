//! What a run updates and the names and messages derived from it.

use std::fmt;

use super::{DependencyRelationship, LockfileStrategy, PackageSpec, Repository};

/// Prefix of every branch created by turnup.
pub const BRANCH_PREFIX: &str = "turnup";

/// What a run updates: one package, or every dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateTarget {
    /// Set a single package to a specific version.
    Package(PackageSpec),
    /// Move every dependency to its newest allowed version.
    All,
}

impl UpdateTarget {
    /// Deterministic branch name for this target.
    ///
    /// `lodash@4.17.21` becomes `turnup/lodash@4.17.21` and updating everything
    /// uses `turnup/update-all`. Characters git does not allow in a ref are replaced.
    #[must_use]
    pub fn branch_name(&self) -> String {
        match self {
            Self::Package(spec) => format!("{BRANCH_PREFIX}/{}", ref_safe(&spec.to_string())),
            Self::All => format!("{BRANCH_PREFIX}/update-all"),
        }
    }

    /// How the lockfile is regenerated for this target.
    #[must_use]
    pub fn lockfile_strategy(&self) -> LockfileStrategy {
        match self {
            Self::Package(_) => LockfileStrategy::Create,
            Self::All => LockfileStrategy::Update,
        }
    }

    /// Message used for every file written by the commit.
    #[must_use]
    pub fn commit_message(&self) -> String {
        match self {
            Self::Package(spec) => format!("chore(deps): update {} to {}", spec.name, spec.version),
            Self::All => "chore(deps): update all dependencies".to_owned(),
        }
    }

    /// Pull request title.
    #[must_use]
    pub fn pull_request_title(&self) -> String {
        match self {
            Self::Package(spec) => format!("Update {} to {}", spec.name, spec.version),
            Self::All => "Update all dependencies".to_owned(),
        }
    }

    /// Pull request body, mentioning the previous version when the repository was classified.
    #[must_use]
    pub fn pull_request_body(&self, repository: &Repository, lockfile_updated: bool) -> String {
        let mut body = match (self, repository.dependency_relationship()) {
            (
                Self::Package(_),
                Some(DependencyRelationship {
                    kind,
                    package_name,
                    package_version,
                    current_version,
                }),
            ) => format!(
                "Updates the {kind} dependency `{package_name}` from `{current_version}` to `{package_version}`."
            ),
            (Self::Package(spec), None) => {
                format!("Updates `{}` to `{}`.", spec.name, spec.version)
            }
            (Self::All, _) => "Updates all dependencies to their newest allowed versions.".to_owned(),
        };
        if lockfile_updated && let Some(lockfile) = repository.lockfile() {
            body.push_str("\n\nRegenerated `");
            body.push_str(lockfile.file_name());
            body.push_str("`.");
        }
        body.push_str("\n\n---\nOpened by turnup.");
        body
    }
}

impl fmt::Display for UpdateTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Package(spec) => write!(f, "{spec}"),
            Self::All => write!(f, "all dependencies"),
        }
    }
}

/// Rewrite `text` into something git accepts as part of a branch name.
///
/// Forbidden characters become `-`, as do a leading dot and the second of two
/// consecutive dots. A path component ending in `.lock` gets a trailing `-`.
fn ref_safe(text: &str) -> String {
    text.split('/')
        .map(|component| {
            let mut safe = String::with_capacity(component.len());
            for c in component.chars() {
                let forbidden = c.is_ascii_control()
                    || c.is_whitespace()
                    || matches!(c, '~' | '^' | ':' | '?' | '*' | '[' | '\\')
                    || (c == '.' && (safe.is_empty() || safe.ends_with('.')))
                    || (c == '{' && safe.ends_with('@'));
                safe.push(if forbidden { '-' } else { c });
            }
            if safe.ends_with(".lock") {
                safe.push('-');
            }
            safe
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DependencyKind, LockfileEntity, PackageManager};

    fn lodash() -> UpdateTarget {
        UpdateTarget::Package(PackageSpec::new("lodash", "4.17.21"))
    }

    /// The rules `git check-ref-format` applies to a branch name.
    fn is_valid_ref(name: &str) -> bool {
        !name.is_empty()
            && name != "@"
            && !name.starts_with('/')
            && !name.ends_with('/')
            && !name.ends_with('.')
            && !name.contains("..")
            && !name.contains("//")
            && !name.contains("@{")
            && !name
                .chars()
                .any(|c| c.is_ascii_control() || c == ' ' || "~^:?*[\\".contains(c))
            && name
                .split('/')
                .all(|component| !component.starts_with('.') && !component.ends_with(".lock"))
    }

    #[test]
    fn test_branch_names() {
        assert_eq!(lodash().branch_name(), "turnup/lodash@4.17.21");
        assert_eq!(UpdateTarget::All.branch_name(), "turnup/update-all");
        assert_eq!(
            UpdateTarget::Package(PackageSpec::new("@babel/core", "7.24.0")).branch_name(),
            "turnup/@babel/core@7.24.0"
        );
    }

    #[test]
    fn test_every_accepted_spec_is_a_valid_branch() {
        let inputs = [
            "lodash@4.17.21",
            "@babel/core@7.24.0",
            "react@19.0.0-rc.1",
            "left-pad@1.0.0+build.5",
            "~tilde@1.0.0",
            "a..b@1.0.0",
            "@scope.lock/pkg@2.0.0",
            "react@^18.2.0",
            "react@~18.2.0",
        ];
        let mut accepted = 0;
        for input in inputs {
            if let Ok(spec) = PackageSpec::parse(input) {
                accepted += 1;
                let branch = UpdateTarget::Package(spec).branch_name();
                assert!(is_valid_ref(&branch), "{input} -> {branch}");
            }
        }
        assert_eq!(accepted, 7);
    }

    #[test]
    fn test_branch_name_replaces_forbidden_characters() {
        let target = UpdateTarget::Package(PackageSpec::new("~x..y", "^1.0.0"));
        let branch = target.branch_name();
        assert_eq!(branch, "turnup/-x.-y@-1.0.0");
        assert!(is_valid_ref(&branch));
    }

    #[test]
    fn test_lockfile_strategy_by_target() {
        assert_eq!(lodash().lockfile_strategy(), LockfileStrategy::Create);
        assert_eq!(UpdateTarget::All.lockfile_strategy(), LockfileStrategy::Update);
    }

    #[test]
    fn test_messages() {
        assert_eq!(lodash().commit_message(), "chore(deps): update lodash to 4.17.21");
        assert_eq!(lodash().pull_request_title(), "Update lodash to 4.17.21");
        assert_eq!(UpdateTarget::All.pull_request_title(), "Update all dependencies");
    }

    #[test]
    fn test_body_mentions_current_version_and_lockfile() {
        let repo = Repository::new("app", "acme/app", "main")
            .with_dependency_relationship(DependencyRelationship {
                kind: DependencyKind::Dev,
                package_name: "lodash".to_owned(),
                package_version: "4.17.21".to_owned(),
                current_version: "4.17.0".to_owned(),
            })
            .with_lockfile(LockfileEntity::new(
                PackageManager::Yarn,
                String::new(),
                "sha".to_owned(),
            ));

        let body = lodash().pull_request_body(&repo, true);
        assert!(body.contains("dev dependency `lodash` from `4.17.0` to `4.17.21`"));
        assert!(body.contains("Regenerated `yarn.lock`."));

        let body = lodash().pull_request_body(&repo, false);
        assert!(!body.contains("Regenerated"));
    }
}
