//! Parsing of `name@version` package specifiers.

use regex::Regex;
use std::fmt;
use thiserror::Error;

/// npm package names: lowercase, optionally scoped (`@scope/name`).
const PACKAGE_NAME_PATTERN: &str = r"^(@[a-z0-9~][a-z0-9._~-]*/)?[a-z0-9~][a-z0-9._~-]*$";

/// Errors that can occur when parsing a `name@version` specifier.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PackageSpecError {
    /// The input has no `@version` suffix.
    #[error("invalid format: expected PACKAGE@VERSION (e.g., lodash@4.17.21), got: {input}")]
    MissingVersion {
        /// The specifier as given.
        input: String,
    },

    /// The name is not a valid npm package name.
    #[error("invalid package name: {name}")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// The version is not an exact semantic version.
    #[error("invalid version for {name}: {version} (expected an exact version such as 1.2.3)")]
    InvalidVersion {
        /// The package the version was given for.
        name: String,
        /// The rejected version.
        version: String,
    },

    /// The package name pattern failed to compile.
    #[error("invalid package name pattern")]
    Pattern(#[from] regex::Error),
}

/// A package name together with the version it should be updated to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageSpec {
    /// npm package name, possibly scoped.
    pub name: String,
    /// Exact target version.
    pub version: String,
}

impl PackageSpec {
    /// Build a specifier without validation.
    #[must_use]
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_owned(),
            version: version.to_owned(),
        }
    }

    /// Parse from "name@version" format. Scoped packages split on the last `@`.
    ///
    /// The version must be an exact semantic version. Ranges such as `^4.17.0` are
    /// rejected: the version becomes part of a branch name.
    ///
    /// # Errors
    ///
    /// Returns [`PackageSpecError::MissingVersion`] if there is no `@version` suffix.
    /// Returns [`PackageSpecError::InvalidName`] if the name is not a valid npm package name.
    /// Returns [`PackageSpecError::InvalidVersion`] if the version is not an exact semantic version.
    pub fn parse(input: &str) -> Result<Self, PackageSpecError> {
        let trimmed = input.trim();
        let Some((name, version)) = trimmed
            .rsplit_once('@')
            .filter(|(name, version)| !name.is_empty() && !version.is_empty())
        else {
            return Err(PackageSpecError::MissingVersion {
                input: trimmed.to_owned(),
            });
        };

        let name_re = Regex::new(PACKAGE_NAME_PATTERN)?;
        if !name_re.is_match(name) {
            return Err(PackageSpecError::InvalidName {
                name: name.to_owned(),
            });
        }

        if semver::Version::parse(version).is_err() {
            return Err(PackageSpecError::InvalidVersion {
                name: name.to_owned(),
                version: version.to_owned(),
            });
        }

        Ok(Self::new(name, version))
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}
