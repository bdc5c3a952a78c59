//! The `package.json` manifest and the dependency maps it declares.

use serde_json::{Map, Value};
use std::fmt;

/// File name of the manifest read from and written to each repository.
pub const MANIFEST_FILE_NAME: &str = "package.json";

/// Which dependency map of the manifest a package is declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    /// Declared under `dependencies`.
    Prod,
    /// Declared under `devDependencies`.
    Dev,
}

impl DependencyKind {
    /// The manifest key holding this kind of dependency.
    #[must_use]
    pub fn field(self) -> &'static str {
        match self {
            Self::Prod => "dependencies",
            Self::Dev => "devDependencies",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prod => write!(f, "prod"),
            Self::Dev => write!(f, "dev"),
        }
    }
}

/// A decoded `package.json`. Key order is preserved exactly as read.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Manifest(Map<String, Value>);

impl Manifest {
    /// Wrap an already decoded JSON object.
    #[must_use]
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Build a manifest from a JSON value. Returns `None` unless the value is an object.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            Value::Null
            | Value::Bool(_)
            | Value::Number(_)
            | Value::String(_)
            | Value::Array(_) => None,
        }
    }

    /// The top-level fields, in file order.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Unwrap into a plain JSON object.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// The declared version of `package` in the given dependency map.
    /// Non-string declarations are treated as absent.
    #[must_use]
    pub fn declared_version(&self, kind: DependencyKind, package: &str) -> Option<&str> {
        self.0
            .get(kind.field())
            .and_then(Value::as_object)
            .and_then(|deps| deps.get(package))
            .and_then(Value::as_str)
    }

    /// Find the first declaration of `package`, checking `dependencies` before `devDependencies`.
    #[must_use]
    pub fn find_dependency(&self, package: &str) -> Option<(DependencyKind, &str)> {
        [DependencyKind::Prod, DependencyKind::Dev]
            .into_iter()
            .find_map(|kind| self.declared_version(kind, package).map(|v| (kind, v)))
    }

    /// Return a copy of this manifest with `package` set to `version` in the given map.
    /// The map is created when missing. Existing key order is kept.
    #[must_use]
    pub fn with_dependency(&self, kind: DependencyKind, package: &str, version: &str) -> Self {
        let mut deps = self
            .0
            .get(kind.field())
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        deps.insert(package.to_owned(), Value::String(version.to_owned()));

        let mut fields = self.0.clone();
        fields.insert(kind.field().to_owned(), Value::Object(deps));
        Self(fields)
    }
}
