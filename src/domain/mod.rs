//! Types and traits shared by every stage of an update run.

pub mod classify;
pub mod format;
pub mod lockfile;
pub mod manifest;
pub mod package;
pub mod platform;
pub mod repository;
pub mod select;
pub mod target;

pub use classify::{classify, with_manifest};
pub use format::{FormatError, ManifestFormatter};
pub use lockfile::{LockfileEntity, LockfileError, LockfileGenerator, LockfileStrategy, PackageManager};
pub use manifest::{DependencyKind, MANIFEST_FILE_NAME, Manifest};
pub use package::{PackageSpec, PackageSpecError};
pub use platform::{
    Commit, FileChange, OwnerListing, Platform, PlatformError, PullRequest, PullRequestDraft,
};
pub use repository::{DependencyRelationship, PackageDefinition, Repository};
pub use select::{SelectError, Selector};
pub use target::{BRANCH_PREFIX, UpdateTarget};
