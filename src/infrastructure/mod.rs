//! Adapters that implement the domain traits against real systems.

pub mod formatter;
pub mod github;
pub mod lockfile;
pub mod selector;

pub use formatter::JsonFormatter;
pub use github::{GITHUB_API_BASE, GithubError, GithubPlatform};
pub use lockfile::CommandLockfileGenerator;
pub use selector::TerminalSelector;
