//! Lockfile regeneration by running the package manager.

use log::debug;
use std::fs;
use std::path::Path;
use std::process::Command;

use crate::domain::{
    LockfileError, LockfileGenerator, LockfileStrategy, MANIFEST_FILE_NAME, PackageManager,
};

/// Regenerates lockfiles by running the package manager in a scratch directory.
#[derive(Debug, Clone, Default)]
pub struct CommandLockfileGenerator;

impl CommandLockfileGenerator {
    /// A generator running package managers found on `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Write `manifest` to a scratch directory, run the package manager there and read
/// back the lockfile it produced.
fn run_package_manager(
    strategy: LockfileStrategy,
    manifest: &str,
    package_manager: PackageManager,
    registry: Option<&str>,
) -> Result<String, LockfileError> {
    let dir = tempfile::Builder::new()
        .prefix("turnup-")
        .tempdir()
        .map_err(|source| LockfileError::TempDir {
            package_manager,
            source,
        })?;

    let manifest_path = dir.path().join(MANIFEST_FILE_NAME);
    fs::write(&manifest_path, manifest).map_err(|source| LockfileError::Write {
        path: manifest_path,
        source,
    })?;

    let program = package_manager.program();
    let args = command_args(strategy, package_manager, registry);
    debug!("Running {program} {} in {}", args.join(" "), dir.path().display());

    let output = Command::new(program)
        .args(&args)
        .current_dir(dir.path())
        .output()
        .map_err(|source| LockfileError::Spawn { program, source })?;

    if !output.status.success() {
        return Err(LockfileError::Failed {
            program,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }

    read_lockfile(dir.path(), package_manager)
}

impl LockfileGenerator for CommandLockfileGenerator {
    fn create(
        &self,
        manifest: &str,
        package_manager: PackageManager,
        registry: Option<&str>,
    ) -> Result<String, LockfileError> {
        run_package_manager(LockfileStrategy::Create, manifest, package_manager, registry)
    }

    fn update(
        &self,
        manifest: &str,
        package_manager: PackageManager,
        registry: Option<&str>,
    ) -> Result<String, LockfileError> {
        run_package_manager(LockfileStrategy::Update, manifest, package_manager, registry)
    }
}

/// Arguments that make the package manager write only its lockfile.
fn command_args(
    strategy: LockfileStrategy,
    package_manager: PackageManager,
    registry: Option<&str>,
) -> Vec<String> {
    let subcommand: &[&str] = match (package_manager, strategy) {
        (PackageManager::Npm, LockfileStrategy::Create) => &["install", "--package-lock-only"],
        (PackageManager::Npm, LockfileStrategy::Update) => &["update", "--package-lock-only"],
        (PackageManager::Yarn, LockfileStrategy::Create) => &["install"],
        (PackageManager::Yarn, LockfileStrategy::Update) => &["upgrade"],
        (PackageManager::Pnpm, LockfileStrategy::Create) => &["install", "--lockfile-only"],
        (PackageManager::Pnpm, LockfileStrategy::Update) => &["update", "--lockfile-only"],
    };

    let mut args: Vec<String> = subcommand.iter().map(|s| (*s).to_owned()).collect();
    args.push("--ignore-scripts".to_owned());
    if let Some(registry) = registry {
        args.push("--registry".to_owned());
        args.push(registry.to_owned());
    }
    args
}

/// Read the lockfile the package manager left in `dir`.
fn read_lockfile(dir: &Path, package_manager: PackageManager) -> Result<String, LockfileError> {
    let path = dir.join(package_manager.lockfile_name());
    fs::read_to_string(&path).map_err(|source| LockfileError::Read { path, source })
}
