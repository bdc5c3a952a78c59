#![allow(dead_code)]
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use turnup::domain::{
    Commit, LockfileEntity, LockfileError, LockfileGenerator, LockfileStrategy, Manifest,
    OwnerListing, PackageDefinition, PackageManager, Platform, PlatformError, PullRequest,
    PullRequestDraft, Repository, SelectError, Selector,
};

/// Every call the fake platform received, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    FetchRepositories(Vec<String>),
    FetchUserRepositories(String),
    FetchOrganizationRepositories(String),
    FetchPackageDefinitions(Vec<String>),
    FetchLockfile(String),
    CreateBranch { repo: String, branch: String },
    Commit { repo: String, branch: String, commit: Commit },
    CreatePullRequest {
        repo: String,
        branch: String,
        title: String,
        body: String,
    },
}

#[derive(Default)]
pub struct FakePlatform {
    named: Vec<Repository>,
    users: HashMap<String, Vec<Repository>>,
    orgs: HashMap<String, Vec<Repository>>,
    manifests: HashMap<String, Value>,
    lockfiles: HashMap<String, LockfileEntity>,
    broken_lockfiles: HashSet<String>,
    broken_branches: HashSet<String>,
    skipped_lockfile_writes: HashSet<String>,
    calls: Mutex<Vec<Call>>,
}

pub fn repo(full_name: &str) -> Repository {
    let name = full_name.rsplit('/').next().unwrap();
    Repository::new(name, full_name, "main")
}

fn backend(message: &str) -> PlatformError {
    PlatformError::Backend(message.into())
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_named(mut self, full_name: &str) -> Self {
        self.named.push(repo(full_name));
        self
    }

    pub fn with_user(mut self, owner: &str, full_names: &[&str]) -> Self {
        self.users
            .insert(owner.to_owned(), full_names.iter().map(|n| repo(n)).collect());
        self
    }

    pub fn with_org(mut self, owner: &str, full_names: &[&str]) -> Self {
        self.orgs
            .insert(owner.to_owned(), full_names.iter().map(|n| repo(n)).collect());
        self
    }

    pub fn with_manifest(mut self, full_name: &str, manifest: Value) -> Self {
        self.manifests.insert(full_name.to_owned(), manifest);
        self
    }

    pub fn with_lockfile(mut self, full_name: &str, package_manager: PackageManager) -> Self {
        self.lockfiles.insert(
            full_name.to_owned(),
            LockfileEntity::new(package_manager, "old lockfile".to_owned(), "lock-sha".to_owned()),
        );
        self
    }

    /// Fetching the lockfile of this repository fails with a non-404 error.
    pub fn with_broken_lockfile(mut self, full_name: &str) -> Self {
        self.broken_lockfiles.insert(full_name.to_owned());
        self
    }

    /// Creating a branch in this repository fails.
    pub fn with_broken_branch(mut self, full_name: &str) -> Self {
        self.broken_branches.insert(full_name.to_owned());
        self
    }

    /// The commit to this repository leaves its lockfile out, the way the Github
    /// adapter does when the lockfile cannot be read on the new branch.
    pub fn with_skipped_lockfile_write(mut self, full_name: &str) -> Self {
        self.skipped_lockfile_writes.insert(full_name.to_owned());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn branches(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::CreateBranch { repo, branch } => Some((repo, branch)),
                _ => None,
            })
            .collect()
    }

    pub fn commits(&self) -> Vec<(String, Commit)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Commit { repo, commit, .. } => Some((repo, commit)),
                _ => None,
            })
            .collect()
    }

    pub fn pull_requests(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::CreatePullRequest { repo, title, .. } => Some((repo, title)),
                _ => None,
            })
            .collect()
    }

    pub fn pull_request_bodies(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::CreatePullRequest { body, .. } => Some(body),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Platform for FakePlatform {
    fn name(&self) -> &str {
        "Fake"
    }

    fn key(&self) -> &str {
        "fake"
    }

    fn fetch_repositories(&self, names: &[String]) -> Result<Vec<Repository>, PlatformError> {
        self.record(Call::FetchRepositories(names.to_vec()));
        Ok(names
            .iter()
            .filter_map(|name| self.named.iter().find(|r| r.full_name() == name).cloned())
            .collect())
    }

    fn fetch_user_repositories(&self, owner: &str) -> Result<OwnerListing, PlatformError> {
        self.record(Call::FetchUserRepositories(owner.to_owned()));
        match self.users.get(owner) {
            Some(repos) => Ok(OwnerListing::from_repositories(repos.clone())),
            None => Err(PlatformError::NotFound {
                resource: format!("user {owner}"),
            }),
        }
    }

    fn fetch_organization_repositories(&self, owner: &str) -> Result<OwnerListing, PlatformError> {
        self.record(Call::FetchOrganizationRepositories(owner.to_owned()));
        match self.orgs.get(owner) {
            Some(repos) => Ok(OwnerListing::from_repositories(repos.clone())),
            None => Err(PlatformError::NotFound {
                resource: format!("organization {owner}"),
            }),
        }
    }

    fn fetch_package_definitions(
        &self,
        repositories: Vec<Repository>,
    ) -> Result<Vec<Repository>, PlatformError> {
        self.record(Call::FetchPackageDefinitions(
            repositories.iter().map(|r| r.full_name().to_owned()).collect(),
        ));
        Ok(repositories
            .into_iter()
            .map(|repo| match self.manifests.get(repo.full_name()) {
                Some(value) => {
                    let manifest = Manifest::from_value(value.clone()).unwrap();
                    repo.with_package_definition(PackageDefinition::new(manifest, "manifest-sha"))
                }
                None => repo,
            })
            .collect())
    }

    fn fetch_lockfile_definition(
        &self,
        repository: &Repository,
    ) -> Result<LockfileEntity, PlatformError> {
        self.record(Call::FetchLockfile(repository.full_name().to_owned()));
        if self.broken_lockfiles.contains(repository.full_name()) {
            return Err(backend("lockfile fetch exploded"));
        }
        self.lockfiles
            .get(repository.full_name())
            .cloned()
            .ok_or_else(|| PlatformError::NotFound {
                resource: format!("lockfile in {repository}"),
            })
    }

    fn create_branch(&self, repository: &Repository, branch: &str) -> Result<(), PlatformError> {
        self.record(Call::CreateBranch {
            repo: repository.full_name().to_owned(),
            branch: branch.to_owned(),
        });
        if self.broken_branches.contains(repository.full_name()) {
            return Err(backend("reference already exists"));
        }
        Ok(())
    }

    fn commit_package_definition(
        &self,
        repository: &Repository,
        branch: &str,
        commit: &Commit,
    ) -> Result<bool, PlatformError> {
        self.record(Call::Commit {
            repo: repository.full_name().to_owned(),
            branch: branch.to_owned(),
            commit: commit.clone(),
        });
        Ok(commit.lockfile.is_some()
            && !self.skipped_lockfile_writes.contains(repository.full_name()))
    }

    fn create_pull_request(
        &self,
        repository: &Repository,
        branch: &str,
        draft: &PullRequestDraft,
    ) -> Result<PullRequest, PlatformError> {
        self.record(Call::CreatePullRequest {
            repo: repository.full_name().to_owned(),
            branch: branch.to_owned(),
            title: draft.title.clone(),
            body: draft.body.clone(),
        });
        Ok(PullRequest {
            number: 1,
            url: format!("https://example.com/{}/pull/1", repository.full_name()),
        })
    }
}

/// Records which strategy was requested and returns a recognizable lockfile.
#[derive(Default)]
pub struct FakeGenerator {
    pub requests: Mutex<Vec<(LockfileStrategy, PackageManager, Option<String>)>>,
}

impl FakeGenerator {
    fn record(
        &self,
        strategy: LockfileStrategy,
        package_manager: PackageManager,
        registry: Option<&str>,
    ) -> String {
        self.requests
            .lock()
            .unwrap()
            .push((strategy, package_manager, registry.map(str::to_owned)));
        format!("generated {package_manager} lockfile")
    }

    pub fn requests(&self) -> Vec<(LockfileStrategy, PackageManager, Option<String>)> {
        self.requests.lock().unwrap().clone()
    }
}

impl LockfileGenerator for FakeGenerator {
    fn create(
        &self,
        _manifest: &str,
        package_manager: PackageManager,
        registry: Option<&str>,
    ) -> Result<String, LockfileError> {
        Ok(self.record(LockfileStrategy::Create, package_manager, registry))
    }

    fn update(
        &self,
        _manifest: &str,
        package_manager: PackageManager,
        registry: Option<&str>,
    ) -> Result<String, LockfileError> {
        Ok(self.record(LockfileStrategy::Update, package_manager, registry))
    }
}

/// Picks candidates by full name, or everything when `pick` is `None`.
#[derive(Default)]
pub struct FakeSelector {
    pub pick: Option<Vec<String>>,
    pub offered: Mutex<Vec<String>>,
}

impl FakeSelector {
    pub fn picking(names: &[&str]) -> Self {
        Self {
            pick: Some(names.iter().map(|n| (*n).to_owned()).collect()),
            offered: Mutex::new(Vec::new()),
        }
    }

    pub fn offered(&self) -> Vec<String> {
        self.offered.lock().unwrap().clone()
    }
}

impl Selector for FakeSelector {
    fn select(&self, candidates: Vec<Repository>) -> Result<Vec<Repository>, SelectError> {
        self.offered
            .lock()
            .unwrap()
            .extend(candidates.iter().map(|r| r.full_name().to_owned()));
        Ok(match &self.pick {
            Some(pick) => candidates
                .into_iter()
                .filter(|r| pick.iter().any(|p| p == r.full_name()))
                .collect(),
            None => candidates,
        })
    }
}
