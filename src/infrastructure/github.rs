//! [`Platform`] implementation for the Github REST API.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use log::{debug, info, warn};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::panic;
use std::thread;
use std::time::Duration;
use thiserror::Error;

use crate::domain::{
    Commit, FileChange, LockfileEntity, MANIFEST_FILE_NAME, Manifest, OwnerListing,
    PackageDefinition, PackageManager, Platform, PlatformError, PullRequest, PullRequestDraft,
    Repository,
};

/// Public Github API root.
pub const GITHUB_API_BASE: &str = "https://api.github.com";
/// User agent sent with every request.
const USER_AGENT: &str = "turnup-cli";
/// Timeout applied to each request.
const REQUEST_TIMEOUT_SECS: u64 = 30;
/// Page size for list endpoints (the API maximum).
const PER_PAGE: u32 = 100;
/// Upper bound on concurrent read requests issued by one fetch call.
const MAX_CONCURRENT_REQUESTS: usize = 8;

/// Errors that can occur when interacting with the Github API.
#[derive(Debug, Error)]
pub enum GithubError {
    /// A mutating call was attempted without a token.
    #[error(
        "GITHUB_TOKEN environment variable is required for this operation.\n\
         Set it with: export GITHUB_TOKEN=<your-token>\n\
         Create a token at: https://github.com/settings/tokens"
    )]
    TokenRequired,

    /// The HTTP client could not be built.
    #[error("failed to create HTTP client")]
    ClientInit(#[source] reqwest::Error),

    /// The request could not be sent.
    #[error("failed to {operation} at {url}")]
    Request {
        /// What the request was for.
        operation: &'static str,
        /// Requested URL.
        url: String,
        /// Transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The API answered 404.
    #[error("{url} not found")]
    NotFound {
        /// Requested URL.
        url: String,
    },

    /// The API answered with another unsuccessful status.
    #[error("Github API returned status {status} for {url}: {message}")]
    ApiStatus {
        /// HTTP status.
        status: StatusCode,
        /// Requested URL.
        url: String,
        /// Response body.
        message: String,
    },

    /// The response body was not the expected JSON.
    #[error("failed to parse response from {url}")]
    ParseResponse {
        /// Requested URL.
        url: String,
        /// Decoding error.
        #[source]
        source: reqwest::Error,
    },

    /// File content was not valid base64 encoded UTF-8.
    #[error("failed to decode file content from {url}: {reason}")]
    Decode {
        /// Requested URL.
        url: String,
        /// Why decoding failed.
        reason: String,
    },
}

impl From<GithubError> for PlatformError {
    fn from(error: GithubError) -> Self {
        match error {
            GithubError::TokenRequired => PlatformError::TokenRequired { platform: "GitHub" },
            GithubError::NotFound { url } => PlatformError::NotFound { resource: url },
            other @ (GithubError::ClientInit(_)
            | GithubError::Request { .. }
            | GithubError::ApiStatus { .. }
            | GithubError::ParseResponse { .. }
            | GithubError::Decode { .. }) => PlatformError::Backend(Box::new(other)),
        }
    }
}

/// Repository fields returned by the repository and listing endpoints.
#[derive(Debug, Deserialize)]
struct RepositoryResponse {
    /// Short name.
    name: String,
    /// `owner/name`.
    full_name: String,
    /// Default branch name.
    default_branch: String,
}

impl From<RepositoryResponse> for Repository {
    fn from(response: RepositoryResponse) -> Self {
        Repository::new(
            &response.name,
            &response.full_name,
            &response.default_branch,
        )
    }
}

/// File returned by the contents API.
#[derive(Debug, Deserialize)]
struct ContentResponse {
    /// Blob hash.
    sha: String,
    /// Base64 content, empty for large files.
    #[serde(default)]
    content: String,
    /// `base64`, or `none` when the content is omitted.
    #[serde(default)]
    encoding: String,
}

/// Blob returned by the git data API.
#[derive(Debug, Deserialize)]
struct BlobResponse {
    /// Base64 content.
    content: String,
}

/// Git ref structure returned by the Github API.
#[derive(Debug, Deserialize)]
struct GitRef {
    /// The object the ref points to.
    object: GitObject,
}

/// Git object containing a SHA.
#[derive(Debug, Deserialize)]
struct GitObject {
    /// Commit hash.
    sha: String,
}

/// Body of a create-ref request.
#[derive(Serialize)]
struct CreateRefRequest<'body> {
    /// Fully qualified ref, `refs/heads/<branch>`.
    #[serde(rename = "ref")]
    ref_name: String,
    /// Commit the new ref points to.
    sha: &'body str,
}

/// Body of a contents write request.
#[derive(Serialize)]
struct PutContentRequest<'body> {
    /// Commit message.
    message: &'body str,
    /// Base64 encoded file content.
    content: String,
    /// Branch the commit goes to.
    branch: &'body str,
    /// Blob hash of the file being replaced.
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'body str>,
}

/// Body of a create-pull-request request.
#[derive(Serialize)]
struct CreatePullRequest<'body> {
    /// Pull request title.
    title: &'body str,
    /// Pull request description.
    body: &'body str,
    /// Source branch.
    head: &'body str,
    /// Target branch.
    base: &'body str,
}

/// Pull request fields returned after creation.
#[derive(Debug, Deserialize)]
struct PullRequestResponse {
    /// Pull request number.
    number: u64,
    /// Web address.
    html_url: String,
}

/// A file read through the contents API.
struct RemoteFile {
    /// Decoded text.
    text: String,
    /// Blob hash.
    sha: String,
}

/// [`Platform`] backed by the Github REST API.
pub struct GithubPlatform {
    /// Shared blocking HTTP client.
    client: Client,
    /// Access token, required for mutating calls.
    token: Option<String>,
    /// API root without a trailing slash.
    api_base: String,
}

impl GithubPlatform {
    /// Create a new Github client with a custom token.
    ///
    /// # Errors
    ///
    /// Returns `GithubError::ClientInit` if the TLS backend cannot be initialized, or the
    /// resolver cannot load the system configuration.
    ///
    /// # Panics
    ///
    /// This method panics if called from within an async runtime. See docs on
    /// [`reqwest::blocking`] for details.
    pub fn new(token: Option<String>) -> Result<Self, GithubError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(GithubError::ClientInit)?;

        Ok(Self {
            client,
            token,
            api_base: GITHUB_API_BASE.to_owned(),
        })
    }

    /// Point the client at another API root (e.g., a Github Enterprise server).
    #[must_use]
    pub fn with_api_base(self, api_base: &str) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_owned(),
            ..self
        }
    }

    /// The configured token, or an error for calls that need one.
    fn token(&self) -> Result<&str, GithubError> {
        self.token.as_deref().ok_or(GithubError::TokenRequired)
    }

    /// Add the API version headers and, when available, the token.
    fn prepare(&self, request: RequestBuilder) -> RequestBuilder {
        let versioned = request
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        match &self.token {
            Some(token) => versioned.header("Authorization", format!("Bearer {token}")),
            None => versioned,
        }
    }

    /// Send a prepared request and reject unsuccessful statuses.
    fn send(
        &self,
        request: RequestBuilder,
        operation: &'static str,
        url: &str,
    ) -> Result<Response, GithubError> {
        let response = self
            .prepare(request)
            .send()
            .map_err(|source| GithubError::Request {
                operation,
                url: url.to_owned(),
                source,
            })?;
        check_status(response, url)
    }

    /// Send a request and decode its JSON body.
    fn get_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: &'static str,
        url: &str,
    ) -> Result<T, GithubError> {
        self.send(request, operation, url)?
            .json()
            .map_err(|source| GithubError::ParseResponse {
                url: url.to_owned(),
                source,
            })
    }

    /// Fetch every page of a list endpoint, following `Link: rel="next"` headers.
    fn get_paginated<T: DeserializeOwned>(
        &self,
        first_url: String,
        operation: &'static str,
    ) -> Result<Vec<T>, GithubError> {
        let mut items: Vec<T> = Vec::new();
        let mut url = first_url;

        loop {
            let response = self.send(self.client.get(&url), operation, &url)?;
            let next_url = parse_next_link(response.headers());

            let page: Vec<T> = response
                .json()
                .map_err(|source| GithubError::ParseResponse {
                    url: url.clone(),
                    source,
                })?;
            items.extend(page);

            match next_url {
                Some(next) => url = next,
                None => break,
            }
        }

        Ok(items)
    }

    /// Look up one repository. A missing repository is skipped with a warning.
    fn fetch_repository(&self, full_name: &str) -> Result<Option<Repository>, GithubError> {
        let url = format!("{}/repos/{full_name}", self.api_base);
        match self.get_json::<RepositoryResponse>(self.client.get(&url), "fetch repository", &url)
        {
            Ok(repo) => Ok(Some(repo.into())),
            Err(GithubError::NotFound { .. }) => {
                warn!("Repository {full_name} not found, skipping");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// List every repository behind a paginated listing URL.
    fn list_repositories(&self, url: String) -> Result<OwnerListing, GithubError> {
        let repos: Vec<RepositoryResponse> = self.get_paginated(url, "list repositories")?;
        Ok(OwnerListing::from_repositories(
            repos.into_iter().map(Repository::from).collect(),
        ))
    }

    /// Request for `path` through the contents API at `git_ref`, with its URL for
    /// error messages.
    fn contents_request(
        &self,
        full_name: &str,
        path: &str,
        git_ref: &str,
    ) -> (String, RequestBuilder) {
        let url = format!("{}/repos/{full_name}/contents/{path}", self.api_base);
        let request = self.client.get(&url).query(&[("ref", git_ref)]);
        (url, request)
    }

    /// Read and decode a file at `git_ref`.
    fn fetch_file(
        &self,
        full_name: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<RemoteFile, GithubError> {
        let (url, request) = self.contents_request(full_name, path, git_ref);
        let file: ContentResponse = self.get_json(request, "fetch file", &url)?;

        // Files above 1 MB come back without inline content
        let encoded = if file.encoding == "none" || file.content.is_empty() {
            let blob_url = format!("{}/repos/{full_name}/git/blobs/{}", self.api_base, file.sha);
            let blob: BlobResponse =
                self.get_json(self.client.get(&blob_url), "fetch blob", &blob_url)?;
            blob.content
        } else {
            file.content
        };

        let text = decode_content(&encoded).map_err(|reason| GithubError::Decode { url, reason })?;

        Ok(RemoteFile {
            text,
            sha: file.sha,
        })
    }

    /// Fetch and attach the manifest of `repo`, if it has a readable one.
    fn attach_package_definition(&self, repo: Repository) -> Result<Repository, GithubError> {
        let file = match self.fetch_file(repo.full_name(), MANIFEST_FILE_NAME, repo.default_branch())
        {
            Ok(file) => file,
            Err(GithubError::NotFound { .. }) => {
                debug!("{repo} has no {MANIFEST_FILE_NAME}");
                return Ok(repo);
            }
            Err(e) => return Err(e),
        };

        let manifest = serde_json::from_str(&file.text)
            .ok()
            .and_then(Manifest::from_value);
        match manifest {
            Some(decoded) => {
                Ok(repo.with_package_definition(PackageDefinition::new(decoded, &file.sha)))
            }
            None => {
                warn!("{repo} has an unreadable {MANIFEST_FILE_NAME}, skipping");
                Ok(repo)
            }
        }
    }

    /// Create or replace one file on `branch`.
    fn put_file(
        &self,
        repo: &Repository,
        branch: &str,
        message: &str,
        file: &FileChange,
        sha: Option<&str>,
    ) -> Result<(), GithubError> {
        let url = format!(
            "{}/repos/{}/contents/{}",
            self.api_base,
            repo.full_name(),
            file.path
        );
        let body = PutContentRequest {
            message,
            content: STANDARD.encode(file.content.as_bytes()),
            branch,
            sha,
        };
        self.send(self.client.put(&url).json(&body), "write file", &url)?;
        debug!("Wrote {} to {repo}@{branch}", file.path);
        Ok(())
    }
}

impl Platform for GithubPlatform {
    fn name(&self) -> &str {
        "GitHub"
    }

    fn key(&self) -> &str {
        "github"
    }

    fn fetch_repositories(&self, names: &[String]) -> Result<Vec<Repository>, PlatformError> {
        let results = in_parallel(names.iter().collect::<Vec<_>>(), |name: &String| {
            self.fetch_repository(name)
        });

        let mut repositories = Vec::with_capacity(results.len());
        for result in results {
            if let Some(repo) = result? {
                repositories.push(repo);
            }
        }
        Ok(repositories)
    }

    fn fetch_user_repositories(&self, owner: &str) -> Result<OwnerListing, PlatformError> {
        let url = format!(
            "{}/users/{owner}/repos?type=owner&per_page={PER_PAGE}",
            self.api_base
        );
        Ok(self.list_repositories(url)?)
    }

    fn fetch_organization_repositories(&self, owner: &str) -> Result<OwnerListing, PlatformError> {
        let url = format!("{}/orgs/{owner}/repos?per_page={PER_PAGE}", self.api_base);
        Ok(self.list_repositories(url)?)
    }

    fn fetch_package_definitions(
        &self,
        repositories: Vec<Repository>,
    ) -> Result<Vec<Repository>, PlatformError> {
        in_parallel(repositories, |repo| self.attach_package_definition(repo))
            .into_iter()
            .map(|result| result.map_err(PlatformError::from))
            .collect()
    }

    fn fetch_lockfile_definition(
        &self,
        repository: &Repository,
    ) -> Result<LockfileEntity, PlatformError> {
        for package_manager in PackageManager::ALL {
            let path = package_manager.lockfile_name();
            match self.fetch_file(repository.full_name(), path, repository.default_branch()) {
                Ok(file) => {
                    debug!("Found {path} in {repository}");
                    return Ok(LockfileEntity::new(package_manager, file.text, file.sha));
                }
                Err(GithubError::NotFound { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }

        Err(PlatformError::NotFound {
            resource: format!("lockfile in {repository}"),
        })
    }

    fn create_branch(&self, repository: &Repository, branch: &str) -> Result<(), PlatformError> {
        self.token()?;

        let head_url = format!(
            "{}/repos/{}/git/ref/heads/{}",
            self.api_base,
            repository.full_name(),
            repository.default_branch()
        );
        let head: GitRef =
            self.get_json(self.client.get(&head_url), "resolve default branch", &head_url)?;

        let url = format!("{}/repos/{}/git/refs", self.api_base, repository.full_name());
        let body = CreateRefRequest {
            ref_name: format!("refs/heads/{branch}"),
            sha: &head.object.sha,
        };
        self.send(self.client.post(&url).json(&body), "create branch", &url)?;
        info!("Created branch {branch} on {repository}");
        Ok(())
    }

    fn commit_package_definition(
        &self,
        repository: &Repository,
        branch: &str,
        commit: &Commit,
    ) -> Result<bool, PlatformError> {
        self.token()?;

        let manifest_sha = repository.package_definition().map(|p| p.sha.as_str());
        self.put_file(
            repository,
            branch,
            &commit.message,
            &commit.manifest,
            manifest_sha,
        )?;

        let Some(lockfile) = &commit.lockfile else {
            return Ok(false);
        };

        // The manifest is already on the branch: a failed lookup must not retry it
        let lockfile_sha = match self.fetch_file(repository.full_name(), &lockfile.path, branch) {
            Ok(file) => file.sha,
            Err(e) => {
                warn!(
                    "Could not read {} on {repository}@{branch}, skipping lockfile update: {e}",
                    lockfile.path
                );
                return Ok(false);
            }
        };

        self.put_file(
            repository,
            branch,
            &commit.message,
            lockfile,
            Some(&lockfile_sha),
        )?;
        Ok(true)
    }

    fn create_pull_request(
        &self,
        repository: &Repository,
        branch: &str,
        draft: &PullRequestDraft,
    ) -> Result<PullRequest, PlatformError> {
        self.token()?;

        let url = format!("{}/repos/{}/pulls", self.api_base, repository.full_name());
        let body = CreatePullRequest {
            title: &draft.title,
            body: &draft.body,
            head: branch,
            base: repository.default_branch(),
        };
        let response: PullRequestResponse =
            self.get_json(self.client.post(&url).json(&body), "create pull request", &url)?;

        Ok(PullRequest {
            number: response.number,
            url: response.html_url,
        })
    }
}

/// Map 404 to [`GithubError::NotFound`] and other failures to [`GithubError::ApiStatus`].
fn check_status(response: Response, url: &str) -> Result<Response, GithubError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(GithubError::NotFound {
            url: url.to_owned(),
        });
    }
    if !status.is_success() {
        let message = response.text().unwrap_or_default();
        return Err(GithubError::ApiStatus {
            status,
            url: url.to_owned(),
            message,
        });
    }
    Ok(response)
}

/// Decode base64 content as returned by the contents API (wrapped at 60 columns).
fn decode_content(encoded: &str) -> Result<String, String> {
    let cleaned: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD.decode(cleaned).map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| e.to_string())
}

/// Parse the `Link` header to find the `rel="next"` URL for pagination.
fn parse_next_link(headers: &reqwest::header::HeaderMap) -> Option<String> {
    let link_header = headers.get("link")?.to_str().ok()?;
    link_header
        .split(',')
        .map(str::trim)
        .find(|part| part.ends_with("rel=\"next\""))
        .and_then(|part| part.split_once('<'))
        .and_then(|(_, rest)| rest.split_once('>'))
        .map(|(next, _)| next.to_owned())
}

/// Run `task` over `items` on scoped threads, a bounded batch at a time.
/// Results keep the order of `items`.
fn in_parallel<T, R, F>(items: Vec<T>, task: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Sync,
{
    let shared = &task;
    let mut results = Vec::with_capacity(items.len());
    let mut remaining = items.into_iter();

    loop {
        let batch: Vec<T> = remaining.by_ref().take(MAX_CONCURRENT_REQUESTS).collect();
        if batch.is_empty() {
            break;
        }
        thread::scope(|scope| {
            let handles: Vec<_> = batch
                .into_iter()
                .map(|item| scope.spawn(move || shared(item)))
                .collect();
            for handle in handles {
                results.push(handle.join().unwrap_or_else(|e| panic::resume_unwind(e)));
            }
        });
    }

    results
}
