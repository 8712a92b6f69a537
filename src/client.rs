//! Low-level client for the GitHub object-graph (Git Data) API.
//!
//! Each method maps to exactly one remote primitive. The client holds no
//! state beyond its HTTP connection pool and configuration; repository
//! identity and branch names are explicit parameters on every call.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::api::{
    ApiErrorBody, AuthenticatedUser, BlobContentResponse, CreateBlobRequest, CreateCommitRequest,
    CreateRefRequest, CreateRepositoryRequest, CreateTreeRequest, GitCommitResponse,
    GitRefResponse, ObjectShaResponse, RepositoryResponse, TreeEntryPayload, TreeListingResponse,
    UpdateRefRequest,
};
use crate::config::PublisherConfig;
use crate::error::{GitHubError, GitHubResult};
use crate::types::{CredentialScope, RepositoryIdentity};

const ACCEPT_HEADER: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("repo-publisher/", env!("CARGO_PKG_VERSION"));

/// Client for GitHub's repository and Git Data endpoints.
pub struct GitHubClient {
    http: Client,
    config: PublisherConfig,
}

impl GitHubClient {
    /// Build a client from an explicit configuration value.
    pub fn new(config: PublisherConfig) -> GitHubResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", config.token))
                .map_err(|e| GitHubError::auth(format!("Invalid token format: {e}")))?,
        );
        headers.insert(header::ACCEPT, header::HeaderValue::from_static(ACCEPT_HEADER));
        headers.insert(header::USER_AGENT, header::HeaderValue::from_static(USER_AGENT));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| GitHubError::transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    /// Run `operation` with bounded retries and exponential backoff.
    ///
    /// Only transport-level failures retry; remote 4xx verdicts are final.
    async fn execute_with_retry<F, Fut, T>(&self, operation: F) -> GitHubResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = GitHubResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(100 * 2u64.pow(attempt));
                    debug!(attempt, delay_ms = delay.as_millis() as u64, error = %e, "retrying request");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Map a non-success response onto the error taxonomy.
    async fn classify(response: Response, resource: &str) -> GitHubError {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read error body>".to_string());
        let detail = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.detail())
            .unwrap_or_else(|_| body.trim().to_string());

        match status {
            StatusCode::NOT_FOUND => GitHubError::not_found(resource.to_string()),
            StatusCode::CONFLICT => {
                GitHubError::conflict(format!("{resource}: {detail} (HTTP 409)"))
            }
            StatusCode::UNPROCESSABLE_ENTITY => {
                GitHubError::validation(format!("{resource}: {detail} (HTTP 422)"))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                GitHubError::auth(format!("{resource}: {detail} (HTTP {status})"))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                GitHubError::transport(format!("{resource}: rate limited (HTTP 429): {detail}"))
            }
            s if s.is_server_error() => {
                GitHubError::transport(format!("{resource}: server error (HTTP {s}): {detail}"))
            }
            s => GitHubError::transport(format!("{resource}: unexpected response (HTTP {s}): {detail}")),
        }
    }

    async fn parse<T: DeserializeOwned>(response: Response, resource: &str) -> GitHubResult<T> {
        if !response.status().is_success() {
            return Err(Self::classify(response, resource).await);
        }
        Ok(response.json::<T>().await?)
    }

    async fn ensure_success(response: Response, resource: &str) -> GitHubResult<()> {
        if !response.status().is_success() {
            return Err(Self::classify(response, resource).await);
        }
        Ok(())
    }

    /// Whether the repository exists. A 404 is `false`, not an error.
    pub async fn repository_exists(&self, identity: &RepositoryIdentity) -> GitHubResult<bool> {
        let url = self.url(&format!("/repos/{}/{}", identity.owner, identity.name));
        self.execute_with_retry(|| async {
            let response = self.http.get(&url).send().await?;
            match response.status() {
                StatusCode::NOT_FOUND => Ok(false),
                s if s.is_success() => Ok(true),
                _ => Err(Self::classify(response, &format!("repository {identity}")).await),
            }
        })
        .await
    }

    /// Introspect the configured credential: principal login plus granted
    /// OAuth scopes (from the `x-oauth-scopes` header; absent for
    /// fine-grained tokens).
    pub async fn verify_credential(&self) -> GitHubResult<CredentialScope> {
        let url = self.url("/user");
        self.execute_with_retry(|| async {
            let response = self.http.get(&url).send().await?;
            let scopes = response
                .headers()
                .get("x-oauth-scopes")
                .and_then(|v| v.to_str().ok())
                .map(parse_scopes)
                .unwrap_or_default();
            let user: AuthenticatedUser = Self::parse(response, "authenticated user").await?;
            Ok(CredentialScope {
                login: user.login,
                scopes,
            })
        })
        .await
    }

    /// Create a repository seeded with an initial commit (`auto_init`), under
    /// the authenticated user or the given organization.
    pub async fn create_repository(
        &self,
        name: &str,
        private: bool,
        description: Option<&str>,
        org: Option<&str>,
    ) -> GitHubResult<RepositoryIdentity> {
        let url = match org {
            Some(org) => self.url(&format!("/orgs/{org}/repos")),
            None => self.url("/user/repos"),
        };
        let request = CreateRepositoryRequest {
            name: name.to_string(),
            description: description.map(str::to_string),
            private,
            auto_init: true,
        };
        self.execute_with_retry(|| async {
            let response = self.http.post(&url).json(&request).send().await?;
            let repo: RepositoryResponse =
                Self::parse(response, &format!("repository creation for {name}")).await?;
            Ok(RepositoryIdentity::new(repo.owner.login, repo.name))
        })
        .await
    }

    /// Object id of the commit at the branch tip.
    ///
    /// A 409 means the repository exists but has no commits yet; the error
    /// message spells that out so the caller knows the remediation differs
    /// from other failures.
    pub async fn branch_head(
        &self,
        identity: &RepositoryIdentity,
        branch: &str,
    ) -> GitHubResult<String> {
        let url = self.url(&format!(
            "/repos/{}/{}/git/refs/heads/{branch}",
            identity.owner, identity.name
        ));
        let resource = format!("branch {branch} in {identity}");
        self.execute_with_retry(|| async {
            let response = self.http.get(&url).send().await?;
            let git_ref: GitRefResponse = Self::parse(response, &resource)
                .await
                .map_err(|e| match e {
                    GitHubError::Conflict { .. } => GitHubError::conflict(format!(
                        "repository {identity} is empty (no commits); \
                         initialize it with a first commit before publishing"
                    )),
                    other => other,
                })?;
            Ok(git_ref.object.sha)
        })
        .await
    }

    /// Object id of a commit's tree.
    pub async fn commit_tree(
        &self,
        identity: &RepositoryIdentity,
        commit_sha: &str,
    ) -> GitHubResult<String> {
        let url = self.url(&format!(
            "/repos/{}/{}/git/commits/{commit_sha}",
            identity.owner, identity.name
        ));
        let resource = format!("commit {commit_sha} in {identity}");
        self.execute_with_retry(|| async {
            let response = self.http.get(&url).send().await?;
            let commit: GitCommitResponse = Self::parse(response, &resource).await?;
            Ok(commit.tree.sha)
        })
        .await
    }

    /// Create one content-addressed blob. Identical content may yield the
    /// same id across calls; ids are not assumed unique.
    pub async fn create_blob(
        &self,
        identity: &RepositoryIdentity,
        content: &str,
    ) -> GitHubResult<String> {
        let url = self.url(&format!(
            "/repos/{}/{}/git/blobs",
            identity.owner, identity.name
        ));
        let request = CreateBlobRequest {
            content: content.to_string(),
            encoding: "utf-8".to_string(),
        };
        let resource = format!("blob creation in {identity}");
        self.execute_with_retry(|| async {
            let response = self.http.post(&url).json(&request).send().await?;
            let blob: ObjectShaResponse = Self::parse(response, &resource).await?;
            Ok(blob.sha)
        })
        .await
    }

    /// Create a tree anchored at `base_tree_sha`; `entries` carries only the
    /// changed paths and its order is preserved as given.
    pub async fn create_tree(
        &self,
        identity: &RepositoryIdentity,
        base_tree_sha: &str,
        entries: Vec<TreeEntryPayload>,
    ) -> GitHubResult<String> {
        let url = self.url(&format!(
            "/repos/{}/{}/git/trees",
            identity.owner, identity.name
        ));
        let request = CreateTreeRequest {
            base_tree: Some(base_tree_sha.to_string()),
            tree: entries,
        };
        let resource = format!("tree creation in {identity}");
        self.execute_with_retry(|| async {
            let response = self.http.post(&url).json(&request).send().await?;
            let tree: ObjectShaResponse = Self::parse(response, &resource).await?;
            Ok(tree.sha)
        })
        .await
    }

    /// Create a commit pointing at `tree_sha` with `parent_sha` as its parent.
    pub async fn create_commit(
        &self,
        identity: &RepositoryIdentity,
        parent_sha: &str,
        tree_sha: &str,
        message: &str,
    ) -> GitHubResult<String> {
        let url = self.url(&format!(
            "/repos/{}/{}/git/commits",
            identity.owner, identity.name
        ));
        let request = CreateCommitRequest {
            message: message.to_string(),
            tree: tree_sha.to_string(),
            parents: vec![parent_sha.to_string()],
        };
        let resource = format!("commit creation in {identity}");
        self.execute_with_retry(|| async {
            let response = self.http.post(&url).json(&request).send().await?;
            let commit: ObjectShaResponse = Self::parse(response, &resource).await?;
            Ok(commit.sha)
        })
        .await
    }

    /// Force-update a branch ref to the given commit. The publish model is
    /// "replace branch tip", not fast-forward merge.
    pub async fn update_branch_ref(
        &self,
        identity: &RepositoryIdentity,
        branch: &str,
        commit_sha: &str,
    ) -> GitHubResult<()> {
        let url = self.url(&format!(
            "/repos/{}/{}/git/refs/heads/{branch}",
            identity.owner, identity.name
        ));
        let request = UpdateRefRequest {
            sha: commit_sha.to_string(),
            force: true,
        };
        let resource = format!("ref update for {branch} in {identity}");
        self.execute_with_retry(|| async {
            let response = self.http.patch(&url).json(&request).send().await?;
            Self::ensure_success(response, &resource).await
        })
        .await
    }

    /// Create a branch from `base_sha`. Idempotent: a 422 "already exists"
    /// verdict is success, not failure.
    pub async fn create_branch(
        &self,
        identity: &RepositoryIdentity,
        branch: &str,
        base_sha: &str,
    ) -> GitHubResult<()> {
        let url = self.url(&format!(
            "/repos/{}/{}/git/refs",
            identity.owner, identity.name
        ));
        let request = CreateRefRequest {
            git_ref: format!("refs/heads/{branch}"),
            sha: base_sha.to_string(),
        };
        let resource = format!("branch creation for {branch} in {identity}");
        let result = self
            .execute_with_retry(|| async {
                let response = self.http.post(&url).json(&request).send().await?;
                Self::ensure_success(response, &resource).await
            })
            .await;

        match result {
            Err(GitHubError::Validation { message }) => {
                debug!(branch, %message, "branch already exists, treating as success");
                Ok(())
            }
            other => other,
        }
    }

    /// Recursive (flat) tree listing for a branch or tree object id.
    pub async fn recursive_tree(
        &self,
        identity: &RepositoryIdentity,
        git_ref: &str,
    ) -> GitHubResult<TreeListingResponse> {
        let url = self.url(&format!(
            "/repos/{}/{}/git/trees/{git_ref}?recursive=1",
            identity.owner, identity.name
        ));
        let resource = format!("tree of {git_ref} in {identity}");
        self.execute_with_retry(|| async {
            let response = self.http.get(&url).send().await?;
            let listing: TreeListingResponse = Self::parse(response, &resource).await?;
            if listing.truncated {
                warn!(%identity, git_ref, "tree listing truncated by the remote; large repository");
            }
            Ok(listing)
        })
        .await
    }

    /// Raw (base64) blob payload plus the remote-reported size.
    pub async fn blob(
        &self,
        identity: &RepositoryIdentity,
        blob_sha: &str,
    ) -> GitHubResult<BlobContentResponse> {
        let url = self.url(&format!(
            "/repos/{}/{}/git/blobs/{blob_sha}",
            identity.owner, identity.name
        ));
        let resource = format!("blob {blob_sha} in {identity}");
        self.execute_with_retry(|| async {
            let response = self.http.get(&url).send().await?;
            Self::parse(response, &resource).await
        })
        .await
    }

    /// Content of a single file via the contents endpoint; `None` when the
    /// path does not exist on the branch.
    pub async fn file_contents(
        &self,
        identity: &RepositoryIdentity,
        path: &str,
    ) -> GitHubResult<Option<BlobContentResponse>> {
        let url = self.url(&format!(
            "/repos/{}/{}/contents/{path}",
            identity.owner, identity.name
        ));
        let resource = format!("contents of {path} in {identity}");
        self.execute_with_retry(|| async {
            let response = self.http.get(&url).send().await?;
            if response.status() == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            let contents: BlobContentResponse = Self::parse(response, &resource).await?;
            Ok(Some(contents))
        })
        .await
    }
}

fn parse_scopes(header: &str) -> HashSet<String> {
    header
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
