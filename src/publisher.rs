//! The publish pipeline: compose object-store primitives into one atomic
//! commit on a remote branch.
//!
//! The pipeline is a linear sequence: credential introspection, repository
//! and branch bootstrap, base resolution, validation, blobs, tree, commit,
//! ref update. A failure at any step aborts immediately; objects already
//! created remain unreferenced in the remote store and are left to its own
//! retention policy.

use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, warn};

use crate::api::TreeEntryPayload;
use crate::client::GitHubClient;
use crate::config::PublisherConfig;
use crate::error::{GitHubError, GitHubResult};
use crate::types::{FileRecord, PublishOutcome, PublishRequest, RepositoryIdentity};
use crate::validate::validate_files;

const READINESS_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Publishes file sets as single commits via the object-graph API.
pub struct CommitPublisher {
    client: GitHubClient,
}

impl CommitPublisher {
    /// Wrap an existing client.
    pub fn new(client: GitHubClient) -> Self {
        Self { client }
    }

    /// Build a publisher straight from a configuration value.
    pub fn from_config(config: PublisherConfig) -> GitHubResult<Self> {
        Ok(Self::new(GitHubClient::new(config)?))
    }

    /// The underlying client, for callers composing their own pipelines.
    pub fn client(&self) -> &GitHubClient {
        &self.client
    }

    /// Publish the request's files as one commit on the target branch.
    ///
    /// Bootstraps the repository (with an initial commit) and the target
    /// branch when absent. The final ref update is a force-update: the
    /// publish model is "replace branch tip", and concurrent publishes to
    /// the same branch resolve as last-writer-wins.
    pub async fn push_files_as_commit(
        &self,
        request: &PublishRequest,
    ) -> GitHubResult<PublishOutcome> {
        let identity = RepositoryIdentity::new(&request.owner, &request.repo);
        info!(
            %identity,
            base_branch = %request.base_branch,
            target_branch = %request.target_branch(),
            files = request.files.len(),
            "starting publish"
        );

        // Advisory only: the remote is the authority on authorization, so a
        // mismatch here warns instead of failing.
        let scope = self.client.verify_credential().await?;
        if !scope.login.eq_ignore_ascii_case(&request.owner) {
            warn!(
                principal = %scope.login,
                owner = %request.owner,
                "credential principal differs from requested owner"
            );
        }
        if !scope.scopes.is_empty() && !scope.has_write_scope() {
            warn!(
                principal = %scope.login,
                "credential reports no repo write scope"
            );
        }

        if !self.client.repository_exists(&identity).await? {
            info!(%identity, "repository absent, creating it");
            let created = self
                .client
                .create_repository(
                    &request.repo,
                    request.private,
                    request.description.as_deref(),
                    None,
                )
                .await?;
            self.wait_for_repository(&created).await?;
        }

        let base_sha = self
            .client
            .branch_head(&identity, &request.base_branch)
            .await?;
        debug!(%identity, base_sha, "resolved base branch head");

        if let Some(new_branch) = &request.new_branch {
            if new_branch != &request.base_branch {
                self.client
                    .create_branch(&identity, new_branch, &base_sha)
                    .await?;
            }
        }

        let base_tree_sha = self.client.commit_tree(&identity, &base_sha).await?;

        let files = validate_files(&request.files);
        if files.is_empty() {
            return Err(GitHubError::NoValidFiles);
        }

        let entries = self.create_blob_entries(&identity, &files).await?;
        let tree_sha = self
            .client
            .create_tree(&identity, &base_tree_sha, entries)
            .await?;
        let commit_sha = self
            .client
            .create_commit(&identity, &base_sha, &tree_sha, &request.commit_message)
            .await?;

        let target_branch = request.target_branch();
        self.client
            .update_branch_ref(&identity, target_branch, &commit_sha)
            .await?;

        let repo_url = format!("https://github.com/{}", identity.full_name());
        let branch_url = format!("{repo_url}/tree/{target_branch}");
        info!(%identity, commit_sha, branch = target_branch, "publish complete");

        Ok(PublishOutcome {
            commit_sha,
            repo_url,
            branch_url,
        })
    }

    /// Create one blob per validated file with bounded concurrency, keeping
    /// tree entries in input order so the produced tree is deterministic.
    async fn create_blob_entries(
        &self,
        identity: &RepositoryIdentity,
        files: &[FileRecord],
    ) -> GitHubResult<Vec<TreeEntryPayload>> {
        let concurrency = self.client.config().blob_concurrency.max(1);
        stream::iter(files.iter().map(|file| async move {
            let sha = self.client.create_blob(identity, &file.content).await?;
            debug!(path = %file.path, sha, "created blob");
            Ok::<_, GitHubError>(TreeEntryPayload {
                path: file.path.clone(),
                mode: "100644".to_string(),
                entry_type: "blob".to_string(),
                sha,
            })
        }))
        .buffered(concurrency)
        .try_collect()
        .await
    }

    /// Wait out the store's eventual consistency after repository creation:
    /// a fixed grace period, then bounded existence polls.
    async fn wait_for_repository(&self, identity: &RepositoryIdentity) -> GitHubResult<()> {
        let config = self.client.config();
        tokio::time::sleep(Duration::from_millis(config.creation_grace_ms)).await;

        if config.readiness_poll_attempts == 0 {
            return Ok(());
        }
        for attempt in 0..config.readiness_poll_attempts {
            if self.client.repository_exists(identity).await? {
                return Ok(());
            }
            debug!(%identity, attempt, "created repository not visible yet");
            tokio::time::sleep(READINESS_POLL_INTERVAL).await;
        }
        Err(GitHubError::not_found(format!(
            "repository {identity} did not become readable after creation"
        )))
    }
}
