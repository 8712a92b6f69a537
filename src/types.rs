use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// One file to publish: a repository-relative path and its content.
///
/// Paths are forward-slash separated. Content is UTF-8 text, or an opaque
/// encoded payload for binaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    pub content: String,
}

impl FileRecord {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Owner/name pair identifying a remote repository.
///
/// Constructed by the caller and never mutated here; existence is queried
/// per publish, not cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryIdentity {
    pub owner: String,
    pub name: String,
}

impl RepositoryIdentity {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// "owner/name" form used in URLs and log lines.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl std::fmt::Display for RepositoryIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// What the credential introspection endpoint reported about the token.
///
/// Advisory only: the remote API remains the authority on what the token may
/// actually do.
#[derive(Debug, Clone)]
pub struct CredentialScope {
    /// Login of the token's principal.
    pub login: String,
    /// OAuth scopes granted to the token. Empty for fine-grained tokens,
    /// which do not report scopes.
    pub scopes: HashSet<String>,
}

impl CredentialScope {
    /// Whether the token carries a scope that allows repository writes.
    pub fn has_write_scope(&self) -> bool {
        self.scopes.contains("repo") || self.scopes.contains("public_repo")
    }
}

/// Input to [`crate::CommitPublisher::push_files_as_commit`].
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub owner: String,
    pub repo: String,
    /// Branch whose head anchors the new commit.
    pub base_branch: String,
    /// Publish to this branch instead of `base_branch`; created from the
    /// base head when absent.
    pub new_branch: Option<String>,
    pub files: Vec<FileRecord>,
    pub commit_message: String,
    /// Description used when the repository has to be created first.
    pub description: Option<String>,
    /// Visibility used when the repository has to be created first.
    pub private: bool,
}

impl PublishRequest {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        files: Vec<FileRecord>,
        commit_message: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            base_branch: "main".to_string(),
            new_branch: None,
            files,
            commit_message: commit_message.into(),
            description: None,
            private: false,
        }
    }

    /// Branch the final ref update targets.
    pub fn target_branch(&self) -> &str {
        self.new_branch.as_deref().unwrap_or(&self.base_branch)
    }
}

/// Result of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Object id of the new commit.
    pub commit_sha: String,
    /// Browser URL of the repository.
    pub repo_url: String,
    /// Browser URL of the published branch.
    pub branch_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_display() {
        let identity = RepositoryIdentity::new("acme", "widgets");
        assert_eq!(identity.to_string(), "acme/widgets");
        assert_eq!(identity.full_name(), "acme/widgets");
    }

    #[test]
    fn test_target_branch_defaults_to_base() {
        let request = PublishRequest::new("acme", "widgets", vec![], "msg");
        assert_eq!(request.target_branch(), "main");

        let request = PublishRequest {
            new_branch: Some("feature-x".to_string()),
            ..request
        };
        assert_eq!(request.target_branch(), "feature-x");
    }

    #[test]
    fn test_write_scope_detection() {
        let mut scope = CredentialScope {
            login: "octocat".to_string(),
            scopes: HashSet::new(),
        };
        assert!(!scope.has_write_scope());
        scope.scopes.insert("public_repo".to_string());
        assert!(scope.has_write_scope());
    }
}
