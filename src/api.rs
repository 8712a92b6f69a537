//! Wire-level request/response shapes for the GitHub REST and Git Data APIs.

use serde::{Deserialize, Serialize};

/// Request body for `POST /user/repos` and `POST /orgs/{org}/repos`
#[derive(Debug, Clone, Serialize)]
pub struct CreateRepositoryRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub private: bool,
    /// Seed the repository with an initial commit. Required: the object-graph
    /// endpoints need an existing commit to branch from.
    pub auto_init: bool,
}

/// Request body for `POST /repos/{owner}/{repo}/git/blobs`
#[derive(Debug, Clone, Serialize)]
pub struct CreateBlobRequest {
    pub content: String,
    /// "utf-8" for text payloads, "base64" for opaque ones.
    pub encoding: String,
}

/// One entry in a tree creation request
#[derive(Debug, Clone, Serialize)]
pub struct TreeEntryPayload {
    pub path: String,
    /// Always "100644" here; executables and symlinks are not published.
    pub mode: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    pub sha: String,
}

/// Request body for `POST /repos/{owner}/{repo}/git/trees`
#[derive(Debug, Clone, Serialize)]
pub struct CreateTreeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_tree: Option<String>,
    pub tree: Vec<TreeEntryPayload>,
}

/// Request body for `POST /repos/{owner}/{repo}/git/commits`
#[derive(Debug, Clone, Serialize)]
pub struct CreateCommitRequest {
    pub message: String,
    pub tree: String,
    pub parents: Vec<String>,
}

/// Request body for `PATCH /repos/{owner}/{repo}/git/refs/heads/{branch}`
#[derive(Debug, Clone, Serialize)]
pub struct UpdateRefRequest {
    pub sha: String,
    pub force: bool,
}

/// Request body for `POST /repos/{owner}/{repo}/git/refs`
#[derive(Debug, Clone, Serialize)]
pub struct CreateRefRequest {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub sha: String,
}

/// Minimal object-id response shared by blob/tree/commit creation
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectShaResponse {
    pub sha: String,
}

/// Response for `GET /repos/{owner}/{repo}/git/refs/heads/{branch}`
#[derive(Debug, Clone, Deserialize)]
pub struct GitRefResponse {
    pub object: RefObject,
}

/// The object a ref points at
#[derive(Debug, Clone, Deserialize)]
pub struct RefObject {
    pub sha: String,
}

/// Response for `GET /repos/{owner}/{repo}/git/commits/{sha}`
#[derive(Debug, Clone, Deserialize)]
pub struct GitCommitResponse {
    pub sha: String,
    pub tree: ObjectShaResponse,
}

/// Response for repository lookup/creation
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryResponse {
    pub name: String,
    pub owner: RepositoryOwner,
    pub html_url: String,
}

/// Owner block within a repository response
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryOwner {
    pub login: String,
}

/// Response for `GET /user`
#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticatedUser {
    pub login: String,
}

/// Response for `GET /repos/{owner}/{repo}/git/trees/{ref}?recursive=1`
#[derive(Debug, Clone, Deserialize)]
pub struct TreeListingResponse {
    pub tree: Vec<TreeListingEntry>,
    #[serde(default)]
    pub truncated: bool,
}

/// One entry of a recursive tree listing
#[derive(Debug, Clone, Deserialize)]
pub struct TreeListingEntry {
    pub path: String,
    /// "blob" for files, "tree" for directories, "commit" for submodules.
    #[serde(rename = "type")]
    pub entry_type: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
    pub sha: String,
}

/// Response for blob and contents endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct BlobContentResponse {
    pub content: String,
    pub encoding: String,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Structured error body returned by the remote on 4xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ApiFieldError>,
}

/// Per-field detail inside a 422 error body
#[derive(Debug, Clone, Deserialize)]
pub struct ApiFieldError {
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Flatten the body into a single message, keeping the remote's
    /// per-field details so the caller can act on them.
    pub fn detail(&self) -> String {
        if self.errors.is_empty() {
            return self.message.clone();
        }
        let fields: Vec<String> = self
            .errors
            .iter()
            .map(|e| {
                let mut parts = Vec::new();
                if let Some(resource) = &e.resource {
                    parts.push(resource.clone());
                }
                if let Some(field) = &e.field {
                    parts.push(field.clone());
                }
                if let Some(code) = &e.code {
                    parts.push(code.clone());
                }
                if let Some(message) = &e.message {
                    parts.push(message.clone());
                }
                parts.join(".")
            })
            .collect();
        format!("{} [{}]", self.message, fields.join("; "))
    }
}
