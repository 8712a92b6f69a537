//! # repo-publisher
//!
//! Repository content synchronization over the GitHub Git Data API: publish
//! an in-memory file set as one atomic commit (blobs → tree → commit → ref),
//! and walk a remote repository's tree to materialize filtered file contents
//! for downstream consumption such as embedding or context-building.
//!
//! ## Features
//!
//! - **Object-graph publishing**: a single commit per publish, anchored at
//!   the branch tip's tree, finalized by a force ref update
//! - **Repository and branch bootstrap**: absent repositories are created
//!   with an initial commit; absent target branches are created from the
//!   base head, idempotently
//! - **Filtered tree walking**: extension allow-lists, glob excludes, size
//!   caps, binary handling, and custom predicates with skip accounting
//! - **Bounded retries**: transport failures back off and retry; remote 4xx
//!   verdicts are final
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use repo_publisher::{CommitPublisher, FileRecord, PublishRequest, PublisherConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PublisherConfig::new(std::env::var("GITHUB_TOKEN")?);
//! let publisher = CommitPublisher::from_config(config)?;
//!
//! let files = vec![
//!     FileRecord::new("src/main.rs", "fn main() {}"),
//!     FileRecord::new("README.md", "# widgets"),
//! ];
//! let request = PublishRequest::new("acme", "widgets", files, "Initial scaffold");
//! let outcome = publisher.push_files_as_commit(&request).await?;
//! println!("published {} at {}", outcome.commit_sha, outcome.branch_url);
//! # Ok(())
//! # }
//! ```
//!
//! Fetching goes through the same client:
//!
//! ```rust,no_run
//! use repo_publisher::{fetch_source_code_files, GitHubClient, PublisherConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GitHubClient::new(PublisherConfig::new("ghp_token"))?;
//! let outcome = fetch_source_code_files(&client, "acme", "widgets", "main").await?;
//! println!("{} files, {} skipped", outcome.files.len(), outcome.skipped);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod publisher;
pub mod types;
pub mod validate;

// Re-export the commonly used surface
pub use client::GitHubClient;
pub use config::PublisherConfig;
pub use error::{GitHubError, GitHubResult};
pub use fetch::{
    fetch_context_documents, fetch_repository_files, fetch_source_code_files, FetchConfig,
    FetchOutcome, DEFAULT_MAX_FILE_SIZE,
};
pub use publisher::CommitPublisher;
pub use types::{
    CredentialScope, FileRecord, PublishOutcome, PublishRequest, RepositoryIdentity,
};
pub use validate::validate_files;
