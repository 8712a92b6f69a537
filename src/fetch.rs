//! Remote tree walking: enumerate a branch's files, filter them, and
//! materialize their contents for downstream consumption.
//!
//! Single-entry failures are logged and counted as skips; a walk only fails
//! as a whole when the tree listing itself cannot be fetched. Partial
//! success is the steady state for large repositories.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use glob::Pattern;
use tracing::{debug, info, warn};

use crate::client::GitHubClient;
use crate::error::{GitHubError, GitHubResult};
use crate::types::{FileRecord, RepositoryIdentity};

/// Default cap on fetched file size: 1 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1_048_576;

/// Extension allow-list used by [`fetch_source_code_files`].
const SOURCE_EXTENSIONS: &[&str] = &[
    "rs", "ts", "tsx", "js", "jsx", "py", "go", "java", "c", "h", "cpp", "hpp", "cs", "rb", "php",
    "swift", "kt", "scala", "sh", "md", "toml", "yaml", "yml", "json", "html", "css", "sql", "txt",
];

/// Exclude patterns used by [`fetch_source_code_files`].
const SOURCE_EXCLUDES: &[&str] = &[
    "node_modules/*",
    "dist/*",
    "build/*",
    "target/*",
    "vendor/*",
    "*.min.js",
    "*.min.css",
    "package-lock.json",
    "pnpm-lock.yaml",
    "*.lock",
];

/// Project context documents fetched by [`fetch_context_documents`].
const CONTEXT_DOCUMENTS: &[&str] = &[
    "project_brief.md",
    "technical_spec.md",
    "implementation_plan.md",
    "coding_guidelines.md",
    "README.md",
];

/// Filtering applied while walking a remote tree.
#[derive(Clone)]
pub struct FetchConfig {
    /// Keep only these lowercase extensions when non-empty.
    pub include_extensions: HashSet<String>,
    /// Glob patterns matched against the full repository path; a match skips
    /// the entry.
    pub exclude_patterns: Vec<String>,
    /// Skip files whose remote-reported size exceeds this.
    pub max_file_size: u64,
    /// Keep non-UTF-8 payloads as their raw base64 text instead of skipping.
    pub include_binary: bool,
    /// Final predicate over (path, content); rejection skips the entry.
    pub custom_filter: Option<Arc<dyn Fn(&str, &str) -> bool + Send + Sync>>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            include_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            include_binary: false,
            custom_filter: None,
        }
    }
}

impl fmt::Debug for FetchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchConfig")
            .field("include_extensions", &self.include_extensions)
            .field("exclude_patterns", &self.exclude_patterns)
            .field("max_file_size", &self.max_file_size)
            .field("include_binary", &self.include_binary)
            .field("custom_filter", &self.custom_filter.is_some())
            .finish()
    }
}

/// Files surviving the walk plus the number of entries filtered out or
/// failed; the skip count is observability, not a correctness signal.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub files: Vec<FileRecord>,
    pub skipped: usize,
}

/// Walk `branch` of `owner/repo` and return the files surviving every
/// configured filter.
///
/// When `branch` is `main` and has no tree, the walk retries once against
/// `master` before failing; an explicitly requested non-default branch that
/// is missing stays a hard error.
pub async fn fetch_repository_files(
    client: &GitHubClient,
    owner: &str,
    repo: &str,
    branch: &str,
    config: &FetchConfig,
) -> GitHubResult<FetchOutcome> {
    let identity = RepositoryIdentity::new(owner, repo);

    let listing = match client.recursive_tree(&identity, branch).await {
        Ok(listing) => listing,
        Err(GitHubError::NotFound { .. }) if branch == "main" => {
            debug!(%identity, "no tree on main, falling back to master");
            client.recursive_tree(&identity, "master").await?
        }
        Err(e) => return Err(e),
    };

    let patterns = compile_patterns(&config.exclude_patterns);
    let max_size = config.max_file_size;

    let mut files = Vec::new();
    let mut skipped = 0usize;

    for entry in &listing.tree {
        if entry.entry_type != "blob" {
            continue;
        }
        let path = entry.path.as_str();

        if patterns.iter().any(|p| p.matches(path)) {
            debug!(path, "skipping excluded path");
            skipped += 1;
            continue;
        }

        if !config.include_extensions.is_empty() {
            match extension_of(path) {
                Some(ext) if config.include_extensions.contains(&ext) => {}
                _ => {
                    debug!(path, "skipping path outside extension allow-list");
                    skipped += 1;
                    continue;
                }
            }
        }

        let blob = match client.blob(&identity, &entry.sha).await {
            Ok(blob) => blob,
            Err(e) => {
                warn!(path, error = %e, "failed to fetch blob, skipping entry");
                skipped += 1;
                continue;
            }
        };

        let size = blob.size.or(entry.size).unwrap_or(0);
        if size > max_size {
            debug!(path, size, max_size, "skipping oversized file");
            skipped += 1;
            continue;
        }

        let raw = match decode_base64(&blob.content) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path, error = %e, "failed to decode blob payload, skipping entry");
                skipped += 1;
                continue;
            }
        };

        let content = match String::from_utf8(raw) {
            Ok(text) => text,
            Err(_) if config.include_binary => compact_base64(&blob.content),
            Err(_) => {
                debug!(path, "skipping binary file");
                skipped += 1;
                continue;
            }
        };

        if let Some(filter) = &config.custom_filter {
            if !filter(path, &content) {
                debug!(path, "skipping file rejected by custom filter");
                skipped += 1;
                continue;
            }
        }

        files.push(FileRecord::new(path, content));
    }

    info!(
        %identity,
        fetched = files.len(),
        skipped,
        "repository walk complete"
    );
    Ok(FetchOutcome { files, skipped })
}

/// Preset walk over common source/text extensions with dependency and
/// build-artifact directories excluded. Configuration only; same walker.
pub async fn fetch_source_code_files(
    client: &GitHubClient,
    owner: &str,
    repo: &str,
    branch: &str,
) -> GitHubResult<FetchOutcome> {
    let config = FetchConfig {
        include_extensions: SOURCE_EXTENSIONS.iter().map(|s| (*s).to_string()).collect(),
        exclude_patterns: SOURCE_EXCLUDES.iter().map(|s| (*s).to_string()).collect(),
        ..FetchConfig::default()
    };
    fetch_repository_files(client, owner, repo, branch, &config).await
}

/// Fetch the project's context documents (brief, specs, guidelines, README)
/// and join them for prompt assembly. Absent documents are skipped silently;
/// `None` when no document exists.
pub async fn fetch_context_documents(
    client: &GitHubClient,
    owner: &str,
    repo: &str,
) -> GitHubResult<Option<String>> {
    let identity = RepositoryIdentity::new(owner, repo);
    let mut parts = Vec::new();

    for name in CONTEXT_DOCUMENTS {
        let contents = match client.file_contents(&identity, name).await {
            Ok(Some(contents)) => contents,
            Ok(None) => continue,
            Err(e) => {
                debug!(document = name, error = %e, "skipping unreadable context document");
                continue;
            }
        };
        match decode_base64(&contents.content).map(String::from_utf8) {
            Ok(Ok(text)) => parts.push(format!("# {name}\n\n{text}")),
            _ => debug!(document = name, "skipping undecodable context document"),
        }
    }

    if parts.is_empty() {
        return Ok(None);
    }
    Ok(Some(parts.join("\n\n---\n\n")))
}

fn compile_patterns(patterns: &[String]) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|raw| match Pattern::new(raw) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!(pattern = raw, error = %e, "ignoring malformed exclude pattern");
                None
            }
        })
        .collect()
}

/// Lowercase suffix after the last `.` of the final path segment.
fn extension_of(path: &str) -> Option<String> {
    let file_name = path.rsplit('/').next()?;
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// GitHub base64 payloads are newline-wrapped; decode ignores the wrapping.
fn decode_base64(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    BASE64.decode(compact_base64(payload))
}

fn compact_base64(payload: &str) -> String {
    payload.chars().filter(|c| !c.is_whitespace()).collect()
}
