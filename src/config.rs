use serde::{Deserialize, Serialize};

/// Default GitHub REST endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_blob_concurrency() -> usize {
    4
}

fn default_creation_grace_ms() -> u64 {
    2000
}

fn default_readiness_poll_attempts() -> u32 {
    5
}

/// Configuration for a publisher/fetcher instance.
///
/// A config value is constructed per use and handed to [`crate::GitHubClient::new`];
/// nothing here is process-global, so differently-configured clients can
/// coexist in one process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Personal access token presented as a bearer credential on every request.
    pub token: String,

    /// API base URL. Overridable for GitHub Enterprise hosts and for tests.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Per-request timeout in seconds. A timeout surfaces as a retryable
    /// transport error.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retry attempts for transport-level failures. Remote 4xx verdicts are
    /// never retried.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Upper bound on concurrent blob creations during a publish.
    #[serde(default = "default_blob_concurrency")]
    pub blob_concurrency: usize,

    /// Grace period after repository creation before the object graph is
    /// read, in milliseconds. Reads straight after creation can race the
    /// store's eventual consistency.
    #[serde(default = "default_creation_grace_ms")]
    pub creation_grace_ms: u64,

    /// Existence polls performed after the grace period before giving up on
    /// a freshly created repository.
    #[serde(default = "default_readiness_poll_attempts")]
    pub readiness_poll_attempts: u32,
}

impl PublisherConfig {
    /// Create a configuration with the given token and default settings.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            blob_concurrency: default_blob_concurrency(),
            creation_grace_ms: default_creation_grace_ms(),
            readiness_poll_attempts: default_readiness_poll_attempts(),
        }
    }

    /// Point the client at a different API host (Enterprise installs, test
    /// servers). Trailing slashes are trimmed so path joining stays uniform.
    pub fn with_api_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base: String = base_url.into();
        self.api_base_url = base.trim_end_matches('/').to_string();
        self
    }
}
