use thiserror::Error;

/// Error types for remote repository operations
#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Remote rejected the request: {message}")]
    Validation { message: String },

    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("No valid files to publish after validation")]
    NoValidFiles,
}

/// Result type alias for remote repository operations
pub type GitHubResult<T> = Result<T, GitHubError>;

impl GitHubError {
    /// Create a new Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a new NotFound error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a new Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a new Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new Auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Whether a retry with backoff can reasonably succeed.
    ///
    /// Only transport-level failures qualify; the remote's 4xx verdicts are
    /// stable and retrying them just burns rate limit.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

impl From<reqwest::Error> for GitHubError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transport {
                message: format!("Request timeout: {err}"),
            }
        } else if err.is_connect() {
            Self::Transport {
                message: format!("Connection error: {err}"),
            }
        } else {
            Self::Transport {
                message: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_not_found() {
        let err = GitHubError::not_found("repository acme/widgets");
        assert_eq!(err.to_string(), "Not found: repository acme/widgets");
    }

    #[test]
    fn test_display_no_valid_files() {
        assert_eq!(
            GitHubError::NoValidFiles.to_string(),
            "No valid files to publish after validation"
        );
    }

    #[test]
    fn test_retryability() {
        assert!(GitHubError::transport("connection reset").is_retryable());
        assert!(!GitHubError::not_found("branch main").is_retryable());
        assert!(!GitHubError::validation("tree.path contains a malformed path").is_retryable());
        assert!(!GitHubError::conflict("Git Repository is empty").is_retryable());
        assert!(!GitHubError::auth("Bad credentials").is_retryable());
        assert!(!GitHubError::NoValidFiles.is_retryable());
    }
}
