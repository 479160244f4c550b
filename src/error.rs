use thiserror::Error;

/// Unified error type for release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Changelog error: {0}")]
    Changelog(String),

    #[error("Invalid version semantics: {desired} is not greater than {previous}")]
    Ordering { desired: String, previous: String },

    #[error("Unauthorised, please check credentials ({provider}): {message}")]
    Auth { provider: String, message: String },

    #[error("Repo not found ({provider}): {message}")]
    NotFound { provider: String, message: String },

    #[error("{provider} responded with status {status}: {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Tag {tag} already exists at {actual}, expected {expected}")]
    TagConflict {
        tag: String,
        expected: String,
        actual: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for Results in changelog-release
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl From<reqwest::Error> for ReleaseError {
    fn from(err: reqwest::Error) -> Self {
        ReleaseError::Transport(err.to_string())
    }
}

impl ReleaseError {
    /// Create a usage error with context
    pub fn usage(msg: impl Into<String>) -> Self {
        ReleaseError::Usage(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a changelog error with context
    pub fn changelog(msg: impl Into<String>) -> Self {
        ReleaseError::Changelog(msg.into())
    }

    /// Create a transport error with context
    pub fn transport(msg: impl Into<String>) -> Self {
        ReleaseError::Transport(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        ReleaseError::Remote(msg.into())
    }

    /// Process exit code for this error: 2 for bad input, 1 for everything else
    pub fn exit_code(&self) -> i32 {
        match self {
            ReleaseError::Usage(_) | ReleaseError::Config(_) => 2,
            _ => 1,
        }
    }
}
