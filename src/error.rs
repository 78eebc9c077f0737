use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors that stop a pipeline stage before it writes any output
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Critical file missing: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Invalid key: {key} in {category}")]
    InvalidKey { key: String, category: String },

    #[error("Malformed tag: {tag:?} for {key}")]
    MalformedTag { tag: String, key: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure of a single call to the remote completion service.
///
/// These never abort a run: the refinement stage retries them and, once the
/// attempts are exhausted, records an error marker for the block instead.
#[derive(Debug, Error)]
pub enum RemoteCallError {
    #[error("network error: {0}")]
    Network(String),

    #[error("authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },

    #[error("rate limited ({status}): {message}")]
    RateLimit { status: u16, message: String },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl RemoteCallError {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::Auth { status, message },
            429 => Self::RateLimit { status, message },
            _ => Self::Api { status, message },
        }
    }

    /// Short summary used in the raw reply file's error marker line
    pub fn summary(&self) -> String {
        self.to_string().chars().take(ERROR_SUMMARY_CHARS).collect()
    }
}

impl From<reqwest::Error> for RemoteCallError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RemoteCallError::MalformedResponse(err.to_string())
        } else {
            RemoteCallError::Network(err.to_string())
        }
    }
}

/// Number of characters of an error message kept in the marker line
pub const ERROR_SUMMARY_CHARS: usize = 50;
