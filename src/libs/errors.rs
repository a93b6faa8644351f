//! # Fetch Errors
//!
//! Every failure a fetch run can hit is a `FetchError`. Most of them abort the whole run
//! (unreadable configuration, GitHub API failures, broken downloads). `Validation` is the
//! exception: it marks a single tool as invalid and the run moves on to the next tool.

use std::io;
use thiserror::Error;

/// Coarse classification used by the orchestrator to decide whether to keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Aborts the run.
    Generic,
    /// Marks the current tool invalid; the run continues.
    Validation,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("configuration error: {0}")]
    Config(String),

    /// The GitHub API answered, but not with a release we can use.
    #[error("github request was not successful: {0}")]
    Github(String),

    /// The connection itself failed (DNS, refused, TLS, ...).
    #[error("network error - did you forget to set a proxy?\n{0}")]
    Network(String),

    #[error("HTTP {status} while fetching {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("invalid download URL template {template:?}: {reason}")]
    Template { template: String, reason: String },

    /// The installed binary failed the architecture check or the configured check command.
    #[error("validation failed: {0}")]
    Validation(String),
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Validation(_) => ErrorKind::Validation,
            _ => ErrorKind::Generic,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        FetchError::Validation(msg.into())
    }
}

impl From<ureq::Error> for FetchError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => FetchError::HttpStatus {
                url: response.get_url().to_string(),
                status,
            },
            ureq::Error::Transport(transport) => FetchError::Network(transport.to_string()),
        }
    }
}
