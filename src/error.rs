use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Failure of a single outbound request.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("{url} returned status {status}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    #[error("{url} returned a body that is not valid JSON: {message}")]
    Decode { url: String, message: String },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            FetchError::Transport { url, .. }
            | FetchError::Timeout { url }
            | FetchError::Status { url, .. }
            | FetchError::Decode { url, .. } => url,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum PokedexError {
    #[error(transparent)]
    // No `#[diagnostic(transparent)]`: the forwarding would resolve to the inherent
    // `FetchError::url() -> &str`. FetchError carries no diagnostic metadata, so
    // the default (all `None`) is equivalent.
    Fetch(#[from] FetchError),

    #[error("unexpected payload from {url}: {message}")]
    MalformedPayload { url: String, message: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("catalogue is locked by another writer: {0}")]
    #[diagnostic(help("remove the lock file if no seed job is running"))]
    StoreLocked(String),

    #[error("pokemon not found: {0}")]
    PokemonNotFound(String),
}
