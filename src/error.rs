use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, DriveShellError>;

#[derive(Debug, thiserror::Error)]
pub enum DriveShellError {
    #[error("network error: {0}")]
    Network(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Generic(String),
}

impl DriveShellError {
    /// Classification used for `ListingState::last_error`. Backend failures
    /// collapse to the two user-relevant kinds; anything else is a network
    /// problem as far as the listing is concerned.
    pub fn listing_kind(&self) -> ErrorKind {
        match self {
            DriveShellError::NotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::Network,
        }
    }
}

impl From<String> for DriveShellError {
    fn from(error: String) -> Self {
        DriveShellError::Generic(error)
    }
}

impl From<&str> for DriveShellError {
    fn from(error: &str) -> Self {
        DriveShellError::Generic(error.to_string())
    }
}

/// Error classification stored on the listing after a failed refresh.
/// Stale responses are dropped before classification and never appear here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    NotFound,
}

impl ErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::NotFound => "not_found",
        }
    }
}
