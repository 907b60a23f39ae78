use thiserror::Error;

#[derive(Error, Debug)]
pub enum EddyError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Temporary failure: {0}")]
    Transient(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

/// Coarse failure classes that drive retry and notification policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Terminal and expected: end of history, unknown channel, nothing newer.
    NotFound,
    /// Network or server trouble; retrying later may succeed.
    Transient,
    /// Malformed input or payload; retrying will not help.
    Validation,
}

impl EddyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EddyError::NotFound(_) => ErrorKind::NotFound,
            EddyError::Validation(_)
            | EddyError::Json(_)
            | EddyError::InvalidUrl(_)
            | EddyError::Config(_) => ErrorKind::Validation,
            EddyError::Transient(_)
            | EddyError::Http(_)
            | EddyError::Database(_)
            | EddyError::Io(_)
            | EddyError::Other(_) => ErrorKind::Transient,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

pub type Result<T> = std::result::Result<T, EddyError>;
