use thiserror::Error;

/// Failure reported by the game catalog.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::new(e.to_string())
    }
}

/// Errors that end a launcher session.
#[derive(Error, Debug)]
pub enum LauncherError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("catalog unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("presentation error: {0}")]
    Presentation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LauncherError>;
