//! Error type shared by every module of the crate.

use thiserror::Error;

/// Main error type for the learning rate finder.
#[derive(Error, Debug)]
pub enum FinderError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("State restore failed: {0}")]
    Restore(String),

    #[error("Trainable unit error: {0}")]
    Unit(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FinderError {
    /// Whether this error means the unit may have been left in a diverged state.
    pub fn is_restore_failure(&self) -> bool {
        matches!(self, FinderError::Restore(_))
    }
}

pub type Result<T> = std::result::Result<T, FinderError>;
