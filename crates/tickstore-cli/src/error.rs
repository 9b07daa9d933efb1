use thiserror::Error;
use tickstore_core::{StoreError, ValidationError};

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("line {line}: {message}")]
    Input { line: usize, message: String },

    #[error("{rejected} observation(s) rejected")]
    PartialIngest { rejected: usize },

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Input { .. } => 2,
            Self::Command(_) => 2,
            Self::Serialization(_) => 2,
            Self::PartialIngest { .. } => 3,
            Self::Store(error) => match error {
                StoreError::NotFound(_) => 4,
                StoreError::Warehouse(_) => 10,
                _ => 2,
            },
            Self::Io(_) => 10,
        }
    }
}
