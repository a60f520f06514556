use taskboard_core::{EngineError, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("Unknown command: {0} (try `help`)")]
    UnknownCommand(String),

    #[error("No card titled {0:?}")]
    CardNotFound(String),

    #[error("No column named {0:?}")]
    ColumnNotFound(String),

    #[error("Board has no columns")]
    NoColumns,

    #[error("Board {0:?} has expired")]
    BoardExpired(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
