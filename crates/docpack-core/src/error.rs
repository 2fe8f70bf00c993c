use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Estimation failed: {0}")]
    Estimation(String),

    #[error("Chunk planning failed: {0}")]
    ChunkPlanning(String),

    #[error("Invalid batch config: {0}")]
    InvalidBatchConfig(String),

    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Access error: {0}")]
    Access(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
