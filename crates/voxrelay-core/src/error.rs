use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoxrelayError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Knowledge error: {0}")]
    Knowledge(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, VoxrelayError>;
