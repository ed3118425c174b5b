use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelnotesError {
    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Transport closed: {0}")]
    Transport(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RelnotesError>;
