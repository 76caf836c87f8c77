use thiserror::Error;

/// The only failure a caller of `VerdictEngine::classify` can observe
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Scoring backend could not be loaded; the engine falls back to the mock scorer
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read model file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse model file: {0}")]
    Parse(String),

    #[error("Model shape mismatch: {0}")]
    Shape(String),
}

impl From<serde_yaml::Error> for ModelError {
    fn from(e: serde_yaml::Error) -> Self {
        ModelError::Parse(e.to_string())
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self {
        ModelError::Parse(e.to_string())
    }
}
