use thiserror::Error;

#[derive(Debug, Error)]
pub enum PermissionError {
    #[error("permission store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("permission store is not valid json: {0}")]
    Serde(#[from] serde_json::Error),
}
