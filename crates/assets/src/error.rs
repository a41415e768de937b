use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AssetError>;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Unable to access {path}: {source}")]
    Access {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid asset key: {0}")]
    InvalidKey(String),

    #[error("Invalid hidden pattern: {0}")]
    InvalidPattern(#[from] globset::Error),

    #[error("Scan worker unavailable: {0}")]
    Worker(String),
}

impl AssetError {
    pub fn access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Access {
            path: path.into(),
            source,
        }
    }
}
