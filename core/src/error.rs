use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(#[from] bincode::Error),

    #[error("meta file error: {0}")]
    Meta(#[from] serde_json::Error),

    #[error("empty corpus: average document length is undefined")]
    EmptyCorpus,
}

impl IndexError {
    /// Attach the offending path to an I/O failure.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        IndexError::Io { path: path.as_ref().to_path_buf(), source }
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
