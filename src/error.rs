pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("full-text index error: {0}")]
    Index(#[from] tantivy::TantivyError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("embedding request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("file watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("embedding provider returned {status}: {message}")]
    Embedding { status: u16, message: String },

    #[error("vector length mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("index is not ready")]
    IndexNotReady,

    #[error("indexing halted: {0}")]
    IndexingFailed(String),

    #[error("note not found: {0}")]
    NoteNotFound(String),
}
