//! Configuration consumed by the indexer and query engine.
//!
//! The host owns the authoritative settings; the indexer keeps its own
//! copy, refreshed through the explicit `update_*` methods on
//! [`crate::indexer::NoteIndexer`].

use crate::error::{Error, Result};

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 4000;

/// Default overlap between adjacent chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Default number of results returned from a vault search.
pub const DEFAULT_MAX_SEARCH_RESULTS: usize = 10;

/// Search and chunking settings for one vault.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between adjacent chunks in characters. Must be smaller
    /// than `chunk_size`.
    pub chunk_overlap: usize,
    /// Whether vector search participates in queries.
    pub use_vector_search: bool,
    /// Number of results returned from a vault search.
    pub max_search_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            use_vector_search: false,
            max_search_results: DEFAULT_MAX_SEARCH_RESULTS,
        }
    }
}

impl SearchConfig {
    /// Reject configurations the chunker cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be nonzero".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.max_search_results == 0 {
            return Err(Error::Config(
                "max_search_results must be nonzero".into(),
            ));
        }
        Ok(())
    }
}

/// Which request shape to use when talking to the embedding provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingProvider {
    /// A local-model style endpoint (e.g. an Ollama-compatible server).
    Local { endpoint: String },
    /// A cloud API endpoint with bearer-token auth.
    Cloud { endpoint: String, api_key: String },
}

/// Embedding provider selection and model name.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
}

impl EmbeddingConfig {
    /// Parse a provider name into a config, validating required fields.
    pub fn from_parts(
        provider: &str,
        endpoint: String,
        api_key: Option<String>,
        model: String,
    ) -> Result<Self> {
        let provider = match provider.trim().to_ascii_lowercase().as_str() {
            "local" | "ollama" => EmbeddingProvider::Local { endpoint },
            "cloud" | "openai" => {
                let api_key = api_key.ok_or_else(|| {
                    Error::Config(
                        "cloud embedding provider requires an API key".into(),
                    )
                })?;
                EmbeddingProvider::Cloud { endpoint, api_key }
            }
            other => {
                return Err(Error::Config(format!(
                    "unsupported embedding provider: {other}"
                )));
            }
        };
        Ok(Self { provider, model })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SearchConfig::default().validate().is_ok());
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        let config = SearchConfig {
            chunk_size: 100,
            chunk_overlap: 100,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_chunk_size_rejected() {
        let config = SearchConfig {
            chunk_size: 0,
            chunk_overlap: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn parse_local_provider() {
        let config = EmbeddingConfig::from_parts(
            "local",
            "http://localhost:11434/api/embeddings".into(),
            None,
            "nomic-embed-text".into(),
        )
        .unwrap();
        assert!(matches!(config.provider, EmbeddingProvider::Local { .. }));
    }

    #[test]
    fn cloud_provider_requires_api_key() {
        let result = EmbeddingConfig::from_parts(
            "cloud",
            "https://api.example.com/v1/embeddings".into(),
            None,
            "text-embedding-3-small".into(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn unknown_provider_rejected() {
        let result = EmbeddingConfig::from_parts(
            "quantum",
            "http://localhost".into(),
            None,
            "m".into(),
        );
        assert!(result.is_err());
    }
}
