//! notedex - an incremental hybrid search index for note vaults.
//!
//! notedex indexes a directory of markdown and plain-text notes,
//! combining keyword search via
//! [Tantivy](https://github.com/quickwit-oss/tantivy) with optional
//! vector search backed by an HTTP embedding provider. The whole index
//! persists as a single JSON sidecar inside the vault, and changed
//! notes are re-indexed incrementally by modification time.
//!
//! # Quick start
//!
//! ```no_run
//! use notedex::{FsVault, NoteIndexer, SearchConfig, SearchOptions};
//!
//! # #[tokio::main]
//! # async fn main() -> notedex::Result<()> {
//! let vault = FsVault::open("~/notes".as_ref())?;
//! let mut indexer =
//!     NoteIndexer::new(Box::new(vault), SearchConfig::default())?;
//! indexer.initialize().await?;
//!
//! let options = SearchOptions {
//!     use_vault_search: true,
//!     use_vector_search: false,
//! };
//! let context = indexer.search_vault("rust ownership", options).await;
//! println!("{context}");
//! # Ok(())
//! # }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod debounce;
pub mod embedding;
pub mod embedding_store;
pub mod error;
pub mod indexer;
pub mod persistence;
pub mod query;
pub mod text_index;
pub mod vault;

pub use chunking::NoteChunk;
pub use config::{EmbeddingConfig, EmbeddingProvider, SearchConfig};
pub use debounce::NoteDebouncer;
pub use embedding::{EmbedKind, Embedder, EmbeddingClient};
pub use error::{Error, Result};
pub use indexer::{FileOutcome, IndexStatus, NoteIndexer, ScanSummary};
pub use query::{ScoredChunk, SearchOptions};
pub use vault::{FsVault, NoteMeta, Vault};
