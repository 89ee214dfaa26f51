use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "notedex",
    about = "Hybrid keyword + vector search over a directory of notes"
)]
pub struct Cli {
    /// Path to the note vault (defaults to the current directory)
    #[arg(long, global = true)]
    pub vault: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build or update the vault index
    Index(IndexArgs),
    /// Search the vault
    Search(SearchArgs),
    /// Watch the vault and index changes as they happen
    Watch(WatchArgs),
    /// Show index status and statistics
    Status,
}

#[derive(Debug, Parser)]
pub struct IndexArgs {
    /// Discard existing index state and rebuild from scratch
    #[arg(long)]
    pub rebuild: bool,

    #[command(flatten)]
    pub indexing: IndexingOpts,
}

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// The search query
    pub query: String,

    /// Maximum number of results
    #[arg(short = 'n', long, default_value = "10")]
    pub count: usize,

    #[command(flatten)]
    pub indexing: IndexingOpts,
}

#[derive(Debug, Parser)]
pub struct WatchArgs {
    #[command(flatten)]
    pub indexing: IndexingOpts,
}

/// Options shared by every command that touches the index.
#[derive(Debug, Parser)]
pub struct IndexingOpts {
    /// Enable vector search (requires an embedding endpoint)
    #[arg(long)]
    pub vector: bool,

    /// Embedding provider: "local" (Ollama-style) or "cloud" (OpenAI-style)
    #[arg(long, default_value = "local")]
    pub provider: String,

    /// Embedding endpoint URL
    #[arg(long, default_value = "http://localhost:11434/api/embeddings")]
    pub endpoint: String,

    /// Embedding model name
    #[arg(long, default_value = "nomic-embed-text")]
    pub model: String,

    /// API key for cloud providers (falls back to $NOTEDEX_API_KEY)
    #[arg(long, env = "NOTEDEX_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Characters per chunk
    #[arg(long, default_value = "4000")]
    pub chunk_size: usize,

    /// Characters of overlap between consecutive chunks
    #[arg(long, default_value = "200")]
    pub chunk_overlap: usize,
}
