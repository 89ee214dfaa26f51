use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::Parser;
use notify::{RecursiveMode, Watcher};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use notedex::{
    NoteIndexer,
    cli::{Cli, Command, IndexArgs, IndexingOpts, SearchArgs, WatchArgs},
    config::{EmbeddingConfig, SearchConfig},
    debounce::NoteDebouncer,
    error::Result,
    persistence::{cleanup, spawn_autosave},
    query::SearchOptions,
    vault::{self, FsVault},
};

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("NOTEDEX_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let vault_root = cli.vault.unwrap_or_else(|| PathBuf::from("."));

    match cli.command {
        Command::Index(args) => cmd_index(&vault_root, args).await,
        Command::Search(args) => cmd_search(&vault_root, args).await,
        Command::Watch(args) => cmd_watch(&vault_root, args).await,
        Command::Status => cmd_status(&vault_root),
    }
}

fn build_indexer(
    vault_root: &Path,
    opts: &IndexingOpts,
    max_search_results: usize,
) -> Result<(FsVault, NoteIndexer)> {
    let vault = FsVault::open(vault_root)?;
    let config = SearchConfig {
        chunk_size: opts.chunk_size,
        chunk_overlap: opts.chunk_overlap,
        use_vector_search: opts.vector,
        max_search_results,
    };

    let mut indexer = NoteIndexer::new(Box::new(vault.clone()), config)?;
    if opts.vector {
        let embedding = EmbeddingConfig::from_parts(
            &opts.provider,
            opts.endpoint.clone(),
            opts.api_key.clone(),
            opts.model.clone(),
        )?;
        indexer.update_embedding_config(embedding);
    }
    Ok((vault, indexer))
}

async fn cmd_index(vault_root: &Path, args: IndexArgs) -> Result<()> {
    let (_vault, mut indexer) = build_indexer(vault_root, &args.indexing, 10)?;

    if args.rebuild {
        let summary = indexer.reindex_all().await?;
        println!("reindexed {} notes", summary.indexed);
    } else {
        indexer.initialize().await?;
        println!("index ready: {} chunks", indexer.chunk_count());
    }
    Ok(())
}

async fn cmd_search(vault_root: &Path, args: SearchArgs) -> Result<()> {
    let (_vault, mut indexer) =
        build_indexer(vault_root, &args.indexing, args.count)?;
    indexer.initialize().await?;

    let options = SearchOptions {
        use_vault_search: true,
        use_vector_search: args.indexing.vector,
    };
    let context = indexer.search_vault(&args.query, options).await;
    println!("{context}");
    Ok(())
}

fn cmd_status(vault_root: &Path) -> Result<()> {
    let vault = FsVault::open(vault_root)?;
    let mut indexer =
        NoteIndexer::new(Box::new(vault.clone()), SearchConfig::default())?;

    if indexer.load() {
        println!("vault:      {}", vault.root().display());
        println!("status:     {:?}", indexer.status());
        println!("chunks:     {}", indexer.chunk_count());
        println!("notes:      {}", indexer.tracked_note_count());
        println!("embeddings: {}", indexer.embedding_count());
    } else {
        println!("vault:  {}", vault.root().display());
        println!("status: not indexed (run `notedex index`)");
    }
    Ok(())
}

async fn cmd_watch(vault_root: &Path, args: WatchArgs) -> Result<()> {
    let (vault, mut indexer) = build_indexer(vault_root, &args.indexing, 10)?;
    indexer.initialize().await?;
    info!(chunks = indexer.chunk_count(), "watching vault for changes");

    let indexer = Arc::new(RwLock::new(indexer));
    let autosave = spawn_autosave(indexer.clone());
    let debouncer = NoteDebouncer::new(indexer.clone());

    // Bridge notify's callback thread into the async loop.
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(
        move |event: std::result::Result<notify::Event, notify::Error>| {
            let _ = tx.send(event);
        },
    )?;
    watcher.watch(vault.root(), RecursiveMode::Recursive)?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
            event = rx.recv() => {
                let Some(event) = event else { break };
                match event {
                    Ok(event) => {
                        handle_fs_event(&vault, &debouncer, event).await;
                    }
                    Err(e) => warn!(error = %e, "watch error"),
                }
            }
        }
    }

    debouncer.flush_pending().await;
    cleanup(autosave, &indexer).await;
    Ok(())
}

async fn handle_fs_event(
    vault: &FsVault,
    debouncer: &NoteDebouncer,
    event: notify::Event,
) {
    use notify::EventKind;

    let removed = matches!(event.kind, EventKind::Remove(_));
    if !removed
        && !matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_)
        )
    {
        return;
    }

    for path in &event.paths {
        let Some(relative) = note_path(vault, path) else {
            continue;
        };
        debug!(path = %relative, removed, "vault change");
        if removed {
            debouncer.note_removed(&relative).await;
        } else {
            debouncer.note_changed(&relative).await;
        }
    }
}

/// Map an absolute event path to a vault-relative note path, ignoring
/// non-note files and anything under a hidden directory (including the
/// index sidecar itself).
fn note_path(vault: &FsVault, absolute: &Path) -> Option<String> {
    let relative = absolute.strip_prefix(vault.root()).ok()?;
    if relative.components().any(|c| {
        c.as_os_str().to_string_lossy().starts_with('.')
    }) {
        return None;
    }
    if !vault::is_note_file(relative) {
        return None;
    }
    Some(relative.to_string_lossy().to_string())
}
