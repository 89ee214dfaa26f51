//! End-to-end lifecycle over a real on-disk vault: build the index,
//! persist it, restore it in a fresh process, and keep it incremental.

use std::{
    path::Path,
    time::{Duration, SystemTime},
};

use notedex::{
    FsVault,
    IndexStatus,
    NoteIndexer,
    SearchConfig,
    SearchOptions,
    query::NO_RELEVANT_CONTENT,
};

const KEYWORD_ONLY: SearchOptions = SearchOptions {
    use_vault_search: true,
    use_vector_search: false,
};

fn write_note(root: &Path, name: &str, content: &str) {
    std::fs::write(root.join(name), content).unwrap();
}

fn bump_mtime(root: &Path, name: &str, seconds_forward: u64) {
    let file = std::fs::File::options()
        .write(true)
        .open(root.join(name))
        .unwrap();
    file.set_modified(
        SystemTime::now() + Duration::from_secs(seconds_forward),
    )
    .unwrap();
}

fn open_indexer(root: &Path) -> NoteIndexer {
    let vault = FsVault::open(root).unwrap();
    NoteIndexer::new(Box::new(vault), SearchConfig::default()).unwrap()
}

#[tokio::test]
async fn index_persist_reload_search() {
    let tmp = tempfile::tempdir().unwrap();
    write_note(
        tmp.path(),
        "rust.md",
        "# Rust Ownership\n\nOwnership moves values; borrows lend them.",
    );
    write_note(
        tmp.path(),
        "cooking.md",
        "# Weeknight Pasta\n\nBoil water, salt it, cook the pasta.",
    );

    let mut indexer = open_indexer(tmp.path());
    indexer.initialize().await.unwrap();
    assert_eq!(indexer.status(), IndexStatus::Ready);
    assert_eq!(indexer.chunk_count(), 2);
    assert!(tmp.path().join(".notedex/search-index.json").exists());

    let context = indexer.search_vault("ownership", KEYWORD_ONLY).await;
    assert!(context.contains("## Rust Ownership"));
    assert!(context.contains("Source: rust.md"));
    drop(indexer);

    // A fresh indexer restores from the sidecar and skips every
    // unchanged note on its startup scan.
    let mut restored = open_indexer(tmp.path());
    restored.initialize().await.unwrap();
    assert_eq!(restored.chunk_count(), 2);

    let context = restored.search_vault("pasta", KEYWORD_ONLY).await;
    assert!(context.contains("## Weeknight Pasta"));
}

#[tokio::test]
async fn startup_scan_picks_up_edits_and_new_notes() {
    let tmp = tempfile::tempdir().unwrap();
    write_note(tmp.path(), "a.md", "# Alpha\n\noriginal alpha body");

    let mut indexer = open_indexer(tmp.path());
    indexer.initialize().await.unwrap();
    drop(indexer);

    write_note(tmp.path(), "a.md", "# Alpha\n\nnow about telescopes");
    bump_mtime(tmp.path(), "a.md", 10);
    write_note(tmp.path(), "b.md", "# Beta\n\na brand new note");

    let mut indexer = open_indexer(tmp.path());
    indexer.initialize().await.unwrap();
    assert_eq!(indexer.chunk_count(), 2);

    let context = indexer.search_vault("telescopes", KEYWORD_ONLY).await;
    assert!(context.contains("Source: a.md"));
    let stale = indexer.search_vault("original", KEYWORD_ONLY).await;
    assert_eq!(stale, NO_RELEVANT_CONTENT);
}

#[tokio::test]
async fn reindex_drops_notes_deleted_while_offline() {
    let tmp = tempfile::tempdir().unwrap();
    write_note(tmp.path(), "keep.md", "# Keep\n\nstays around");
    write_note(tmp.path(), "gone.md", "# Gone\n\nwill be deleted");

    let mut indexer = open_indexer(tmp.path());
    indexer.initialize().await.unwrap();
    assert_eq!(indexer.chunk_count(), 2);
    drop(indexer);

    std::fs::remove_file(tmp.path().join("gone.md")).unwrap();

    let mut indexer = open_indexer(tmp.path());
    let summary = indexer.reindex_all().await.unwrap();
    assert_eq!(summary.indexed, 1);
    assert_eq!(indexer.chunk_count(), 1);
    assert_eq!(
        indexer.search_vault("deleted", KEYWORD_ONLY).await,
        NO_RELEVANT_CONTENT
    );
}
