//! The boundary to the host's note collection.
//!
//! The indexer never touches the filesystem directly; it goes through
//! the [`Vault`] trait so the host can supply any storage backend.
//! [`FsVault`] is the bundled implementation for a directory of
//! markdown and plain-text files.

use std::{
    path::{Path, PathBuf},
    time::SystemTime,
};

use crate::error::{Error, Result};

/// Directory name for notedex's private per-vault state.
pub const CONFIG_DIR_NAME: &str = ".notedex";

/// Metadata for one note in the vault. The path doubles as the note's
/// identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteMeta {
    /// Vault-relative path, also the note id.
    pub path: String,
    /// Display title. [`extract_title`] may refine this from content.
    pub title: String,
    /// Last modification time, seconds since the Unix epoch.
    pub mtime: u64,
}

/// Read access to the host's note collection.
pub trait Vault: Send + Sync {
    /// Enumerate every note with its metadata.
    fn list_notes(&self) -> Result<Vec<NoteMeta>>;

    /// Stat a single note. Returns `None` if it no longer exists.
    fn note_meta(&self, path: &str) -> Result<Option<NoteMeta>>;

    /// Read a note's full content.
    fn read_note(&self, path: &str) -> Result<String>;

    /// The vault's private configuration directory, where the index
    /// sidecar lives.
    fn config_dir(&self) -> PathBuf;
}

/// Supported file extensions for note discovery.
const SUPPORTED_EXTENSIONS: &[&str] = &["md", "txt"];

/// A vault rooted at a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    /// Open a vault at the given directory.
    pub fn open(root: &Path) -> Result<Self> {
        let root = root.canonicalize()?;
        if !root.is_dir() {
            return Err(Error::Config(format!(
                "vault root is not a directory: {}",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn walk(&self, current: &Path, results: &mut Vec<NoteMeta>) -> Result<()> {
        for entry in std::fs::read_dir(current)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();

            // Skip hidden files and directories.
            if name.starts_with('.') {
                continue;
            }

            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                self.walk(&entry.path(), results)?;
            } else if file_type.is_file() && is_note_file(&entry.path()) {
                if let Some(meta) = self.stat_file(&entry.path())? {
                    results.push(meta);
                }
            }
        }
        Ok(())
    }

    fn stat_file(&self, absolute: &Path) -> Result<Option<NoteMeta>> {
        let relative = absolute
            .strip_prefix(&self.root)
            .unwrap_or(absolute)
            .to_string_lossy()
            .to_string();

        let mtime = std::fs::metadata(absolute)?
            .modified()
            .unwrap_or(SystemTime::UNIX_EPOCH)
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let title = Path::new(&relative)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("untitled")
            .to_string();

        Ok(Some(NoteMeta {
            path: relative,
            title,
            mtime,
        }))
    }
}

impl Vault for FsVault {
    fn list_notes(&self) -> Result<Vec<NoteMeta>> {
        let mut results = Vec::new();
        self.walk(&self.root.clone(), &mut results)?;
        results.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(results)
    }

    fn note_meta(&self, path: &str) -> Result<Option<NoteMeta>> {
        let absolute = self.root.join(path);
        if !absolute.is_file() || !is_note_file(&absolute) {
            return Ok(None);
        }
        self.stat_file(&absolute)
    }

    fn read_note(&self, path: &str) -> Result<String> {
        let absolute = self.root.join(path);
        std::fs::read_to_string(&absolute)
            .map_err(|_| Error::NoteNotFound(path.to_string()))
    }

    fn config_dir(&self) -> PathBuf {
        self.root.join(CONFIG_DIR_NAME)
    }
}

/// Whether a path looks like a note the vault would index.
pub fn is_note_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
}

/// Extract a display title from note content.
///
/// Looks for the first markdown heading (line starting with `# `), then
/// falls back to the metadata title.
pub fn extract_title(content: &str, fallback: &str) -> String {
    for line in content.lines() {
        let trimmed = line.trim();
        if let Some(heading) = trimmed.strip_prefix("# ") {
            let title = heading.trim();
            if !title.is_empty() {
                return title.to_string();
            }
        }
    }
    fallback.to_string()
}
