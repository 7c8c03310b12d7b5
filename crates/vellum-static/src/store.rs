//! Content store abstraction.
//!
//! The engine never touches the filesystem directly. Every read and write
//! goes through a [`ContentStore`], addressed by slash-separated paths
//! relative to the content root (`""` is the root itself).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use walkdir::WalkDir;

/// One file reported by [`ContentStore::list_files`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    /// Slash-separated path relative to the content root
    pub path: String,
    /// Last modification time
    pub modified: DateTime<Utc>,
}

/// Immediate children of one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirListing {
    /// File paths, relative to the content root
    pub files: Vec<String>,
    /// Folder paths, relative to the content root
    pub folders: Vec<String>,
}

/// Errors raised by a content store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    fn io(path: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound(path.to_string())
        } else {
            StoreError::Io {
                path: path.to_string(),
                source,
            }
        }
    }
}

/// Narrow file API the site builder runs against.
pub trait ContentStore: Send + Sync {
    /// List every file below the root, in a stable order.
    fn list_files(&self) -> Result<Vec<StoreEntry>, StoreError>;

    /// List the immediate files and folders of a directory.
    fn list_dir(&self, path: &str) -> Result<DirListing, StoreError>;

    fn read_text(&self, path: &str) -> Result<String, StoreError>;

    fn read_binary(&self, path: &str) -> Result<Vec<u8>, StoreError>;

    fn write_text(&self, path: &str, content: &str) -> Result<(), StoreError>;

    fn write_binary(&self, path: &str, content: &[u8]) -> Result<(), StoreError>;

    fn exists(&self, path: &str) -> bool;

    /// Create a directory and any missing parents.
    fn mkdir(&self, path: &str) -> Result<(), StoreError>;

    /// Remove an empty directory.
    fn rmdir(&self, path: &str) -> Result<(), StoreError>;

    /// Remove a single file.
    fn remove(&self, path: &str) -> Result<(), StoreError>;
}

/// [`ContentStore`] backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory this store is rooted at.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |acc, segment| acc.join(segment))
    }

    fn relative(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let segments: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(segments.join("/"))
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

impl ContentStore for FsStore {
    fn list_files(&self) -> Result<Vec<StoreEntry>, StoreError> {
        let mut entries = Vec::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(&e.file_name().to_string_lossy()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let Some(path) = self.relative(entry.path()) else {
                continue;
            };

            let modified = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .unwrap_or(SystemTime::UNIX_EPOCH);

            entries.push(StoreEntry {
                path,
                modified: DateTime::<Utc>::from(modified),
            });
        }

        Ok(entries)
    }

    fn list_dir(&self, path: &str) -> Result<DirListing, StoreError> {
        let mut listing = DirListing::default();

        let read_dir = fs::read_dir(self.resolve(path)).map_err(|e| StoreError::io(path, e))?;
        for entry in read_dir {
            let entry = entry.map_err(|e| StoreError::io(path, e))?;
            let Some(child) = self.relative(&entry.path()) else {
                continue;
            };
            let file_type = entry.file_type().map_err(|e| StoreError::io(&child, e))?;
            if file_type.is_dir() {
                listing.folders.push(child);
            } else {
                listing.files.push(child);
            }
        }

        listing.files.sort();
        listing.folders.sort();
        Ok(listing)
    }

    fn read_text(&self, path: &str) -> Result<String, StoreError> {
        fs::read_to_string(self.resolve(path)).map_err(|e| StoreError::io(path, e))
    }

    fn read_binary(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        fs::read(self.resolve(path)).map_err(|e| StoreError::io(path, e))
    }

    fn write_text(&self, path: &str, content: &str) -> Result<(), StoreError> {
        fs::write(self.resolve(path), content).map_err(|e| StoreError::io(path, e))
    }

    fn write_binary(&self, path: &str, content: &[u8]) -> Result<(), StoreError> {
        fs::write(self.resolve(path), content).map_err(|e| StoreError::io(path, e))
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }

    fn mkdir(&self, path: &str) -> Result<(), StoreError> {
        fs::create_dir_all(self.resolve(path)).map_err(|e| StoreError::io(path, e))
    }

    fn rmdir(&self, path: &str) -> Result<(), StoreError> {
        fs::remove_dir(self.resolve(path)).map_err(|e| StoreError::io(path, e))
    }

    fn remove(&self, path: &str) -> Result<(), StoreError> {
        fs::remove_file(self.resolve(path)).map_err(|e| StoreError::io(path, e))
    }
}
