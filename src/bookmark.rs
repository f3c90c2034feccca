//! Single-slot bookmark remembering the last page the reader saved.
//!
//! The slot lives in `<cache_dir>/bookmark.toml` as a tiny TOML file with one
//! `bookmark` key holding the page index as a string. It is not tied to any
//! particular document: opening another file restores the same index, as long
//! as that file has enough pages.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const BOOKMARK_FILE: &str = "bookmark.toml";

#[derive(Serialize, Deserialize)]
struct BookmarkEntry {
    bookmark: String,
}

#[derive(Debug, Clone)]
pub struct BookmarkStore {
    path: PathBuf,
}

impl BookmarkStore {
    pub fn in_dir(cache_dir: &Path) -> Self {
        Self {
            path: cache_dir.join(BOOKMARK_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the slot with `page_index`.
    pub fn save(&self, page_index: usize) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Creating bookmark dir {}", parent.display()))?;
        }
        let entry = BookmarkEntry {
            bookmark: page_index.to_string(),
        };
        let contents = toml::to_string(&entry).context("Serializing bookmark")?;
        fs::write(&self.path, contents)
            .with_context(|| format!("Writing bookmark to {}", self.path.display()))?;
        debug!(page = page_index + 1, path = %self.path.display(), "Saved bookmark");
        Ok(())
    }

    /// Last saved page index, if any was ever saved and it still parses.
    pub fn load(&self) -> Option<usize> {
        let data = fs::read_to_string(&self.path).ok()?;
        let entry: BookmarkEntry = match toml::from_str(&data) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(path = %self.path.display(), "Ignoring unreadable bookmark: {err}");
                return None;
            }
        };
        match entry.bookmark.trim().parse::<usize>() {
            Ok(page) => Some(page),
            Err(err) => {
                warn!(value = %entry.bookmark, "Ignoring non-numeric bookmark: {err}");
                None
            }
        }
    }
}

/// Page to open at: the bookmark when it fits the current page count, else 0.
pub fn resolve_start_page(bookmark: Option<usize>, page_count: usize) -> usize {
    match bookmark {
        Some(page) if page < page_count => page,
        Some(page) => {
            debug!(page, page_count, "Bookmark out of range, starting at first page");
            0
        }
        None => 0,
    }
}
