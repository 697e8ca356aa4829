// Copyright (c) UnnamedOrange. Licensed under the MIT License.
// See the LICENSE file in the repository root for full license text.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Fixed identifier the draft is stored under.
pub const STORAGE_KEY: &str = "bonfire_content";

const FALLBACK_DOCUMENT: &str = "# Hello Bonfire\nNo data found.";

pub trait DraftStore {
    fn load(&self) -> Option<String>;
    fn save(&mut self, text: &str) -> crate::Result<()>;
    fn clear(&mut self) -> crate::Result<()>;
}

pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{STORAGE_KEY}.md")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DraftStore for FileStore {
    fn load(&self) -> Option<String> {
        fs::read_to_string(&self.path).ok()
    }

    fn save(&mut self, text: &str) -> crate::Result<()> {
        fs::write(&self.path, text)?;
        Ok(())
    }

    fn clear(&mut self) -> crate::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

/// Owns the authored document for one editing session. The render pipeline
/// never touches this; it always takes the document text as an argument.
pub struct Session<S> {
    store: S,
    document: String,
    original: String,
    dirty: bool,
}

impl<S: DraftStore> Session<S> {
    /// Resolves the document with the load precedence: stored draft, then
    /// user-provided data, then packaged example data, then a fixed
    /// fallback.
    pub fn open(store: S, user_data: Option<String>, example_data: Option<String>) -> Self {
        let original = user_data
            .or(example_data)
            .unwrap_or_else(|| FALLBACK_DOCUMENT.to_string());
        let document = store.load().unwrap_or_else(|| original.clone());
        Self {
            store,
            document,
            original,
            dirty: false,
        }
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replaces the document wholesale and persists it as the draft.
    pub fn update(&mut self, text: String) -> crate::Result<()> {
        self.store.save(&text)?;
        self.document = text;
        self.dirty = true;
        Ok(())
    }

    /// Drops the draft and restores the original (non-draft) content.
    pub fn discard(&mut self) -> crate::Result<()> {
        self.store.clear()?;
        self.document = self.original.clone();
        self.dirty = false;
        Ok(())
    }
}
