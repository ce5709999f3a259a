// Registry of open JSON files keyed by canonical path; one handle per file.
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::path::{Path, PathBuf};

use crate::core::error::{Error, Result};
use crate::core::file::{JsonFile, JsonFileOptions};
use crate::paths::canonical_path;

/// Explicit replacement for a process-wide file cache.
///
/// `load` deduplicates by canonical path, so `a.json`, `./a.json` and a
/// symlinked spelling all share one [`JsonFile`]. Handles live until
/// `reset`, `close`, or `remove`.
#[derive(Debug, Default)]
pub struct FilePool {
    files: BTreeMap<PathBuf, JsonFile>,
}

impl FilePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the registered handle for `path`, opening it with `options` on first use.
    ///
    /// Options are ignored when the file is already registered.
    pub fn load(&mut self, path: impl AsRef<Path>, options: JsonFileOptions) -> Result<&mut JsonFile> {
        let key = canonical_path(path)?;
        match self.files.entry(key) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let file = JsonFile::open(entry.key(), options)?;
                tracing::debug!(path = %entry.key().display(), "registered json file");
                Ok(entry.insert(file))
            }
        }
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Result<Option<&JsonFile>> {
        let key = canonical_path(path)?;
        Ok(self.files.get(&key))
    }

    pub fn get_mut(&mut self, path: impl AsRef<Path>) -> Result<Option<&mut JsonFile>> {
        let key = canonical_path(path)?;
        Ok(self.files.get_mut(&key))
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> Result<bool> {
        let key = canonical_path(path)?;
        Ok(self.files.contains_key(&key))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Registered canonical paths, in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    /// Saves every registered file.
    ///
    /// All files are attempted; the first failure is returned afterwards.
    pub fn sync(&self) -> Result<()> {
        let mut first_err: Option<Error> = None;
        for (path, file) in &self.files {
            if let Err(err) = file.save() {
                tracing::warn!(path = %path.display(), error = %err, "failed to sync json file");
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Drops every handle without saving.
    pub fn reset(&mut self) {
        tracing::debug!(files = self.files.len(), "reset json file pool");
        self.files.clear();
    }

    /// Empties the pool, saving every file first when `flush` is set.
    ///
    /// The pool is cleared even if a save fails; the first failure is returned.
    pub fn close(&mut self, flush: bool) -> Result<()> {
        let result = if flush { self.sync() } else { Ok(()) };
        self.reset();
        result
    }

    /// Unregisters one file, optionally saving it, and hands it back.
    ///
    /// When the save fails the file stays registered with its edits intact.
    pub fn remove(&mut self, path: impl AsRef<Path>, flush: bool) -> Result<Option<JsonFile>> {
        let key = canonical_path(path)?;
        if flush && let Some(file) = self.files.get(&key) {
            file.save()?;
        }
        Ok(self.files.remove(&key))
    }
}
