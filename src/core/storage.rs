//! Key-value persistence and the draft repository built on it
//!
//! `FileStore` plays the role of a browser's local storage: a flat string map
//! written through to a JSON file. `MemoryStore` is the session counterpart
//! and is gone when the process exits.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::notebook::Notebook;

const DRAFT_PREFIX: &str = "draft:";

/// Flat string key-value storage
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
    fn keys(&self) -> Vec<String>;

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// In-memory store that lives as long as the process
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

/// Persistent store backed by a single JSON file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store; an
    /// unreadable one is logged and replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring corrupt store {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!("Failed to read store {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };
        tracing::debug!("Opened store {} ({} keys)", path.display(), entries.len());
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string(&self.entries)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write store: {}", self.path.display()))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

/// Drafts persisted as JSON under `draft:<slug>`
pub struct DraftStore<'a, S: KeyValueStore> {
    store: &'a mut S,
}

impl<'a, S: KeyValueStore> DraftStore<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    fn key(slug: &str) -> String {
        format!("{}{}", DRAFT_PREFIX, slug)
    }

    pub fn save(&mut self, notebook: &Notebook) -> Result<()> {
        let json = serde_json::to_string(notebook)?;
        self.store.set(&Self::key(&notebook.slug), &json)?;
        tracing::debug!("Saved draft: {}", notebook.slug);
        Ok(())
    }

    pub fn load(&self, slug: &str) -> Option<Notebook> {
        let json = self.store.get(&Self::key(slug))?;
        match serde_json::from_str(&json) {
            Ok(notebook) => Some(notebook),
            Err(e) => {
                tracing::warn!("Skipping unreadable draft {}: {}", slug, e);
                None
            }
        }
    }

    pub fn exists(&self, slug: &str) -> bool {
        self.store.contains(&Self::key(slug))
    }

    pub fn delete(&mut self, slug: &str) -> Result<()> {
        self.store.remove(&Self::key(slug))
    }

    /// All readable drafts, most recently updated first
    pub fn list(&self) -> Vec<Notebook> {
        let mut drafts: Vec<Notebook> = self
            .store
            .keys()
            .iter()
            .filter_map(|k| k.strip_prefix(DRAFT_PREFIX))
            .filter_map(|slug| self.load(slug))
            .collect();
        drafts.sort_by(|a, b| b.updated.cmp(&a.updated));
        drafts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let mut store = FileStore::open(&path);
        store.set("theme", "light").unwrap();
        store.set("gone", "x").unwrap();
        store.remove("gone").unwrap();

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get("theme").as_deref(), Some("light"));
        assert!(!reopened.contains("gone"));
    }

    #[test]
    fn test_corrupt_file_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{not json").unwrap();

        let mut store = FileStore::open(&path);
        assert!(store.keys().is_empty());
        store.set("k", "v").unwrap();
        assert_eq!(FileStore::open(&path).get("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_drafts_list_newest_first() {
        let mut store = MemoryStore::new();
        let mut older = Notebook::new("Older");
        older.updated = Utc::now() - Duration::hours(2);
        let newer = Notebook::new("Newer");

        let mut drafts = DraftStore::new(&mut store);
        drafts.save(&older).unwrap();
        drafts.save(&newer).unwrap();

        let slugs: Vec<_> = drafts.list().into_iter().map(|n| n.slug).collect();
        assert_eq!(slugs, vec!["newer", "older"]);
        assert_eq!(drafts.load("older"), Some(older));
    }

    #[test]
    fn test_unreadable_drafts_are_skipped() {
        let mut store = MemoryStore::new();
        store.set("draft:broken", "{}").unwrap();
        store.set("theme", "dark").unwrap();

        let mut drafts = DraftStore::new(&mut store);
        drafts.save(&Notebook::new("Fine")).unwrap();
        assert_eq!(drafts.list().len(), 1);
        assert!(drafts.exists("broken"));

        drafts.delete("fine").unwrap();
        assert!(drafts.list().is_empty());
    }
}
