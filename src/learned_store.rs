//! The learned (personal) dictionary.
//!
//! Persistence belongs to whoever implements [`LearnedStore`]; the engine
//! only issues queries and writes and keeps no authoritative copy. Two
//! implementations ship with the crate: an in-memory store and a JSON file
//! store used by the command-line front end.

use crate::error::LearnedStoreError;
use ahash::AHashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tempfile::NamedTempFile;

/// One row of the learned dictionary, keyed by `(word, locale)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnedEntry {
    /// Assigned by the store on insert; zero until then.
    #[serde(default)]
    pub id: i64,
    pub word: String,
    pub frequency: u8,
    pub locale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortcut: Option<String>,
}

impl LearnedEntry {
    pub fn new(word: impl Into<String>, locale: impl Into<String>, frequency: u8) -> Self {
        Self {
            id: 0,
            word: word.into(),
            frequency,
            locale: locale.into(),
            shortcut: None,
        }
    }
}

/// External storage for learned words.
///
/// Implementations handle their own concurrency; the engine calls them
/// without extra locking.
pub trait LearnedStore: Send + Sync {
    /// Every entry for `locale`.
    fn query_all(&self, locale: &str) -> Result<Vec<LearnedEntry>, LearnedStoreError>;

    /// Entries whose word matches `word` exactly for `locale`.
    fn query_exact(&self, word: &str, locale: &str) -> Result<Vec<LearnedEntry>, LearnedStoreError>;

    /// Store a new entry and return its id.
    fn insert(&self, entry: LearnedEntry) -> Result<i64, LearnedStoreError>;

    /// Overwrite the entry with the same id.
    fn update(&self, entry: &LearnedEntry) -> Result<(), LearnedStoreError>;
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct StoreContents {
    /// Bumped on every write; a mismatch means another writer got there first.
    #[serde(default)]
    revision: u64,
    next_id: i64,
    entries: Vec<LearnedEntry>,
}

impl StoreContents {
    fn query_all(&self, locale: &str) -> Vec<LearnedEntry> {
        self.entries.iter().filter(|e| e.locale == locale).cloned().collect()
    }

    fn query_exact(&self, word: &str, locale: &str) -> Vec<LearnedEntry> {
        self.entries
            .iter()
            .filter(|e| e.locale == locale && e.word == word)
            .cloned()
            .collect()
    }

    fn insert(&mut self, mut entry: LearnedEntry) -> i64 {
        self.next_id += 1;
        entry.id = self.next_id;
        self.entries.push(entry);
        self.next_id
    }

    fn update(&mut self, entry: &LearnedEntry) -> Result<(), LearnedStoreError> {
        let slot = self
            .entries
            .iter_mut()
            .find(|e| e.id == entry.id)
            .ok_or(LearnedStoreError::NotFound(entry.id))?;
        *slot = entry.clone();
        Ok(())
    }
}

/// Learned store kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryLearnedStore {
    contents: Mutex<StoreContents>,
}

impl MemoryLearnedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.contents.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LearnedStore for MemoryLearnedStore {
    fn query_all(&self, locale: &str) -> Result<Vec<LearnedEntry>, LearnedStoreError> {
        Ok(self.contents.lock().query_all(locale))
    }

    fn query_exact(&self, word: &str, locale: &str) -> Result<Vec<LearnedEntry>, LearnedStoreError> {
        Ok(self.contents.lock().query_exact(word, locale))
    }

    fn insert(&self, entry: LearnedEntry) -> Result<i64, LearnedStoreError> {
        Ok(self.contents.lock().insert(entry))
    }

    fn update(&self, entry: &LearnedEntry) -> Result<(), LearnedStoreError> {
        self.contents.lock().update(entry)
    }
}

/// One lock per store file, shared by every handle in the process.
fn path_lock(path: &Path) -> Arc<Mutex<()>> {
    static LOCKS: OnceLock<Mutex<AHashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();
    let locks = LOCKS.get_or_init(|| Mutex::new(AHashMap::new()));
    Arc::clone(locks.lock().entry(path.to_path_buf()).or_default())
}

/// Learned store persisted as a JSON document.
///
/// Writes go to a temporary file in the same directory which is then
/// persisted over the store, so readers never see a truncated document.
/// Handles opened on the same path share one lock, and every write checks
/// the on-disk revision: a document changed by another process since it was
/// read is rejected with [`LearnedStoreError::Conflict`] instead of being
/// overwritten.
#[derive(Debug)]
pub struct JsonFileLearnedStore {
    path: PathBuf,
    io_lock: Arc<Mutex<()>>,
}

impl JsonFileLearnedStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// The parent directory is created if it does not exist.
    ///
    /// # Errors
    /// Returns an error if the parent directory cannot be created or resolved.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LearnedStoreError> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let file_name = path
            .file_name()
            .ok_or_else(|| LearnedStoreError::Unavailable(format!("not a file path: {}", path.display())))?;
        // canonical form so differently spelled paths share a lock
        let path = fs::canonicalize(parent)?.join(file_name);

        Ok(Self {
            io_lock: path_lock(&path),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<StoreContents, LearnedStoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(StoreContents::default()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoreContents::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist `contents`, which were read at revision `read_revision`.
    fn write(&self, contents: &mut StoreContents, read_revision: u64) -> Result<(), LearnedStoreError> {
        let on_disk = self.read()?.revision;
        if on_disk != read_revision {
            return Err(LearnedStoreError::Conflict {
                expected: read_revision,
                found: on_disk,
            });
        }
        contents.revision = read_revision + 1;

        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp_file = NamedTempFile::new_in(parent)?;
        {
            let mut writer = BufWriter::new(&mut temp_file);
            serde_json::to_writer_pretty(&mut writer, &*contents)?;
            writer.flush()?;
        }
        temp_file.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl LearnedStore for JsonFileLearnedStore {
    fn query_all(&self, locale: &str) -> Result<Vec<LearnedEntry>, LearnedStoreError> {
        let _guard = self.io_lock.lock();
        Ok(self.read()?.query_all(locale))
    }

    fn query_exact(&self, word: &str, locale: &str) -> Result<Vec<LearnedEntry>, LearnedStoreError> {
        let _guard = self.io_lock.lock();
        Ok(self.read()?.query_exact(word, locale))
    }

    fn insert(&self, entry: LearnedEntry) -> Result<i64, LearnedStoreError> {
        let _guard = self.io_lock.lock();
        let mut contents = self.read()?;
        let revision = contents.revision;
        let id = contents.insert(entry);
        self.write(&mut contents, revision)?;
        Ok(id)
    }

    fn update(&self, entry: &LearnedEntry) -> Result<(), LearnedStoreError> {
        let _guard = self.io_lock.lock();
        let mut contents = self.read()?;
        let revision = contents.revision;
        contents.update(entry)?;
        self.write(&mut contents, revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_insert_and_query() {
        let store = MemoryLearnedStore::new();
        let id = store.insert(LearnedEntry::new("ferris", "en_US", 60)).unwrap();
        store.insert(LearnedEntry::new("ferris", "de_DE", 60)).unwrap();

        let found = store.query_exact("ferris", "en_US").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);
        assert!(store.query_exact("Ferris", "en_US").unwrap().is_empty());
        assert_eq!(store.query_all("de_DE").unwrap().len(), 1);
    }

    #[test]
    fn test_memory_update() {
        let store = MemoryLearnedStore::new();
        store.insert(LearnedEntry::new("ferris", "en_US", 60)).unwrap();

        let mut entry = store.query_exact("ferris", "en_US").unwrap().remove(0);
        entry.frequency = 70;
        store.update(&entry).unwrap();

        assert_eq!(store.query_exact("ferris", "en_US").unwrap()[0].frequency, 70);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_update_unknown_id_fails() {
        let store = MemoryLearnedStore::new();
        let mut entry = LearnedEntry::new("ghost", "en_US", 1);
        entry.id = 42;
        assert!(matches!(store.update(&entry), Err(LearnedStoreError::NotFound(42))));
    }

    #[test]
    fn test_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("learned.json");

        {
            let store = JsonFileLearnedStore::open(&path).unwrap();
            assert!(store.query_all("en_US").unwrap().is_empty());
            store.insert(LearnedEntry::new("ferris", "en_US", 60)).unwrap();
            let mut entry = store.query_exact("ferris", "en_US").unwrap().remove(0);
            entry.frequency = 75;
            store.update(&entry).unwrap();
        }

        let reopened = JsonFileLearnedStore::open(&path).unwrap();
        let entries = reopened.query_all("en_US").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].frequency, 75);

        let id = reopened.insert(LearnedEntry::new("crab", "en_US", 1)).unwrap();
        assert_eq!(id, 2);
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("learned.json");
        fs::write(&path, "not json").unwrap();

        let store = JsonFileLearnedStore::open(&path).unwrap();
        assert!(matches!(store.query_all("en_US"), Err(LearnedStoreError::Serde(_))));
    }

    #[test]
    fn test_two_handles_keep_every_insert() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("learned.json");
        let first = Arc::new(JsonFileLearnedStore::open(&path).unwrap());
        let second = Arc::new(JsonFileLearnedStore::open(dir.path().join(".").join("learned.json")).unwrap());

        let handles: Vec<_> = [first.clone(), second.clone()]
            .into_iter()
            .enumerate()
            .flat_map(|(n, store)| {
                (0..50).map(move |i| {
                    let store = Arc::clone(&store);
                    std::thread::spawn(move || store.insert(LearnedEntry::new(format!("w{n}_{i}"), "en_US", 1)))
                })
            })
            .collect();

        let mut ids: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap().unwrap()).collect();
        ids.sort_unstable();
        ids.dedup();

        assert_eq!(ids.len(), 100);
        assert_eq!(first.query_all("en_US").unwrap().len(), 100);
        assert_eq!(second.query_all("en_US").unwrap().len(), 100);
    }

    #[test]
    fn test_stale_write_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileLearnedStore::open(dir.path().join("learned.json")).unwrap();
        store.insert(LearnedEntry::new("ferris", "en_US", 60)).unwrap();

        let mut stale = store.read().unwrap();
        let stale_revision = stale.revision;
        store.insert(LearnedEntry::new("crab", "en_US", 1)).unwrap();

        stale.insert(LearnedEntry::new("lost", "en_US", 1));
        assert!(matches!(
            store.write(&mut stale, stale_revision),
            Err(LearnedStoreError::Conflict { expected: 1, found: 2 })
        ));
        assert_eq!(store.query_all("en_US").unwrap().len(), 2);
    }
}
