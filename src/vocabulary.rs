//! Base dictionary loading, snapshotting and overlay with learned words.
//!
//! Two vocabularies feed every request:
//! - **Base dictionary**: an immutable word → frequency table per locale,
//!   read once from a JSON asset
//! - **Learned dictionary**: words the user accepted, owned by an external
//!   [`LearnedStore`]
//!
//! # Asset Format
//!
//! Base dictionary assets are flat JSON objects:
//! ```text
//! { "the": 255, "hello": 200, "help": 150 }
//! ```
//!
//! Values are clamped into `0..=255`. [`JsonAssetReader`] looks for
//! `<asset_dir>/<locale>.json`.
//!
//! # Locking
//!
//! The base dictionaries live in a [`BaseDictionaryCell`], whose only
//! operations are "snapshot" and "load if empty". Both hold the lock for
//! their whole critical section and release it on every exit path, so a
//! concurrent reader never sees a half-populated dictionary.
//!
//! # Case
//!
//! Keys are case-folded for lookup while the stored [`WordEntry`] keeps the
//! original casing for display.

use crate::error::{AssetError, DictionaryLoadError};
use crate::learned_store::{LearnedEntry, LearnedStore};
use ahash::AHashMap;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;

/// A word with its relative popularity weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordEntry {
    /// Display form, casing preserved.
    pub word: String,
    pub frequency: u8,
}

impl WordEntry {
    pub fn new(word: impl Into<String>, frequency: u8) -> Self {
        Self {
            word: word.into(),
            frequency,
        }
    }
}

/// Case-folded key → entry.
pub type WordMap = AHashMap<String, WordEntry>;

/// Lookup key for `word`.
pub fn fold_key(word: &str) -> String {
    word.to_lowercase()
}

/// Clamp an arbitrary integer weight into the `0..=255` frequency range.
pub fn clamp_frequency(value: i64) -> u8 {
    value.clamp(0, u8::MAX as i64) as u8
}

/// Build a [`WordMap`] from `(word, frequency)` pairs.
///
/// When two words fold to the same key, the higher frequency wins.
pub fn word_map<I, S>(pairs: I) -> WordMap
where
    I: IntoIterator<Item = (S, u8)>,
    S: Into<String>,
{
    let mut map = WordMap::new();
    for (word, frequency) in pairs {
        let word = word.into();
        let key = fold_key(&word);
        match map.get(&key) {
            Some(existing) if existing.frequency >= frequency => {}
            _ => {
                map.insert(key, WordEntry::new(word, frequency));
            }
        }
    }
    map
}

/// Fold learned-store rows into a [`WordMap`].
pub fn learned_word_map(entries: &[LearnedEntry]) -> WordMap {
    word_map(entries.iter().map(|e| (e.word.clone(), e.frequency)))
}

/// An immutable word → frequency table for one locale.
#[derive(Debug, Clone)]
pub struct BaseDictionary {
    locale: String,
    words: WordMap,
}

impl BaseDictionary {
    pub fn new(locale: impl Into<String>, words: WordMap) -> Self {
        Self {
            locale: locale.into(),
            words,
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn words(&self) -> &WordMap {
        &self.words
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains_key(&fold_key(word))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Source of base dictionary assets.
pub trait AssetReader: Send + Sync {
    /// Read the raw word → frequency table for `locale`.
    fn read_base_dictionary(&self, locale: &str) -> Result<WordMap, AssetError>;
}

/// Parse a flat JSON object of word → integer frequency.
///
/// # Errors
/// Returns [`AssetError::Parse`] if the document is not an object or a
/// value is not an integer.
pub fn parse_dictionary_json(text: &str) -> Result<WordMap, AssetError> {
    let object: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(text).map_err(|e| AssetError::Parse(e.to_string()))?;

    let mut pairs = Vec::with_capacity(object.len());
    for (word, value) in object {
        let word = word.trim().to_string();
        if word.is_empty() {
            continue;
        }
        let frequency = match value.as_i64() {
            Some(v) => clamp_frequency(v),
            // Large unsigned values still count as "very frequent"
            None if value.as_u64().is_some() => u8::MAX,
            None => {
                return Err(AssetError::Parse(format!(
                    "frequency for '{word}' is not an integer: {value}"
                )))
            }
        };
        pairs.push((word, frequency));
    }

    Ok(word_map(pairs))
}

/// Reads `<dir>/<locale>.json`.
#[derive(Debug, Clone)]
pub struct JsonAssetReader {
    dir: PathBuf,
}

impl JsonAssetReader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn asset_path(&self, locale: &str) -> PathBuf {
        self.dir.join(format!("{locale}.json"))
    }
}

impl AssetReader for JsonAssetReader {
    fn read_base_dictionary(&self, locale: &str) -> Result<WordMap, AssetError> {
        let path = self.asset_path(locale);
        let text = std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                AssetError::NotFound(path.clone())
            } else {
                AssetError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;
        parse_dictionary_json(&text)
    }
}

/// Small built-in English word list used when no asset directory is set.
const FALLBACK_EN_US: &str = r#"{
    "the": 255, "be": 240, "to": 238, "of": 236, "and": 235, "a": 234,
    "in": 232, "that": 230, "have": 228, "it": 226, "for": 225, "not": 224,
    "on": 222, "with": 220, "you": 218, "this": 215, "but": 214, "from": 210,
    "they": 208, "we": 207, "say": 205, "she": 203, "will": 200, "would": 198,
    "there": 196, "their": 195, "what": 194, "about": 190, "which": 188,
    "when": 186, "make": 185, "can": 184, "like": 182, "time": 180, "just": 178,
    "know": 176, "take": 174, "people": 172, "into": 170, "year": 168,
    "your": 166, "good": 165, "some": 164, "could": 162, "other": 160,
    "than": 158, "then": 157, "look": 155, "only": 154, "come": 152,
    "think": 150, "also": 148, "back": 146, "after": 145, "work": 140,
    "first": 138, "well": 136, "because": 130, "hello": 200, "help": 150,
    "world": 100, "computer": 120, "program": 110, "software": 105,
    "keyboard": 95, "please": 125, "thank": 122, "thanks": 128, "yes": 126,
    "okay": 118
}"#;

/// Asset reader backed by tables held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAssetReader {
    dictionaries: AHashMap<String, WordMap>,
}

impl InMemoryAssetReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reader containing the built-in `en_US` word list.
    pub fn fallback() -> Self {
        let mut reader = Self::new();
        // The embedded table is a constant; a parse failure would be a build defect.
        if let Ok(words) = parse_dictionary_json(FALLBACK_EN_US) {
            reader.dictionaries.insert("en_US".to_string(), words);
        }
        reader
    }

    pub fn with_locale<I, S>(mut self, locale: &str, pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u8)>,
        S: Into<String>,
    {
        self.dictionaries.insert(locale.to_string(), word_map(pairs));
        self
    }
}

impl AssetReader for InMemoryAssetReader {
    fn read_base_dictionary(&self, locale: &str) -> Result<WordMap, AssetError> {
        self.dictionaries
            .get(locale)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(PathBuf::from(format!("memory:{locale}"))))
    }
}

/// Lock-guarded holder of every loaded base dictionary.
#[derive(Default)]
pub struct BaseDictionaryCell {
    dictionaries: Mutex<AHashMap<String, Arc<BaseDictionary>>>,
}

impl BaseDictionaryCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point-in-time view of the dictionary for `locale`, if loaded.
    pub fn snapshot(&self, locale: &str) -> Option<Arc<BaseDictionary>> {
        self.dictionaries.lock().get(locale).cloned()
    }

    /// Populate `locale` using `load` unless it is already present.
    ///
    /// The lock is held across the check and the load so concurrent callers
    /// never trigger a second load. A failed load leaves the slot empty.
    pub fn load_if_empty<F>(&self, locale: &str, load: F) -> Result<Arc<BaseDictionary>, AssetError>
    where
        F: FnOnce() -> Result<WordMap, AssetError>,
    {
        let mut dictionaries = self.dictionaries.lock();
        if let Some(existing) = dictionaries.get(locale) {
            return Ok(Arc::clone(existing));
        }

        let loaded = Arc::new(BaseDictionary::new(locale, load()?));
        dictionaries.insert(locale.to_string(), Arc::clone(&loaded));
        Ok(loaded)
    }
}

/// Which side wins when both maps hold the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precedence {
    LearnedWins,
    BaseWins,
}

/// Overlay `learned` on `base`. Colliding keys take the entry of the winning
/// side; frequencies are never summed.
pub fn merge(base: &WordMap, learned: &WordMap, precedence: Precedence) -> WordMap {
    let mut merged = base.clone();
    merged.reserve(learned.len());
    for (key, entry) in learned {
        match precedence {
            Precedence::LearnedWins => {
                merged.insert(key.clone(), entry.clone());
            }
            Precedence::BaseWins => {
                merged.entry(key.clone()).or_insert_with(|| entry.clone());
            }
        }
    }
    merged
}

/// Read-only snapshot of base + learned words for one request.
#[derive(Debug, Clone)]
pub struct MergedView {
    locale: String,
    entries: WordMap,
}

impl MergedView {
    pub fn new(locale: impl Into<String>, entries: WordMap) -> Self {
        Self {
            locale: locale.into(),
            entries,
        }
    }

    /// Convenience constructor from plain `(word, frequency)` pairs.
    pub fn from_pairs<I, S>(locale: &str, pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u8)>,
        S: Into<String>,
    {
        Self::new(locale, word_map(pairs))
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Case-insensitive lookup.
    pub fn get(&self, word: &str) -> Option<&WordEntry> {
        self.entries.get(word).or_else(|| self.entries.get(&fold_key(word)))
    }

    pub fn contains(&self, word: &str) -> bool {
        self.get(word).is_some()
    }

    pub fn entries(&self) -> impl Iterator<Item = &WordEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Owns the base dictionaries and builds merged views on demand.
pub struct VocabularyStore {
    base: BaseDictionaryCell,
    assets: Arc<dyn AssetReader>,
    learned: Arc<dyn LearnedStore>,
}

impl VocabularyStore {
    pub fn new(assets: Arc<dyn AssetReader>, learned: Arc<dyn LearnedStore>) -> Self {
        Self {
            base: BaseDictionaryCell::new(),
            assets,
            learned,
        }
    }

    /// Load the base dictionary for `locale` if it is not loaded yet.
    ///
    /// Idempotent: once a locale is loaded the asset source is not read again.
    ///
    /// # Errors
    /// Returns [`DictionaryLoadError`] if the asset cannot be read or parsed.
    /// Nothing is cached in that case, so the next call retries.
    pub fn preload(&self, locale: &str) -> Result<Arc<BaseDictionary>, DictionaryLoadError> {
        let already_loaded = self.base.snapshot(locale).is_some();
        let dictionary = self
            .base
            .load_if_empty(locale, || self.assets.read_base_dictionary(locale))
            .map_err(|source| {
                tracing::error!(locale, error = %source, "base dictionary load failed");
                DictionaryLoadError {
                    locale: locale.to_string(),
                    source,
                }
            })?;

        if !already_loaded {
            tracing::info!(locale = dictionary.locale(), words = dictionary.len(), "base dictionary loaded");
        }
        Ok(dictionary)
    }

    pub fn is_loaded(&self, locale: &str) -> bool {
        self.base.snapshot(locale).is_some()
    }

    /// Snapshot the base dictionary, query the learned store, and overlay the
    /// two with learned-wins semantics.
    ///
    /// A failing learned store degrades to base-only data.
    pub fn merged_view(&self, locale: &str) -> MergedView {
        let base = self.base.snapshot(locale);

        let learned = match self.learned.query_all(locale) {
            Ok(entries) => learned_word_map(&entries),
            Err(err) => {
                tracing::warn!(locale, error = %err, "learned store unavailable, using base dictionary only");
                WordMap::new()
            }
        };

        let entries = match base {
            Some(base) => merge(base.words(), &learned, Precedence::LearnedWins),
            None => learned,
        };
        MergedView::new(locale, entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LearnedStoreError;
    use crate::learned_store::MemoryLearnedStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingReader {
        inner: InMemoryAssetReader,
        reads: AtomicUsize,
        failures_left: AtomicUsize,
    }

    impl CountingReader {
        fn new(inner: InMemoryAssetReader, failures: usize) -> Self {
            Self {
                inner,
                reads: AtomicUsize::new(0),
                failures_left: AtomicUsize::new(failures),
            }
        }
    }

    impl AssetReader for CountingReader {
        fn read_base_dictionary(&self, locale: &str) -> Result<WordMap, AssetError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(AssetError::Parse("simulated failure".to_string()));
            }
            self.inner.read_base_dictionary(locale)
        }
    }

    struct BrokenStore;

    impl LearnedStore for BrokenStore {
        fn query_all(&self, _locale: &str) -> Result<Vec<LearnedEntry>, LearnedStoreError> {
            Err(LearnedStoreError::Unavailable("offline".to_string()))
        }
        fn query_exact(&self, _word: &str, _locale: &str) -> Result<Vec<LearnedEntry>, LearnedStoreError> {
            Err(LearnedStoreError::Unavailable("offline".to_string()))
        }
        fn insert(&self, _entry: LearnedEntry) -> Result<i64, LearnedStoreError> {
            Err(LearnedStoreError::Unavailable("offline".to_string()))
        }
        fn update(&self, _entry: &LearnedEntry) -> Result<(), LearnedStoreError> {
            Err(LearnedStoreError::Unavailable("offline".to_string()))
        }
    }

    fn sample_reader() -> InMemoryAssetReader {
        InMemoryAssetReader::new().with_locale("en_US", [("hello", 200), ("help", 150), ("world", 100)])
    }

    #[test]
    fn test_parse_clamps_frequencies() {
        let words = parse_dictionary_json(r#"{"big": 900, "neg": -4, "ok": 42}"#).unwrap();
        assert_eq!(words["big"].frequency, 255);
        assert_eq!(words["neg"].frequency, 0);
        assert_eq!(words["ok"].frequency, 42);
    }

    #[test]
    fn test_parse_rejects_non_integer() {
        assert!(matches!(
            parse_dictionary_json(r#"{"word": "often"}"#),
            Err(AssetError::Parse(_))
        ));
        assert!(matches!(parse_dictionary_json("[1, 2]"), Err(AssetError::Parse(_))));
    }

    #[test]
    fn test_parse_preserves_display_case() {
        let words = parse_dictionary_json(r#"{"London": 90}"#).unwrap();
        assert_eq!(words["london"].word, "London");
    }

    #[test]
    fn test_fallback_dictionary() {
        let words = InMemoryAssetReader::fallback().read_base_dictionary("en_US").unwrap();
        assert!(words.contains_key("hello"));
        assert!(words.len() > 50);
    }

    #[test]
    fn test_merge_learned_overrides() {
        let base = word_map([("hello", 200), ("world", 100)]);
        let learned = word_map([("hello", 20), ("rustacean", 60)]);

        let merged = merge(&base, &learned, Precedence::LearnedWins);
        assert_eq!(merged["hello"].frequency, 20);
        assert_eq!(merged["rustacean"].frequency, 60);
        assert_eq!(merged.len(), 3);

        let merged = merge(&base, &learned, Precedence::BaseWins);
        assert_eq!(merged["hello"].frequency, 200);
        assert_eq!(merged["rustacean"].frequency, 60);
    }

    #[test]
    fn test_merge_collision_is_case_insensitive() {
        let base = word_map([("paris", 80)]);
        let learned = word_map([("Paris", 120)]);
        let merged = merge(&base, &learned, Precedence::LearnedWins);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged["paris"].word, "Paris");
    }

    #[test]
    fn test_preload_is_idempotent() {
        let reader = Arc::new(CountingReader::new(sample_reader(), 0));
        let store = VocabularyStore::new(reader.clone(), Arc::new(MemoryLearnedStore::new()));

        store.preload("en_US").unwrap();
        let first = store.merged_view("en_US");
        store.preload("en_US").unwrap();
        let second = store.merged_view("en_US");

        assert_eq!(reader.reads.load(Ordering::SeqCst), 1);
        assert_eq!(first.len(), second.len());
        assert_eq!(second.get("hello").map(|e| e.frequency), Some(200));
    }

    #[test]
    fn test_preload_failure_is_retried() {
        let reader = Arc::new(CountingReader::new(sample_reader(), 1));
        let store = VocabularyStore::new(reader.clone(), Arc::new(MemoryLearnedStore::new()));

        let err = store.preload("en_US").unwrap_err();
        assert_eq!(err.locale, "en_US");
        assert!(!store.is_loaded("en_US"));

        store.preload("en_US").unwrap();
        assert!(store.is_loaded("en_US"));
        assert_eq!(reader.reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_preload_unknown_locale() {
        let store = VocabularyStore::new(Arc::new(sample_reader()), Arc::new(MemoryLearnedStore::new()));
        assert!(matches!(
            store.preload("fr_FR"),
            Err(DictionaryLoadError {
                source: AssetError::NotFound(_),
                ..
            })
        ));
    }

    #[test]
    fn test_concurrent_preload_loads_once() {
        let reader = Arc::new(CountingReader::new(sample_reader(), 0));
        let store = Arc::new(VocabularyStore::new(reader.clone(), Arc::new(MemoryLearnedStore::new())));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.preload("en_US").map(|d| d.len()))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), 3);
        }
        assert_eq!(reader.reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_merged_view_with_learned_words() {
        let learned = Arc::new(MemoryLearnedStore::new());
        learned.insert(LearnedEntry::new("hello", "en_US", 40)).unwrap();
        learned.insert(LearnedEntry::new("ferris", "en_US", 90)).unwrap();
        learned.insert(LearnedEntry::new("bonjour", "fr_FR", 90)).unwrap();

        let store = VocabularyStore::new(Arc::new(sample_reader()), learned);
        store.preload("en_US").unwrap();

        let view = store.merged_view("en_US");
        assert_eq!(view.get("hello").unwrap().frequency, 40);
        assert!(view.contains("Ferris"));
        assert!(!view.contains("bonjour"));
    }

    #[test]
    fn test_json_reader_reads_locale_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("en_US.json"), r#"{"Hello": 200, "help": 150}"#).unwrap();

        let reader = JsonAssetReader::new(dir.path());
        let words = reader.read_base_dictionary("en_US").unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words["hello"].word, "Hello");

        let store = VocabularyStore::new(Arc::new(reader), Arc::new(MemoryLearnedStore::new()));
        let dictionary = store.preload("en_US").unwrap();
        assert_eq!(dictionary.locale(), "en_US");
        assert!(dictionary.contains("HELP"));
    }

    #[test]
    fn test_json_reader_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let reader = JsonAssetReader::new(dir.path());

        match reader.read_base_dictionary("de_DE") {
            Err(AssetError::NotFound(path)) => assert_eq!(path, dir.path().join("de_DE.json")),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_json_reader_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("en_US.json"), "{ not json").unwrap();

        let reader = JsonAssetReader::new(dir.path());
        assert!(matches!(reader.read_base_dictionary("en_US"), Err(AssetError::Parse(_))));

        let store = VocabularyStore::new(Arc::new(reader), Arc::new(MemoryLearnedStore::new()));
        assert!(matches!(
            store.preload("en_US"),
            Err(DictionaryLoadError {
                source: AssetError::Parse(_),
                ..
            })
        ));
        assert!(!store.is_loaded("en_US"));
    }

    #[test]
    fn test_merged_view_survives_broken_store() {
        let store = VocabularyStore::new(Arc::new(sample_reader()), Arc::new(BrokenStore));
        store.preload("en_US").unwrap();
        let view = store.merged_view("en_US");
        assert_eq!(view.len(), 3);
    }
}
