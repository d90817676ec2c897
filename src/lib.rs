//! Tiersuggest - tiered fuzzy suggestions and spell checking for software keyboards.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   keystroke    ┌──────────────┐
//! │ SuggestionEngine │ ─────────────▶ │ MatchEngine  │ ─▶ ranked candidates
//! │   (engine.rs)    │   word end     ├──────────────┤
//! │                  │ ─────────────▶ │ SpellChecker │ ─▶ valid / typo
//! └───────┬──────────┘                └──────┬───────┘
//!         │ accepted                         │ MergedView
//!         ▼                                  ▼
//! ┌──────────────────┐  writes   ┌───────────────────┐
//! │ LearningWorker   │ ────────▶ │  VocabularyStore  │ ◀─ base dictionary assets
//! │  (learning.rs)   │           │  (vocabulary.rs)  │ ◀─ learned store
//! └──────────────────┘           └───────────────────┘
//! ```
//!
//! # Modules
//!
//! - `edit_distance`: bounded Levenshtein distance
//! - `vocabulary`: base dictionary loading, locking and overlay
//! - `learned_store`: learned dictionary interface and stores
//! - `matcher`: tiered prefix matching and confidence scoring
//! - `spell`: valid/typo verdicts with corrections
//! - `learning`: frequency boosting of accepted words on a background thread
//! - `engine`: the service facade
//! - `config`: persisted settings

pub mod config;
pub mod edit_distance;
pub mod engine;
pub mod error;
pub mod learned_store;
pub mod learning;
pub mod matcher;
pub mod spell;
pub mod vocabulary;

pub use config::Config;
pub use engine::SuggestionEngine;
pub use error::{AssetError, DictionaryLoadError, LearnedStoreError};
pub use learned_store::{JsonFileLearnedStore, LearnedEntry, LearnedStore, MemoryLearnedStore};
pub use learning::{NoopRefreshSink, RefreshSink};
pub use matcher::{MatchTier, SuggestionCandidate};
pub use spell::SpellingVerdict;
pub use vocabulary::{AssetReader, InMemoryAssetReader, JsonAssetReader, MergedView, WordEntry};
