//! The suggestion service handed to the keyboard.
//!
//! [`SuggestionEngine`] is constructed once by the application and shared by
//! reference; there is no global instance. Each request takes its own
//! [`MergedView`] snapshot, so a suggestion started before an acceptance
//! finishes may not reflect it.
//!
//! Every public operation has a fallback: an unloaded locale yields no
//! suggestions and a `Valid` verdict, learning failures are logged and
//! dropped.

use crate::config::Config;
use crate::error::DictionaryLoadError;
use crate::learned_store::LearnedStore;
use crate::learning::{LearningFeedbackHandler, LearningPolicy, LearningTask, LearningWorker, RefreshSink};
use crate::matcher::{MatchEngine, SuggestionCandidate};
use crate::spell::{SpellChecker, SpellingVerdict};
use crate::vocabulary::{AssetReader, MergedView, VocabularyStore};
use parking_lot::RwLock;
use std::sync::Arc;

pub struct SuggestionEngine {
    vocabulary: Arc<VocabularyStore>,
    matcher: MatchEngine,
    speller: SpellChecker,
    learning: LearningWorker,
    active_locale: RwLock<String>,
}

impl SuggestionEngine {
    pub fn new(
        config: &Config,
        assets: Arc<dyn AssetReader>,
        learned: Arc<dyn LearnedStore>,
        refresh: Arc<dyn RefreshSink>,
    ) -> Self {
        let vocabulary = Arc::new(VocabularyStore::new(assets, Arc::clone(&learned)));
        let handler = LearningFeedbackHandler::new(
            Arc::clone(&vocabulary),
            learned,
            refresh,
            LearningPolicy::from_config(config),
        );

        Self {
            vocabulary,
            matcher: MatchEngine::new(),
            speller: SpellChecker::new(),
            learning: LearningWorker::spawn(handler),
            active_locale: RwLock::new(config.default_locale.clone()),
        }
    }

    /// Load the base dictionary for `locale`. The active locale is not
    /// changed; use [`SuggestionEngine::set_locale`] to switch.
    ///
    /// # Errors
    /// Returns [`DictionaryLoadError`] if the asset cannot be read; a later
    /// call retries.
    pub fn preload(&self, locale: &str) -> Result<(), DictionaryLoadError> {
        self.vocabulary.preload(locale)?;
        Ok(())
    }

    pub fn active_locale(&self) -> String {
        self.active_locale.read().clone()
    }

    pub fn set_locale(&self, locale: &str) {
        *self.active_locale.write() = locale.to_string();
    }

    pub fn is_loaded(&self, locale: &str) -> bool {
        self.vocabulary.is_loaded(locale)
    }

    /// Snapshot for the active locale, or `None` if its base dictionary has
    /// not been loaded.
    pub fn merged_view(&self) -> Option<MergedView> {
        let locale = self.active_locale();
        if !self.vocabulary.is_loaded(&locale) {
            tracing::debug!(locale, "base dictionary not loaded");
            return None;
        }
        Some(self.vocabulary.merged_view(&locale))
    }

    /// Spell-check a completed word.
    ///
    /// Surrounding words, `allow_offensive` and `is_private` are accepted for
    /// interface compatibility; filtering policy lives outside this engine.
    pub fn check(
        &self,
        word: &str,
        preceding_words: &[&str],
        following_words: &[&str],
        max_suggestions: usize,
        allow_offensive: bool,
        is_private: bool,
    ) -> SpellingVerdict {
        tracing::debug!(
            word,
            preceding = preceding_words.len(),
            following = following_words.len(),
            allow_offensive,
            is_private,
            "spell check"
        );

        if word.trim().is_empty() {
            return SpellingVerdict::Valid;
        }
        match self.merged_view() {
            Some(view) => self.speller.check(word, &view, max_suggestions),
            None => SpellingVerdict::Valid,
        }
    }

    /// Ranked completions and corrections for the word being composed.
    pub fn suggest(
        &self,
        composing_text: &str,
        context_words: &[&str],
        max_candidates: usize,
        allow_offensive: bool,
        is_private: bool,
    ) -> Vec<SuggestionCandidate> {
        tracing::debug!(
            composing_text,
            context = context_words.len(),
            allow_offensive,
            is_private,
            "suggest"
        );

        match self.merged_view() {
            Some(view) => self.matcher.suggest(composing_text, &view, max_candidates),
            None => Vec::new(),
        }
    }

    /// Queue learning for an accepted suggestion. Returns immediately.
    pub fn on_accepted(&self, candidate: &str, locale: &str) {
        if candidate.trim().is_empty() {
            return;
        }
        self.learning.submit(LearningTask::Accepted {
            word: candidate.to_string(),
            locale: locale.to_string(),
        });
    }

    pub fn on_reverted(&self, candidate: &str, locale: &str) {
        tracing::trace!(candidate, locale, "suggestion reverted");
    }

    /// Removing learned words is not supported; always `false`.
    pub fn remove(&self, candidate: &str, locale: &str) -> bool {
        tracing::trace!(candidate, locale, "remove requested but unsupported");
        false
    }

    /// Finish pending learning writes and stop the learning thread.
    pub fn shutdown(&mut self) {
        self.learning.shutdown();
    }
}
