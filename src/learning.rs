//! Learning from accepted suggestions.
//!
//! When the user accepts a word that the base dictionary does not know, it is
//! written to the learned store: new words start at
//! `base_frequency + accept_boost`, words seen before gain `reaccept_boost`.
//! Frequencies saturate at 255. Each successful write is followed by exactly
//! one [`RefreshSink`] notification so dependent consumers (the gesture
//! decoder) can rebuild their view of the vocabulary.
//!
//! Store failures are logged and swallowed; typing never depends on learning
//! succeeding.
//!
//! # Background Processing
//!
//! [`LearningWorker`] moves the writes off the request path: accepted words
//! are queued on a channel and applied by a dedicated thread. Dropping or
//! shutting down the worker drains whatever is still queued.

use crate::config::Config;
use crate::learned_store::{LearnedEntry, LearnedStore};
use crate::vocabulary::VocabularyStore;
use crossbeam_channel::{Sender, TrySendError};
use std::sync::Arc;
use std::thread::JoinHandle;

/// One-way "vocabulary changed" signal.
pub trait RefreshSink: Send + Sync {
    fn notify_vocabulary_changed(&self);
}

impl<F> RefreshSink for F
where
    F: Fn() + Send + Sync,
{
    fn notify_vocabulary_changed(&self) {
        self()
    }
}

/// Sink for setups without a gesture decoder.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRefreshSink;

impl RefreshSink for NoopRefreshSink {
    fn notify_vocabulary_changed(&self) {}
}

/// Frequency increments applied when learning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LearningPolicy {
    pub base_frequency: u8,
    pub accept_boost: u8,
    pub reaccept_boost: u8,
}

impl Default for LearningPolicy {
    fn default() -> Self {
        Self {
            base_frequency: 128,
            accept_boost: 35,
            reaccept_boost: 10,
        }
    }
}

impl LearningPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_frequency: config.learned_base_frequency,
            accept_boost: config.accept_boost,
            reaccept_boost: config.reaccept_boost,
        }
    }

    pub fn new_entry_frequency(&self) -> u8 {
        self.base_frequency.saturating_add(self.accept_boost)
    }

    pub fn boosted(&self, frequency: u8) -> u8 {
        frequency.saturating_add(self.reaccept_boost)
    }
}

/// What a single acceptance did to the learned store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LearningOutcome {
    /// Blank word, one the base dictionary already has, or a locale whose
    /// base dictionary cannot be loaded.
    Skipped,
    Inserted { id: i64, frequency: u8 },
    Boosted { id: i64, frequency: u8 },
    /// The store rejected the read or write.
    Failed,
}

/// Upserts accepted words into the learned store.
pub struct LearningFeedbackHandler {
    vocabulary: Arc<VocabularyStore>,
    learned: Arc<dyn LearnedStore>,
    refresh: Arc<dyn RefreshSink>,
    policy: LearningPolicy,
}

impl LearningFeedbackHandler {
    pub fn new(
        vocabulary: Arc<VocabularyStore>,
        learned: Arc<dyn LearnedStore>,
        refresh: Arc<dyn RefreshSink>,
        policy: LearningPolicy,
    ) -> Self {
        Self {
            vocabulary,
            learned,
            refresh,
            policy,
        }
    }

    pub fn policy(&self) -> LearningPolicy {
        self.policy
    }

    /// Record that `word` was accepted while typing in `locale`.
    pub fn on_accepted(&self, word: &str, locale: &str) -> LearningOutcome {
        let word = word.trim();
        if word.is_empty() {
            return LearningOutcome::Skipped;
        }

        // membership is only meaningful against a loaded base dictionary
        let base = match self.vocabulary.preload(locale) {
            Ok(base) => base,
            Err(err) => {
                tracing::warn!(word, locale, error = %err, "base dictionary unavailable, not learning");
                return LearningOutcome::Skipped;
            }
        };
        if base.contains(word) {
            tracing::trace!(word, locale, "accepted word already in base dictionary");
            return LearningOutcome::Skipped;
        }

        match self.upsert(word, locale) {
            Ok(outcome) => {
                tracing::debug!(word, locale, ?outcome, "learned word");
                self.refresh.notify_vocabulary_changed();
                outcome
            }
            Err(err) => {
                tracing::warn!(word, locale, error = %err, "failed to persist learned word");
                LearningOutcome::Failed
            }
        }
    }

    fn upsert(&self, word: &str, locale: &str) -> Result<LearningOutcome, crate::error::LearnedStoreError> {
        let existing = self.learned.query_exact(word, locale)?;

        match existing.into_iter().next() {
            None => {
                let frequency = self.policy.new_entry_frequency();
                let id = self.learned.insert(LearnedEntry::new(word, locale, frequency))?;
                Ok(LearningOutcome::Inserted { id, frequency })
            }
            Some(mut entry) => {
                entry.frequency = self.policy.boosted(entry.frequency);
                self.learned.update(&entry)?;
                Ok(LearningOutcome::Boosted {
                    id: entry.id,
                    frequency: entry.frequency,
                })
            }
        }
    }
}

/// Work queued for the learning thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LearningTask {
    Accepted { word: String, locale: String },
}

impl LearningTask {
    fn apply(self, handler: &LearningFeedbackHandler) {
        match self {
            LearningTask::Accepted { word, locale } => {
                handler.on_accepted(&word, &locale);
            }
        }
    }
}

/// Applies [`LearningTask`]s on a background thread.
pub struct LearningWorker {
    handler: Arc<LearningFeedbackHandler>,
    sender: Option<Sender<LearningTask>>,
    thread: Option<JoinHandle<()>>,
}

impl LearningWorker {
    /// Start the learning thread.
    ///
    /// If the thread cannot be spawned the worker still works, applying
    /// tasks on the caller's thread instead.
    pub fn spawn(handler: LearningFeedbackHandler) -> Self {
        let handler = Arc::new(handler);
        let (sender, receiver) = crossbeam_channel::unbounded::<LearningTask>();

        let worker_handler = Arc::clone(&handler);
        let spawned = std::thread::Builder::new()
            .name("tiersuggest-learning".to_string())
            .spawn(move || {
                for task in receiver {
                    task.apply(&worker_handler);
                }
                tracing::debug!("learning worker stopped");
            });

        match spawned {
            Ok(thread) => Self {
                handler,
                sender: Some(sender),
                thread: Some(thread),
            },
            Err(err) => {
                tracing::error!(error = %err, "failed to start learning worker, learning inline");
                Self {
                    handler,
                    sender: None,
                    thread: None,
                }
            }
        }
    }

    /// Queue `task` without waiting for it to be applied.
    pub fn submit(&self, task: LearningTask) {
        let task = match &self.sender {
            Some(sender) => match sender.try_send(task) {
                Ok(()) => return,
                Err(TrySendError::Full(task)) | Err(TrySendError::Disconnected(task)) => task,
            },
            None => task,
        };
        task.apply(&self.handler);
    }

    /// Apply everything still queued, then stop the thread.
    pub fn shutdown(&mut self) {
        self.sender.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("learning worker panicked");
            }
        }
    }
}

impl Drop for LearningWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
