//! Valid/typo verdicts for completed words.

use crate::edit_distance;
use crate::vocabulary::{fold_key, MergedView};

/// Largest edit distance offered as a correction.
const MAX_CORRECTION_DISTANCE: usize = 2;

/// Words this short are never flagged.
const MIN_CHECKED_LEN: usize = 3;

/// Outcome of checking one word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpellingVerdict {
    Valid,
    /// Corrections, best first.
    Typo(Vec<String>),
}

impl SpellingVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, SpellingVerdict::Valid)
    }

    pub fn suggestions(&self) -> &[String] {
        match self {
            SpellingVerdict::Valid => &[],
            SpellingVerdict::Typo(suggestions) => suggestions,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SpellChecker;

impl SpellChecker {
    pub fn new() -> Self {
        Self
    }

    /// Judge `word` against `view`.
    ///
    /// Known words, words of two chars or fewer, and words with no
    /// dictionary entry within distance 2 are all `Valid`; only a word with
    /// at least one close candidate is reported as a typo. Candidates are
    /// ordered by frequency, then by distance.
    pub fn check(&self, word: &str, view: &MergedView, max_suggestions: usize) -> SpellingVerdict {
        let word = word.trim();
        if word.is_empty() || view.contains(word) {
            return SpellingVerdict::Valid;
        }

        let lowered = fold_key(word);
        let len = lowered.chars().count();
        if len < MIN_CHECKED_LEN {
            return SpellingVerdict::Valid;
        }

        let mut candidates: Vec<(u8, usize, &str)> = view
            .entries()
            .filter_map(|entry| {
                let key = fold_key(&entry.word);
                // distance() returns the sentinel for large length gaps
                let distance = edit_distance::distance(&lowered, &key);
                (distance <= MAX_CORRECTION_DISTANCE && key != lowered)
                    .then_some((entry.frequency, distance, entry.word.as_str()))
            })
            .collect();

        candidates.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)).then_with(|| a.2.cmp(b.2)));

        let suggestions: Vec<String> = candidates
            .into_iter()
            .take(max_suggestions)
            .map(|(_, _, word)| word.to_string())
            .collect();

        if suggestions.is_empty() {
            SpellingVerdict::Valid
        } else {
            tracing::debug!(word, count = suggestions.len(), "typo detected");
            SpellingVerdict::Typo(suggestions)
        }
    }
}
