//! Tiered matching of a composing prefix against a merged vocabulary.
//!
//! Every word is classified into at most one tier, checked in this order:
//!
//! | Tier          | Condition                                    | Confidence                                  |
//! |---------------|----------------------------------------------|---------------------------------------------|
//! | Exact         | `word == input` (case-insensitive)           | 1.0                                         |
//! | Prefix        | `word` starts with `input`                   | freq × length ratio factor × input boost    |
//! | Substring     | `word` contains `input`, input longer than 1 | freq × 0.7 (× 1.1 at position 0), max 0.9   |
//! | Edit distance | both longer than 2, similarity above 0.8     | freq × similarity × 0.8, max 0.95           |
//!
//! `freq` is the entry frequency divided by 255. Results list exact matches
//! first, then prefix matches, then substring and edit-distance matches
//! interleaved by confidence.

use crate::edit_distance;
use crate::vocabulary::{fold_key, MergedView, WordEntry};
use std::cmp::Ordering;

/// Match class a suggestion came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchTier {
    Exact,
    Prefix,
    Substring,
    EditDistance,
}

/// One ranked suggestion.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionCandidate {
    pub text: String,
    /// Ranking score in `[0, 1]`.
    pub confidence: f64,
    /// Confident enough to be committed on a trigger such as space.
    pub auto_commit_eligible: bool,
    pub tier: MatchTier,
}

const MAX_FREQUENCY: f64 = 255.0;
const SUBSTRING_WEIGHT: f64 = 0.7;
const SUBSTRING_LEADING_BOOST: f64 = 1.1;
const SUBSTRING_CAP: f64 = 0.9;
const TYPO_WEIGHT: f64 = 0.8;
const TYPO_CAP: f64 = 0.95;
const TYPO_MIN_SIMILARITY: f64 = 0.8;
const PREFIX_AUTO_COMMIT_CONFIDENCE: f64 = 0.8;
const PREFIX_AUTO_COMMIT_MIN_INPUT: usize = 3;
const TYPO_AUTO_COMMIT_CONFIDENCE: f64 = 0.9;

/// Penalise prefix matches that still have a long way to go.
fn length_ratio_factor(ratio: f64) -> f64 {
    if ratio >= 0.8 {
        0.95
    } else if ratio >= 0.6 {
        0.85
    } else if ratio >= 0.4 {
        0.75
    } else {
        0.65
    }
}

/// Longer inputs carry more intent.
fn input_length_boost(input_len: usize) -> f64 {
    if input_len >= 5 {
        1.1
    } else if input_len >= 3 {
        1.05
    } else {
        1.0
    }
}

fn clamp_confidence(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Titlecase form of `c` where it differs from the uppercase form.
///
/// Covers the Latin digraphs with a dedicated titlecase letter and the
/// characters whose titlecase is a letter pair.
fn titlecase_special(c: char) -> Option<&'static str> {
    let mapped = match c {
        'Ǆ' | 'ǅ' | 'ǆ' => "ǅ",
        'Ǉ' | 'ǈ' | 'ǉ' => "ǈ",
        'Ǌ' | 'ǋ' | 'ǌ' => "ǋ",
        'Ǳ' | 'ǲ' | 'ǳ' => "ǲ",
        'ß' => "Ss",
        'ﬀ' => "Ff",
        'ﬁ' => "Fi",
        'ﬂ' => "Fl",
        'ﬃ' => "Ffi",
        'ﬄ' => "Ffl",
        'ﬅ' | 'ﬆ' => "St",
        _ => return None,
    };
    Some(mapped)
}

/// Titlecase the first character of `word`, honouring the dotted capital I
/// of Turkish and Azeri.
pub fn capitalize_first(word: &str, locale: &str) -> String {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let language = locale
        .split(['_', '-'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    let mut out = String::with_capacity(word.len() + 2);
    if first == 'i' && matches!(language.as_str(), "tr" | "az") {
        out.push('İ');
    } else if let Some(title) = titlecase_special(first) {
        out.push_str(title);
    } else {
        out.extend(first.to_uppercase());
    }
    out.push_str(chars.as_str());
    out
}

struct Scored {
    tier: MatchTier,
    confidence: f64,
    auto_commit_eligible: bool,
    frequency: u8,
    word: String,
}

impl Scored {
    fn rank(a: &Scored, b: &Scored) -> Ordering {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| b.frequency.cmp(&a.frequency))
            .then_with(|| a.word.cmp(&b.word))
    }
}

/// Classifies vocabulary entries against a composing prefix.
#[derive(Debug, Default, Clone, Copy)]
pub struct MatchEngine;

impl MatchEngine {
    pub fn new() -> Self {
        Self
    }

    /// Rank at most `max_candidates` suggestions for `composing_text`.
    ///
    /// With empty input the most frequent words are returned. If the first
    /// typed character is uppercase, every suggestion is capitalised.
    pub fn suggest(&self, composing_text: &str, view: &MergedView, max_candidates: usize) -> Vec<SuggestionCandidate> {
        if max_candidates == 0 {
            return Vec::new();
        }
        if composing_text.is_empty() {
            return Self::most_frequent(view, max_candidates);
        }

        let input = fold_key(composing_text);
        let input_len = input.chars().count();

        let mut exact = Vec::new();
        let mut prefix = Vec::new();
        let mut fuzzy = Vec::new();

        for entry in view.entries() {
            let Some(scored) = Self::classify(&input, input_len, entry) else {
                continue;
            };
            match scored.tier {
                MatchTier::Exact => exact.push(scored),
                MatchTier::Prefix => prefix.push(scored),
                MatchTier::Substring | MatchTier::EditDistance => fuzzy.push(scored),
            }
        }

        exact.sort_by(Scored::rank);
        prefix.sort_by(Scored::rank);
        fuzzy.sort_by(Scored::rank);

        let capitalize = composing_text.chars().next().is_some_and(char::is_uppercase);

        exact
            .into_iter()
            .chain(prefix)
            .chain(fuzzy)
            .take(max_candidates)
            .map(|scored| SuggestionCandidate {
                text: if capitalize {
                    capitalize_first(&scored.word, view.locale())
                } else {
                    scored.word
                },
                confidence: scored.confidence,
                auto_commit_eligible: scored.auto_commit_eligible,
                tier: scored.tier,
            })
            .collect()
    }

    fn most_frequent(view: &MergedView, max_candidates: usize) -> Vec<SuggestionCandidate> {
        let mut entries: Vec<&WordEntry> = view.entries().collect();
        entries.sort_by(|a, b| b.frequency.cmp(&a.frequency).then_with(|| a.word.cmp(&b.word)));

        entries
            .into_iter()
            .take(max_candidates)
            .map(|entry| SuggestionCandidate {
                text: entry.word.clone(),
                confidence: clamp_confidence(entry.frequency as f64 / MAX_FREQUENCY),
                auto_commit_eligible: false,
                tier: MatchTier::Prefix,
            })
            .collect()
    }

    fn classify(input: &str, input_len: usize, entry: &WordEntry) -> Option<Scored> {
        let word = fold_key(&entry.word);
        let word_len = word.chars().count();
        let base = entry.frequency as f64 / MAX_FREQUENCY;

        let scored = |tier, confidence: f64, auto_commit_eligible| Scored {
            tier,
            confidence: clamp_confidence(confidence),
            auto_commit_eligible,
            frequency: entry.frequency,
            word: entry.word.clone(),
        };

        if word == input {
            return Some(scored(MatchTier::Exact, 1.0, true));
        }

        if word.starts_with(input) {
            let ratio = input_len as f64 / word_len as f64;
            let confidence = (base * length_ratio_factor(ratio) * input_length_boost(input_len)).min(1.0);
            let auto_commit = input_len >= PREFIX_AUTO_COMMIT_MIN_INPUT && confidence > PREFIX_AUTO_COMMIT_CONFIDENCE;
            return Some(scored(MatchTier::Prefix, confidence, auto_commit));
        }

        if input_len > 1 {
            if let Some(position) = word.find(input) {
                let mut confidence = base * SUBSTRING_WEIGHT;
                if position == 0 {
                    confidence *= SUBSTRING_LEADING_BOOST;
                }
                return Some(scored(MatchTier::Substring, confidence.min(SUBSTRING_CAP), false));
            }
        }

        if input_len > 2 && word_len > 2 {
            let distance = edit_distance::distance(input, &word);
            let similarity = 1.0 - distance as f64 / input_len.max(word_len) as f64;
            if similarity > TYPO_MIN_SIMILARITY {
                let confidence = (base * similarity * TYPO_WEIGHT).min(TYPO_CAP);
                return Some(scored(
                    MatchTier::EditDistance,
                    confidence,
                    confidence > TYPO_AUTO_COMMIT_CONFIDENCE,
                ));
            }
        }

        None
    }
}
