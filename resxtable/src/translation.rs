//! Translation candidates proposed by translator backends for one entry.

use std::cmp::Ordering;

use crate::culture::CultureKey;

/// Identity of a translator backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TranslatorInfo {
    pub id: String,
    pub display_name: String,
}

impl TranslatorInfo {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// One proposed translation.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationMatch {
    translator: TranslatorInfo,
    translated_text: String,
    rating: f64,
}

impl TranslationMatch {
    /// The rating is clamped to `[0, 1]`; NaN counts as 0.
    pub fn new(translator: TranslatorInfo, translated_text: impl Into<String>, rating: f64) -> Self {
        let rating = if rating.is_nan() {
            0.0
        } else {
            rating.clamp(0.0, 1.0)
        };
        Self {
            translator,
            translated_text: translated_text.into(),
            rating,
        }
    }

    pub fn translator(&self) -> &TranslatorInfo {
        &self.translator
    }

    pub fn translated_text(&self) -> &str {
        &self.translated_text
    }

    pub fn rating(&self) -> f64 {
        self.rating
    }

    /// Best rating first, then by translator name.
    fn rank(&self, other: &Self) -> Ordering {
        other
            .rating
            .total_cmp(&self.rating)
            .then_with(|| self.translator.display_name.cmp(&other.translator.display_name))
    }
}

/// The candidates collected for one (source text, target culture, entry).
///
/// The ordered view and the current translation are derived on every read,
/// so they always reflect what has been added so far.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationItem {
    entry_key: String,
    source: String,
    target_culture: CultureKey,
    results: Vec<TranslationMatch>,
    translation: Option<String>,
}

impl TranslationItem {
    pub fn new(
        entry_key: impl Into<String>,
        source: impl Into<String>,
        target_culture: CultureKey,
    ) -> Self {
        Self {
            entry_key: entry_key.into(),
            source: source.into(),
            target_culture,
            results: Vec::new(),
            translation: None,
        }
    }

    pub fn entry_key(&self) -> &str {
        &self.entry_key
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target_culture(&self) -> &CultureKey {
        &self.target_culture
    }

    /// Candidates in the order they were added. Duplicates are kept.
    pub fn results(&self) -> &[TranslationMatch] {
        &self.results
    }

    pub fn add_result(&mut self, result: TranslationMatch) {
        self.results.push(result);
    }

    /// Rating descending, then translator display name ascending. Stable.
    pub fn ordered_results(&self) -> Vec<&TranslationMatch> {
        let mut ordered: Vec<&TranslationMatch> = self.results.iter().collect();
        ordered.sort_by(|a, b| a.rank(b));
        ordered
    }

    pub fn best_match(&self) -> Option<&TranslationMatch> {
        self.results.iter().reduce(|best, candidate| {
            if candidate.rank(best) == Ordering::Less {
                candidate
            } else {
                best
            }
        })
    }

    /// The explicit override if set, otherwise the best candidate's text.
    pub fn translation(&self) -> Option<&str> {
        self.translation
            .as_deref()
            .or_else(|| self.best_match().map(TranslationMatch::translated_text))
    }

    /// Sets or clears the override. Returns whether it changed.
    pub fn set_translation(&mut self, translation: Option<String>) -> bool {
        if self.translation == translation {
            return false;
        }
        self.translation = translation;
        true
    }

    pub fn clear_translation(&mut self) -> bool {
        self.set_translation(None)
    }

    pub fn has_override(&self) -> bool {
        self.translation.is_some()
    }
}
