// Text normalization: lowercase, tokenize, drop stopwords and non-alphabetic
// tokens, stem what survives. The result is a presence-only feature set.
use once_cell::sync::Lazy;
use regex::Regex;
use rust_stemmers::Stemmer;
use serde::Serialize;
use std::collections::btree_set;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

use super::stopwords::Language;

// Unicode-aware: accented letters stay inside the token.
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

/// Deduplicated stems. A key being present means the feature is present; there
/// is no explicit "absent" value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FeatureSet(BTreeSet<String>);

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, String> {
        self.0.iter()
    }
}

impl<S: Into<String>> FromIterator<S> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a FeatureSet {
    type Item = &'a String;
    type IntoIter = btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Holds the stopword table and stemmer for one language. Build once and share
/// by reference; training and classification must use the same instance
/// configuration or the vocabularies will not line up.
pub struct Normalizer {
    language: Language,
    stopwords: &'static HashSet<&'static str>,
    stemmer: Stemmer,
}

impl fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Normalizer")
            .field("language", &self.language)
            .field("stopwords", &self.stopwords.len())
            .field("stemmer", &"<Stemmer>")
            .finish()
    }
}

impl Normalizer {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            stopwords: language.stopwords(),
            stemmer: Stemmer::create(language.stemmer_algorithm()),
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Lowercased tokens that pass the alphabetic and stopword filters, in
    /// input order, before stemming.
    pub fn surviving_tokens(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        WORD_RE
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|t| t.chars().all(char::is_alphabetic))
            .filter(|t| !self.stopwords.contains(*t))
            .map(String::from)
            .collect()
    }

    pub fn normalize(&self, text: &str) -> FeatureSet {
        self.surviving_tokens(text)
            .iter()
            .map(|t| self.stemmer.stem(t).into_owned())
            .collect()
    }
}
