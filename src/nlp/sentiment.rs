// Sentiment labels and the keyword lexicon that produces provisional ground truth.
// Matching is plain substring containment on the lowercased text, so multi-word
// phrases such as "não funciona" are found without tokenizing.
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::File;
use std::path::Path;

use crate::error::PipelineError;

/// Sentiment class. Variant order is the lexical order of the names, which is
/// also the tie-break order used by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Negative,
    Neutral,
    Positive,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Negative => "negative",
            Label::Neutral => "neutral",
            Label::Positive => "positive",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const POSITIVE_WORDS: &[&str] = &[
    "excelente", "ótima", "incrível", "superou", "adorei", "melhor", "rápido",
    "eficiente", "recomendo", "fluido", "prático", "vale", "bom", "boa", "gostei",
    "perfeito", "maravilhoso", "satisfeito", "feliz", "sucesso", "ideal", "top",
];

const NEGATIVE_WORDS: &[&str] = &[
    "ruim", "esquenta", "arrependi", "péssima", "frágil", "lento", "bugs",
    "decepcionante", "pouca", "baixo", "má", "horrível", "terrível", "odeio",
    "detestei", "problema", "falha", "lixo", "não funciona", "travou", "caro",
];

const NEUTRAL_TIE_BREAKERS: &[&str] = &[
    "regular", "aceitável", "não é ruim", "mais ou menos", "ok", "mediano",
];

/// Hit counts for one text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LexiconScore {
    pub positive: usize,
    pub negative: usize,
    /// Whether a neutral tie-breaker phrase occurs. Reported only; a tie is
    /// neutral whether or not this is set.
    pub neutral_cue: bool,
}

impl LexiconScore {
    pub fn label(&self) -> Label {
        if self.positive > self.negative {
            Label::Positive
        } else if self.negative > self.positive {
            Label::Negative
        } else {
            Label::Neutral
        }
    }
}

/// Three disjoint keyword lists. Entries are stored lowercased.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lexicon {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
    #[serde(default)]
    pub neutral: Vec<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        let owned = |words: &[&str]| -> Vec<String> { words.iter().map(|w| w.to_string()).collect() };
        Self {
            positive: owned(POSITIVE_WORDS),
            negative: owned(NEGATIVE_WORDS),
            neutral: owned(NEUTRAL_TIE_BREAKERS),
        }
    }
}

impl Lexicon {
    /// Build a lexicon from raw lists, lowercasing every entry.
    pub fn new(positive: Vec<String>, negative: Vec<String>, neutral: Vec<String>) -> Result<Self, PipelineError> {
        let lower = |words: Vec<String>| -> Vec<String> {
            words.into_iter().map(|w| w.trim().to_lowercase()).collect()
        };
        let lexicon = Self {
            positive: lower(positive),
            negative: lower(negative),
            neutral: lower(neutral),
        };
        lexicon.validate()?;
        Ok(lexicon)
    }

    /// Load `{"positive": [...], "negative": [...], "neutral": [...]}` from disk.
    pub fn from_json_file(path: &Path) -> Result<Self, PipelineError> {
        let file = File::open(path).map_err(|e| {
            PipelineError::Lexicon(format!("cannot open {}: {}", path.display(), e))
        })?;
        let raw: Lexicon = serde_json::from_reader(file)?;
        Self::new(raw.positive, raw.negative, raw.neutral)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        let lists = [
            ("positive", &self.positive),
            ("negative", &self.negative),
            ("neutral", &self.neutral),
        ];
        let mut owner: HashMap<&str, &str> = HashMap::new();
        for (name, words) in lists {
            let mut seen: HashSet<&str> = HashSet::new();
            for word in words.iter() {
                if word.is_empty() {
                    return Err(PipelineError::Lexicon(format!("empty entry in {} list", name)));
                }
                if !seen.insert(word.as_str()) {
                    continue;
                }
                if let Some(other) = owner.insert(word.as_str(), name) {
                    return Err(PipelineError::Lexicon(format!(
                        "'{}' appears in both {} and {} lists",
                        word, other, name
                    )));
                }
            }
        }
        if self.positive.is_empty() && self.negative.is_empty() {
            return Err(PipelineError::Lexicon("positive and negative lists are both empty".to_string()));
        }
        Ok(())
    }

    pub fn score(&self, text: &str) -> LexiconScore {
        let lowered = text.to_lowercase();
        let hits = |words: &[String]| words.iter().filter(|w| lowered.contains(w.as_str())).count();
        LexiconScore {
            positive: hits(&self.positive),
            negative: hits(&self.negative),
            neutral_cue: self.neutral.iter().any(|w| lowered.contains(w.as_str())),
        }
    }

    pub fn label(&self, text: &str) -> Label {
        self.score(text).label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_positive() {
        let lexicon = Lexicon::default();
        assert_eq!(lexicon.label("Produto excelente, superou expectativas"), Label::Positive);
    }

    #[test]
    fn test_label_negative() {
        let lexicon = Lexicon::default();
        assert_eq!(lexicon.label("Produto ruim, travou toda hora"), Label::Negative);
    }

    #[test]
    fn test_label_neutral_without_hits() {
        let lexicon = Lexicon::default();
        assert_eq!(lexicon.label("Produto regular, aceitável"), Label::Neutral);
        assert_eq!(lexicon.label(""), Label::Neutral);
    }

    #[test]
    fn test_tie_is_neutral_regardless_of_cue() {
        let lexicon = Lexicon::default();

        let with_cue = lexicon.score("câmera excelente mas bateria ruim, ok");
        assert_eq!(with_cue.positive, 1);
        assert_eq!(with_cue.negative, 1);
        assert!(with_cue.neutral_cue);
        assert_eq!(with_cue.label(), Label::Neutral);

        let without_cue = lexicon.score("câmera excelente mas bateria ruim");
        assert!(!without_cue.neutral_cue);
        assert_eq!(without_cue.label(), Label::Neutral);
    }

    #[test]
    fn test_phrase_matches_as_substring() {
        let lexicon = Lexicon::default();
        let score = lexicon.score("O carregador NÃO FUNCIONA direito");
        assert_eq!(score.negative, 1);
        assert_eq!(score.label(), Label::Negative);
    }

    #[test]
    fn test_each_entry_counts_once() {
        let lexicon = Lexicon::default();
        // Repeating a word does not add hits; two distinct negatives beat one positive.
        let score = lexicon.score("excelente excelente excelente, mas lento e caro");
        assert_eq!(score.positive, 1);
        assert_eq!(score.negative, 2);
        assert_eq!(score.label(), Label::Negative);
    }

    #[test]
    fn test_more_positive_hits_wins() {
        let lexicon = Lexicon::default();
        let score = lexicon.score("Adorei, recomendo, só achei um pouco lento");
        assert!(score.positive > score.negative);
        assert_eq!(score.label(), Label::Positive);
    }

    #[test]
    fn test_new_lowercases_entries() {
        let lexicon = Lexicon::new(
            vec!["Great".to_string()],
            vec!["AWFUL".to_string()],
            vec![],
        )
        .unwrap();
        assert_eq!(lexicon.positive, vec!["great"]);
        assert_eq!(lexicon.label("This phone is GREAT"), Label::Positive);
        assert_eq!(lexicon.label("awful battery"), Label::Negative);
    }

    #[test]
    fn test_overlapping_lists_rejected() {
        let result = Lexicon::new(
            vec!["ok".to_string()],
            vec!["bad".to_string()],
            vec!["OK".to_string()],
        );
        assert!(matches!(result, Err(PipelineError::Lexicon(_))));
    }

    #[test]
    fn test_default_lexicon_is_valid() {
        assert!(Lexicon::default().validate().is_ok());
    }

    #[test]
    fn test_label_ordering_is_lexical() {
        let declared = vec![Label::Negative, Label::Neutral, Label::Positive];
        let mut by_name = declared.clone();
        by_name.sort_by_key(|l| l.as_str());
        assert_eq!(by_name, declared);
        assert!(Label::Negative < Label::Neutral && Label::Neutral < Label::Positive);
    }

    #[test]
    fn test_from_json_file() -> anyhow::Result<()> {
        use std::io::Write;
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("lexicon.json");
        let mut f = File::create(&path)?;
        writeln!(f, r#"{{"positive": ["Good"], "negative": ["bad", "does not work"]}}"#)?;

        let lexicon = Lexicon::from_json_file(&path)?;
        assert_eq!(lexicon.positive, vec!["good"]);
        assert!(lexicon.neutral.is_empty());
        assert_eq!(lexicon.label("It does not work"), Label::Negative);
        Ok(())
    }
}
