// Run settings. Every option can be given as a flag or through its environment variable.
use clap::Args;
use std::path::PathBuf;

use crate::dataset::Encoding;
use crate::error::PipelineError;
use crate::nlp::{Language, Lexicon};

pub const DEFAULT_CORPUS: &str = "reviews_smartphone.csv";
pub const DEFAULT_COLUMN: &str = "Reviews";
pub const DEFAULT_TRAIN_FRACTION: f64 = 0.8;
pub const DEFAULT_TOP_K: usize = 10;
pub const DEFAULT_ALPHA: f64 = 1.0;
pub const DEFAULT_EXIT_WORDS: [&str; 3] = ["sair", "exit", "quit"];

#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// CSV corpus of reviews
    #[arg(long, env = "REVIEWS_CORPUS", default_value = DEFAULT_CORPUS, global = true)]
    pub corpus: PathBuf,

    /// Text encoding of the corpus file
    #[arg(long, env = "REVIEWS_ENCODING", value_enum, default_value_t = Encoding::Latin1, global = true)]
    pub encoding: Encoding,

    /// Name of the column holding the review text
    #[arg(long, env = "REVIEWS_COLUMN", default_value = DEFAULT_COLUMN, global = true)]
    pub column: String,

    /// Stopword/stemmer language
    #[arg(long, env = "REVIEWS_LANGUAGE", value_enum, default_value_t = Language::Portuguese, global = true)]
    pub language: Language,

    /// Share of the shuffled dataset used for training (0..=1)
    #[arg(long, env = "REVIEWS_TRAIN_FRACTION", default_value_t = DEFAULT_TRAIN_FRACTION, global = true)]
    pub train_fraction: f64,

    /// Number of informative features to print
    #[arg(long, env = "REVIEWS_TOP_K", default_value_t = DEFAULT_TOP_K, global = true)]
    pub top_k: usize,

    /// Laplace smoothing constant
    #[arg(long, env = "REVIEWS_ALPHA", default_value_t = DEFAULT_ALPHA, global = true)]
    pub alpha: f64,

    /// Seed for the shuffle; omit for a random split
    #[arg(long, env = "REVIEWS_SEED", global = true)]
    pub seed: Option<u64>,

    /// JSON file with "positive", "negative" and "neutral" keyword lists
    #[arg(long, env = "REVIEWS_LEXICON", global = true)]
    pub lexicon: Option<PathBuf>,

    /// Word that ends the interactive prompt (repeatable)
    #[arg(
        long = "exit-word",
        env = "REVIEWS_EXIT_WORDS",
        value_delimiter = ',',
        default_values_t = DEFAULT_EXIT_WORDS.map(String::from),
        global = true
    )]
    pub exit_words: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            corpus: PathBuf::from(DEFAULT_CORPUS),
            encoding: Encoding::Latin1,
            column: DEFAULT_COLUMN.to_string(),
            language: Language::Portuguese,
            train_fraction: DEFAULT_TRAIN_FRACTION,
            top_k: DEFAULT_TOP_K,
            alpha: DEFAULT_ALPHA,
            seed: None,
            lexicon: None,
            exit_words: DEFAULT_EXIT_WORDS.map(String::from).to_vec(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(0.0..=1.0).contains(&self.train_fraction) {
            return Err(PipelineError::InvalidSetting(format!(
                "train fraction must be within [0, 1], got {}",
                self.train_fraction
            )));
        }
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(PipelineError::InvalidSetting(format!(
                "alpha must be a positive number, got {}",
                self.alpha
            )));
        }
        if self.column.trim().is_empty() {
            return Err(PipelineError::InvalidSetting("corpus column name is empty".to_string()));
        }
        if self.exit_words.iter().all(|w| w.trim().is_empty()) {
            return Err(PipelineError::InvalidSetting("at least one exit word is required".to_string()));
        }
        Ok(())
    }

    /// Built-in lexicon unless a lexicon file was given.
    pub fn load_lexicon(&self) -> Result<Lexicon, PipelineError> {
        match &self.lexicon {
            Some(path) => Lexicon::from_json_file(path),
            None => Ok(Lexicon::default()),
        }
    }

    /// Exit words, trimmed and lowercased.
    pub fn exit_words(&self) -> Vec<String> {
        self.exit_words
            .iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect()
    }
}
