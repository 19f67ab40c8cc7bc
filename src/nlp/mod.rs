// NLP module: lexicon labeling and feature extraction
pub mod normalizer;
pub mod sentiment;
pub mod stopwords;

pub use normalizer::{FeatureSet, Normalizer};
pub use sentiment::{Label, Lexicon, LexiconScore};
pub use stopwords::Language;
