// Error taxonomy for the labeling/training pipeline.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Corpus file could not be opened
    #[error("corpus file {} not found", .path.display())]
    CorpusNotFound { path: PathBuf },

    /// Configured text column is absent from the header or from a record
    #[error("column '{column}' not found in corpus{}", .row.map(|r| format!(" (row {})", r)).unwrap_or_default())]
    CorpusColumnMissing { column: String, row: Option<usize> },

    /// No labeled examples were produced
    #[error("no data to train on: the corpus produced zero labeled examples")]
    EmptyDataset,

    /// Split left nothing to train with
    #[error("train partition is empty ({total} labeled examples available); raise the train fraction")]
    EmptyTrainPartition { total: usize },

    #[error("invalid setting: {0}")]
    InvalidSetting(String),

    #[error("lexicon error: {0}")]
    Lexicon(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_missing_message() {
        let header = PipelineError::CorpusColumnMissing { column: "Reviews".to_string(), row: None };
        assert_eq!(header.to_string(), "column 'Reviews' not found in corpus");

        let record = PipelineError::CorpusColumnMissing { column: "Reviews".to_string(), row: Some(3) };
        assert_eq!(record.to_string(), "column 'Reviews' not found in corpus (row 3)");
    }

    #[test]
    fn test_not_found_message() {
        let err = PipelineError::CorpusNotFound { path: PathBuf::from("missing.csv") };
        assert_eq!(err.to_string(), "corpus file missing.csv not found");
    }
}
