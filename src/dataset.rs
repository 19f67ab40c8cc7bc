// Corpus loading, labeling/featurizing, and the train/test split.
use clap::ValueEnum;
use csv::ReaderBuilder;
use indicatif::ProgressBar;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use crate::error::PipelineError;
use crate::nlp::{FeatureSet, Label, Lexicon, Normalizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Encoding {
    #[value(name = "latin-1", alias = "latin1", alias = "iso-8859-1")]
    Latin1,
    #[value(name = "utf-8", alias = "utf8")]
    Utf8,
}

impl Encoding {
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            // ISO-8859-1 bytes are exactly the first 256 code points
            Encoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
            Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

/// One review, with its position in the corpus (0-based, header excluded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub row: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledExample {
    pub row: usize,
    pub features: FeatureSet,
    pub label: Label,
}

pub fn read_corpus(path: &Path, column: &str, encoding: Encoding) -> Result<Vec<RawRecord>, PipelineError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => PipelineError::CorpusNotFound { path: path.to_path_buf() },
        _ => PipelineError::Io(e),
    })?;
    read_records(file, column, encoding)
}

/// Read every record's `column` from CSV data with a header row. A missing
/// header or a record too short to hold the column aborts the whole read.
pub fn read_records<R: Read>(reader: R, column: &str, encoding: Encoding) -> Result<Vec<RawRecord>, PipelineError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.byte_headers()?.clone();
    let index = headers
        .iter()
        .position(|h| encoding.decode(h).trim_start_matches('\u{feff}').trim() == column)
        .ok_or_else(|| PipelineError::CorpusColumnMissing {
            column: column.to_string(),
            row: None,
        })?;

    let mut records = Vec::new();
    for (row, result) in reader.byte_records().enumerate() {
        let record = result?;
        let field = record.get(index).ok_or_else(|| PipelineError::CorpusColumnMissing {
            column: column.to_string(),
            row: Some(row),
        })?;
        records.push(RawRecord {
            row,
            text: encoding.decode(field),
        });
    }
    Ok(records)
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    examples: Vec<LabeledExample>,
}

/// Disjoint train/test partitions.
#[derive(Debug, Clone)]
pub struct Split {
    pub train: Vec<LabeledExample>,
    pub test: Vec<LabeledExample>,
}

impl Dataset {
    /// Label each record with the lexicon and featurize it with the normalizer.
    pub fn build(records: &[RawRecord], lexicon: &Lexicon, normalizer: &Normalizer, progress: &ProgressBar) -> Self {
        let examples = records
            .iter()
            .map(|record| {
                let example = LabeledExample {
                    row: record.row,
                    features: normalizer.normalize(&record.text),
                    label: lexicon.label(&record.text),
                };
                progress.inc(1);
                example
            })
            .collect();
        progress.finish_and_clear();
        Self { examples }
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn examples(&self) -> &[LabeledExample] {
        &self.examples
    }

    /// Count of examples per label.
    pub fn distribution(&self) -> BTreeMap<Label, usize> {
        let mut counts = BTreeMap::new();
        for example in &self.examples {
            *counts.entry(example.label).or_insert(0) += 1;
        }
        counts
    }

    /// Shuffle uniformly, then take the first `floor(fraction * len)` examples
    /// as train and the rest as test.
    pub fn split<R: Rng + ?Sized>(self, fraction: f64, rng: &mut R) -> Result<Split, PipelineError> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(PipelineError::InvalidSetting(format!(
                "train fraction must be within [0, 1], got {}",
                fraction
            )));
        }
        if self.examples.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }

        let total = self.examples.len();
        let mut examples = self.examples;
        examples.shuffle(rng);

        let cut = (fraction * total as f64).floor() as usize;
        if cut == 0 {
            return Err(PipelineError::EmptyTrainPartition { total });
        }
        let test = examples.split_off(cut.min(total));
        Ok(Split { train: examples, test })
    }
}
