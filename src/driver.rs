// Pipeline orchestration, evaluation report, and the interactive classify loop.
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use termcolor::{Color, ColorSpec, WriteColor};

use crate::bayes::{InformativeFeature, NaiveBayes};
use crate::config::Settings;
use crate::dataset::{read_corpus, Dataset, LabeledExample};
use crate::error::PipelineError;
use crate::nlp::{Label, Normalizer};

/// Everything produced by load → label/featurize → split → train.
#[derive(Debug)]
pub struct TrainedPipeline {
    pub model: NaiveBayes,
    pub normalizer: Normalizer,
    pub distribution: BTreeMap<Label, usize>,
    pub train_size: usize,
    pub test: Vec<LabeledExample>,
}

pub fn train_pipeline(settings: &Settings) -> Result<TrainedPipeline> {
    settings.validate()?;
    let lexicon = settings.load_lexicon()?;
    let normalizer = Normalizer::new(settings.language);
    tracing::debug!(language = ?normalizer.language(), "normalizer ready");

    tracing::info!("Loading and processing {}...", settings.corpus.display());
    let records = read_corpus(&settings.corpus, &settings.column, settings.encoding)
        .with_context(|| format!("failed to load corpus {}", settings.corpus.display()))?;

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {wide_bar} {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );
    pb.set_message("featurizing reviews");
    let dataset = Dataset::build(&records, &lexicon, &normalizer, &pb);
    tracing::info!("Processed {} reviews.", dataset.len());
    if dataset.is_empty() {
        return Err(PipelineError::EmptyDataset.into());
    }

    let featureless = dataset.examples().iter().filter(|e| e.features.is_empty()).count();
    if featureless > 0 {
        tracing::debug!(featureless, "reviews left without any feature after normalization");
    }

    let distribution = dataset.distribution();
    for (label, count) in &distribution {
        tracing::info!(%label, count, "label distribution");
    }

    let mut rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let split = dataset.split(settings.train_fraction, &mut rng)?;

    tracing::info!("Training classifier with {} samples...", split.train.len());
    let model = NaiveBayes::train(&split.train, settings.alpha)?;
    tracing::debug!(
        vocabulary = model.vocabulary_size(),
        labels = ?model.labels().collect::<Vec<_>>(),
        "model ready"
    );

    Ok(TrainedPipeline {
        model,
        normalizer,
        distribution,
        train_size: split.train.len(),
        test: split.test,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub total: usize,
    pub correct: usize,
    /// Percentage of correct predictions; 0 when there is nothing to test.
    pub accuracy: f64,
    /// actual label → predicted label → count
    pub confusion: BTreeMap<Label, BTreeMap<Label, usize>>,
}

pub fn evaluate(model: &NaiveBayes, test: &[LabeledExample]) -> Evaluation {
    let mut correct = 0;
    let mut confusion: BTreeMap<Label, BTreeMap<Label, usize>> = BTreeMap::new();
    for example in test {
        let predicted = model.classify(&example.features);
        if predicted == example.label {
            correct += 1;
        }
        *confusion
            .entry(example.label)
            .or_default()
            .entry(predicted)
            .or_insert(0) += 1;
    }
    let accuracy = if test.is_empty() {
        0.0
    } else {
        correct as f64 / test.len() as f64 * 100.0
    };
    Evaluation {
        total: test.len(),
        correct,
        accuracy,
        confusion,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub distribution: BTreeMap<Label, usize>,
    pub train_size: usize,
    pub test_size: usize,
    pub vocabulary_size: usize,
    pub evaluation: Evaluation,
    pub informative_features: Vec<InformativeFeature>,
}

impl TrainedPipeline {
    pub fn report(&self, top_k: usize) -> Report {
        tracing::info!("Testing classifier with {} samples...", self.test.len());
        Report {
            distribution: self.distribution.clone(),
            train_size: self.train_size,
            test_size: self.test.len(),
            vocabulary_size: self.model.vocabulary_size(),
            evaluation: evaluate(&self.model, &self.test),
            informative_features: self.model.most_informative(top_k),
        }
    }
}

fn label_color(label: Label) -> Color {
    match label {
        Label::Positive => Color::Green,
        Label::Negative => Color::Red,
        Label::Neutral => Color::Yellow,
    }
}

pub fn write_label<W: WriteColor>(out: &mut W, label: Label) -> std::io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(label_color(label))).set_bold(true))?;
    write!(out, "{}", label)?;
    out.reset()
}

pub fn print_report<W: WriteColor>(out: &mut W, report: &Report) -> std::io::Result<()> {
    let eval = &report.evaluation;
    if eval.total == 0 {
        writeln!(out, "Test partition is empty; accuracy reported as 0.")?;
    }
    write!(out, "Classifier accuracy: ")?;
    out.set_color(ColorSpec::new().set_bold(true))?;
    write!(out, "{:.2}%", eval.accuracy)?;
    out.reset()?;
    writeln!(out, " ({}/{})", eval.correct, eval.total)?;

    writeln!(out)?;
    writeln!(out, "Most informative features:")?;
    if report.informative_features.is_empty() {
        writeln!(out, "  (none)")?;
    }
    let width = report
        .informative_features
        .iter()
        .map(|f| f.feature.chars().count())
        .max()
        .unwrap_or(0);
    for row in &report.informative_features {
        write!(out, "{:>width$} = present    ", row.feature, width = width)?;
        write_label(out, row.best)?;
        write!(out, " : ")?;
        write_label(out, row.worst)?;
        writeln!(out, " = {:>8.1} : 1.0", row.ratio)?;
    }
    Ok(())
}

/// Line-oriented classify loop over any reader/writer pair.
pub struct InteractiveSession<'a> {
    model: &'a NaiveBayes,
    normalizer: &'a Normalizer,
    exit_words: Vec<String>,
}

impl<'a> InteractiveSession<'a> {
    pub fn new(model: &'a NaiveBayes, normalizer: &'a Normalizer, exit_words: Vec<String>) -> Self {
        Self {
            model,
            normalizer,
            exit_words,
        }
    }

    pub fn classify(&self, text: &str) -> Label {
        let features = self.normalizer.normalize(&text.to_lowercase());
        if features.is_empty() {
            tracing::debug!("no usable tokens; falling back to class priors");
        }
        let label = self.model.classify(&features);
        tracing::debug!(%label, features = features.len(), "classified review");
        label
    }

    /// Runs until an exit word or end of input. Returns how many reviews were classified.
    pub fn run<R: BufRead, W: WriteColor>(&self, mut input: R, out: &mut W) -> std::io::Result<usize> {
        let quit = self.exit_words.first().map(String::as_str).unwrap_or("exit");
        writeln!(out)?;
        writeln!(out, "--- Classify new reviews ---")?;
        writeln!(out, "Type a review to classify (or '{}' to finish):", quit)?;

        let mut classified = 0;
        let mut line = String::new();
        loop {
            write!(out, "> ")?;
            out.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                break;
            }
            let review = line.trim().to_lowercase();
            if self.exit_words.iter().any(|w| *w == review) {
                break;
            }
            if review.is_empty() {
                writeln!(out, "Empty review. Try again.")?;
                continue;
            }

            let label = self.classify(&review);
            write!(out, "Predicted sentiment: ")?;
            write_label(out, label)?;
            writeln!(out)?;
            writeln!(out, "--- Type another review or '{}' ---", quit)?;
            classified += 1;
        }
        Ok(classified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::RawRecord;
    use crate::nlp::{Language, Lexicon};
    use termcolor::NoColor;

    const POSITIVE: &[&str] = &[
        "Produto excelente, superou expectativas",
        "Excelente celular, superou minhas expectativas",
        "Produto excelente! Superou as expectativas da família",
        "Câmera excelente, superou expectativas",
        "Excelente compra, superou expectativas na entrega",
        "Produto excelente e bonito, superou expectativas",
        "Tela excelente, superou expectativas",
        "Bateria excelente, superou todas as expectativas",
    ];

    const NEGATIVE: &[&str] = &[
        "Produto ruim, travou toda hora",
        "Celular ruim, travou toda hora no jogo",
        "Produto muito ruim, travou toda hora",
        "Câmera ruim e o aparelho travou toda hora",
        "Ruim demais, travou toda hora desde a entrega",
        "Produto ruim, travou a tela toda hora",
        "Travou toda hora, produto ruim",
        "Aparelho ruim, travou toda hora na chamada",
    ];

    const NEUTRAL: &[&str] = &[
        "Produto regular, aceitável",
        "Celular regular, aceitável pelo preço",
        "Produto regular e aceitável",
        "Câmera regular, aceitável",
        "Regular, aceitável para o dia a dia",
        "Produto regular, tela aceitável",
        "Aceitável, produto regular",
        "Bateria regular, aceitável",
    ];

    fn corpus() -> Vec<RawRecord> {
        POSITIVE
            .iter()
            .chain(NEGATIVE)
            .chain(NEUTRAL)
            .enumerate()
            .map(|(row, text)| RawRecord { row, text: text.to_string() })
            .collect()
    }

    fn trained() -> (NaiveBayes, Normalizer, Dataset) {
        let normalizer = Normalizer::new(Language::Portuguese);
        let dataset = Dataset::build(&corpus(), &Lexicon::default(), &normalizer, &ProgressBar::hidden());
        let model = NaiveBayes::train(dataset.examples(), 1.0).unwrap();
        (model, normalizer, dataset)
    }

    #[test]
    fn test_corpus_is_labeled_as_intended() {
        let (_, _, dataset) = trained();
        assert!(dataset.len() >= 20);
        let distribution = dataset.distribution();
        assert_eq!(distribution[&Label::Positive], POSITIVE.len());
        assert_eq!(distribution[&Label::Negative], NEGATIVE.len());
        assert_eq!(distribution[&Label::Neutral], NEUTRAL.len());
    }

    #[test]
    fn test_end_to_end_predictions() {
        let (model, normalizer, _) = trained();
        let session = InteractiveSession::new(&model, &normalizer, vec!["sair".to_string()]);
        assert_eq!(session.classify("Produto excelente, superou expectativas"), Label::Positive);
        assert_eq!(session.classify("Produto ruim, travou toda hora"), Label::Negative);
        assert_eq!(session.classify("Produto regular, aceitável"), Label::Neutral);
    }

    #[test]
    fn test_training_accuracy_beats_chance() {
        let (model, _, dataset) = trained();
        let evaluation = evaluate(&model, dataset.examples());
        assert_eq!(evaluation.total, dataset.len());
        assert!(evaluation.accuracy > 100.0 / 3.0);
        assert_eq!(evaluation.accuracy, 100.0);
    }

    #[test]
    fn test_evaluate_empty_test_set() {
        let (model, _, _) = trained();
        let evaluation = evaluate(&model, &[]);
        assert_eq!(evaluation.total, 0);
        assert_eq!(evaluation.accuracy, 0.0);
        assert!(evaluation.confusion.is_empty());
    }

    #[test]
    fn test_confusion_counts() {
        let (model, normalizer, _) = trained();
        let test = vec![
            LabeledExample {
                row: 0,
                features: normalizer.normalize("excelente superou expectativas"),
                label: Label::Positive,
            },
            LabeledExample {
                row: 1,
                features: normalizer.normalize("excelente superou expectativas"),
                label: Label::Negative,
            },
        ];
        let evaluation = evaluate(&model, &test);
        assert_eq!(evaluation.correct, 1);
        assert_eq!(evaluation.accuracy, 50.0);
        assert_eq!(evaluation.confusion[&Label::Negative][&Label::Positive], 1);
    }

    #[test]
    fn test_print_report() -> anyhow::Result<()> {
        let (model, normalizer, dataset) = trained();
        let pipeline = TrainedPipeline {
            model,
            normalizer,
            distribution: dataset.distribution(),
            train_size: dataset.len(),
            test: dataset.examples()[..4].to_vec(),
        };
        let report = pipeline.report(5);
        assert_eq!(report.informative_features.len(), 5);

        let mut out = NoColor::new(Vec::new());
        print_report(&mut out, &report)?;
        let text = String::from_utf8(out.into_inner())?;
        assert!(text.contains("Classifier accuracy: 100.00% (4/4)"));
        assert!(text.contains("Most informative features:"));
        assert_eq!(text.matches("= present").count(), 5);

        let json = serde_json::to_value(&report)?;
        assert_eq!(json["train_size"], 24);
        assert_eq!(json["distribution"]["positive"], 8);
        Ok(())
    }

    #[test]
    fn test_interactive_session() -> anyhow::Result<()> {
        let (model, normalizer, _) = trained();
        let session = InteractiveSession::new(&model, &normalizer, vec!["sair".to_string()]);
        let input = "Produto excelente, superou expectativas\n   \nProduto ruim, travou toda hora\nSAIR\nnunca lido\n";

        let mut out = NoColor::new(Vec::new());
        let classified = session.run(input.as_bytes(), &mut out)?;
        let text = String::from_utf8(out.into_inner())?;

        assert_eq!(classified, 2);
        assert!(text.contains("Predicted sentiment: positive"));
        assert!(text.contains("Predicted sentiment: negative"));
        assert_eq!(text.matches("Empty review. Try again.").count(), 1);
        assert!(text.contains("(or 'sair' to finish)"));
        Ok(())
    }

    #[test]
    fn test_interactive_session_ends_on_eof() -> anyhow::Result<()> {
        let (model, normalizer, _) = trained();
        let session = InteractiveSession::new(&model, &normalizer, vec!["sair".to_string()]);
        let mut out = NoColor::new(Vec::new());
        let classified = session.run("Produto regular, aceitável".as_bytes(), &mut out)?;
        let text = String::from_utf8(out.into_inner())?;
        assert_eq!(classified, 1);
        assert!(text.contains("Predicted sentiment: neutral"));
        Ok(())
    }

    #[test]
    fn test_train_pipeline_from_csv() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("reviews.csv");
        let mut body = String::from("id,Reviews\n");
        for record in corpus() {
            body.push_str(&format!("{},\"{}\"\n", record.row, record.text));
        }
        std::fs::write(&path, body)?;

        let settings = Settings {
            corpus: path,
            encoding: crate::dataset::Encoding::Utf8,
            seed: Some(11),
            ..Settings::default()
        };
        let pipeline = train_pipeline(&settings)?;
        assert_eq!(pipeline.train_size, 19);
        assert_eq!(pipeline.test.len(), 5);
        assert_eq!(pipeline.distribution.values().sum::<usize>(), 24);
        Ok(())
    }

    #[test]
    fn test_train_pipeline_missing_corpus() {
        let settings = Settings {
            corpus: "definitely-missing.csv".into(),
            ..Settings::default()
        };
        let err = train_pipeline(&settings).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::CorpusNotFound { .. })
        ));
    }
}
