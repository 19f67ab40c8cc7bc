// Bernoulli Naive Bayes over presence-only feature sets.
//
// Every vocabulary feature contributes to a label's score, either through its
// "present" likelihood or its "absent" likelihood. Scores are kept in log space.
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::dataset::LabeledExample;
use crate::error::PipelineError;
use crate::nlp::{FeatureSet, Label};

/// One row of the informative-features ranking.
#[derive(Debug, Clone, Serialize)]
pub struct InformativeFeature {
    pub feature: String,
    /// Highest P(present | label) divided by the lowest.
    pub ratio: f64,
    pub best: Label,
    pub worst: Label,
    pub probabilities: BTreeMap<Label, f64>,
}

#[derive(Debug, Clone)]
pub struct NaiveBayes {
    alpha: f64,
    total: usize,
    label_counts: BTreeMap<Label, usize>,
    /// Per feature, the number of training examples of each label containing it.
    feature_counts: HashMap<String, BTreeMap<Label, usize>>,
    /// Σ log P(absent | label) over the whole vocabulary.
    absent_log_sums: BTreeMap<Label, f64>,
}

impl NaiveBayes {
    /// Estimate priors and Laplace-smoothed presence likelihoods from `examples`.
    pub fn train(examples: &[LabeledExample], alpha: f64) -> Result<Self, PipelineError> {
        if examples.is_empty() {
            return Err(PipelineError::EmptyTrainPartition { total: 0 });
        }
        if !(alpha.is_finite() && alpha > 0.0) {
            return Err(PipelineError::InvalidSetting(format!(
                "smoothing alpha must be positive, got {}",
                alpha
            )));
        }

        let mut label_counts: BTreeMap<Label, usize> = BTreeMap::new();
        let mut feature_counts: HashMap<String, BTreeMap<Label, usize>> = HashMap::new();

        for example in examples {
            *label_counts.entry(example.label).or_insert(0) += 1;
            for feature in &example.features {
                *feature_counts
                    .entry(feature.clone())
                    .or_default()
                    .entry(example.label)
                    .or_insert(0) += 1;
            }
        }

        let mut model = Self {
            alpha,
            total: examples.len(),
            label_counts,
            feature_counts,
            absent_log_sums: BTreeMap::new(),
        };

        let absent_log_sums: BTreeMap<Label, f64> = model
            .label_counts
            .iter()
            .map(|(&label, &n)| {
                let sum: f64 = model
                    .feature_counts
                    .values()
                    .map(|counts| {
                        let p = model.presence_probability(counts.get(&label).copied().unwrap_or(0), n);
                        (1.0 - p).ln()
                    })
                    .sum();
                (label, sum)
            })
            .collect();
        model.absent_log_sums = absent_log_sums;

        tracing::debug!(
            examples = model.total,
            labels = model.label_counts.len(),
            vocabulary = model.feature_counts.len(),
            "trained naive bayes model"
        );
        Ok(model)
    }

    fn presence_probability(&self, count: usize, label_total: usize) -> f64 {
        (count as f64 + self.alpha) / (label_total as f64 + 2.0 * self.alpha)
    }

    /// Labels seen during training, in tie-break order.
    pub fn labels(&self) -> impl Iterator<Item = Label> + '_ {
        self.label_counts.keys().copied()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.feature_counts.len()
    }

    pub fn prior(&self, label: Label) -> f64 {
        self.label_counts.get(&label).copied().unwrap_or(0) as f64 / self.total as f64
    }

    /// Smoothed P(feature present | label), `None` for an unknown feature or label.
    pub fn likelihood(&self, feature: &str, label: Label) -> Option<f64> {
        let counts = self.feature_counts.get(feature)?;
        let n = *self.label_counts.get(&label)?;
        Some(self.presence_probability(counts.get(&label).copied().unwrap_or(0), n))
    }

    /// Unnormalized log-posterior per label. Input features outside the
    /// training vocabulary are ignored.
    pub fn log_posteriors(&self, features: &FeatureSet) -> BTreeMap<Label, f64> {
        self.label_counts
            .iter()
            .map(|(&label, &n)| {
                let mut score = self.prior(label).ln() + self.absent_log_sums[&label];
                for feature in features.iter() {
                    if let Some(counts) = self.feature_counts.get(feature) {
                        let p = self.presence_probability(counts.get(&label).copied().unwrap_or(0), n);
                        // swap the absent term already counted for the present one
                        score += p.ln() - (1.0 - p).ln();
                    }
                }
                (label, score)
            })
            .collect()
    }

    /// Posterior distribution over the trained labels.
    pub fn prob_classify(&self, features: &FeatureSet) -> BTreeMap<Label, f64> {
        let scores = self.log_posteriors(features);
        let max = scores.values().cloned().fold(f64::NEG_INFINITY, f64::max);
        let sum: f64 = scores.values().map(|s| (s - max).exp()).sum();
        scores
            .into_iter()
            .map(|(label, s)| (label, (s - max).exp() / sum))
            .collect()
    }

    /// Label with the highest log-posterior. Exact ties go to the label that
    /// sorts first (negative, neutral, positive). With an empty vocabulary or
    /// an empty feature set the decision rests on the priors.
    pub fn classify(&self, features: &FeatureSet) -> Label {
        let mut best: Option<(Label, f64)> = None;
        for (label, score) in self.log_posteriors(features) {
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((label, score)),
            }
        }
        // train() guarantees at least one label
        best.map(|(label, _)| label).unwrap_or(Label::Neutral)
    }

    /// Top `k` features by the ratio of their highest to lowest per-label
    /// presence likelihood. Equal ratios are ordered by feature name.
    pub fn most_informative(&self, k: usize) -> Vec<InformativeFeature> {
        let mut ranked: Vec<InformativeFeature> = self
            .feature_counts
            .keys()
            .map(|feature| {
                let probabilities: BTreeMap<Label, f64> = self
                    .labels()
                    .filter_map(|label| self.likelihood(feature, label).map(|p| (label, p)))
                    .collect();
                let (mut best, mut worst) = (Label::Neutral, Label::Neutral);
                let (mut hi, mut lo) = (f64::NEG_INFINITY, f64::INFINITY);
                for (&label, &p) in &probabilities {
                    if p > hi {
                        hi = p;
                        best = label;
                    }
                    if p < lo {
                        lo = p;
                        worst = label;
                    }
                }
                InformativeFeature {
                    feature: feature.clone(),
                    ratio: hi / lo,
                    best,
                    worst,
                    probabilities,
                }
            })
            .collect();

        ranked.sort_by(|a, b| b.ratio.total_cmp(&a.ratio).then_with(|| a.feature.cmp(&b.feature)));
        ranked.truncate(k);
        ranked
    }
}
