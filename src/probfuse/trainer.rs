//! ProbFuse training: per-run topic sampling and segment probability estimation

use super::segment::Segmenter;
use super::table::{Policy, ProbabilityTable, TrainingTopics};
use crate::error::{FusionError, Result};
use crate::types::{JudgedCorpus, JudgedEntry, JudgedRun, Relevance, TopicId};
use rand::Rng;
use std::collections::BTreeSet;
use tracing::debug;

/// Learned probabilities plus the topics that produced them
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub table: ProbabilityTable,
    pub training_topics: TrainingTopics,
}

/// Estimates, per run and per segment, the probability that a document in that
/// segment is relevant
#[derive(Debug, Clone)]
pub struct ProbFuseTrainer {
    n_segments: usize,
    training_fraction: f64,
    policy: Policy,
}

impl ProbFuseTrainer {
    /// Create a trainer
    ///
    /// # Arguments
    /// * `n_segments` - Number of rank segments (positive)
    /// * `training_fraction` - Share of each run's topics used for training, in (0, 1]
    /// * `policy` - Probability estimation policy
    pub fn new(n_segments: usize, training_fraction: f64, policy: Policy) -> Result<Self> {
        validate_parameters(n_segments, training_fraction)?;
        Ok(Self {
            n_segments,
            training_fraction,
            policy,
        })
    }

    /// Sample training topics for every run and estimate its segment probabilities
    ///
    /// Each run draws its own sample, so runs may train on different topics.
    /// Runs are processed in ascending run order, which keeps the outcome
    /// reproducible for a seeded `rng`.
    pub fn train<R: Rng + ?Sized>(
        &self,
        corpus: &JudgedCorpus,
        rng: &mut R,
    ) -> Result<TrainingOutcome> {
        if corpus.is_empty() {
            return Err(FusionError::Structural(
                "no judged runs to train on".to_string(),
            ));
        }

        let mut segmenter = Segmenter::new(self.n_segments);
        let mut table = ProbabilityTable::new(self.n_segments, self.policy);
        let mut training_topics = TrainingTopics::new();

        for run in corpus.runs() {
            let topics: Vec<TopicId> = run.topics.keys().copied().collect();
            let sampled = sample_training_topics(&topics, self.training_fraction, rng);
            if sampled.is_empty() {
                return Err(FusionError::InsufficientTrainingData {
                    run: run.run,
                    topics: topics.len(),
                    fraction: self.training_fraction,
                });
            }

            let probabilities = self.estimate_run(run, &sampled, &mut segmenter);
            debug!(
                "Run {}: trained on {} of {} topics, segment 1 probability {:.4}",
                run.run,
                sampled.len(),
                topics.len(),
                probabilities.first().copied().unwrap_or_default()
            );

            table.insert_run(run.run, probabilities);
            training_topics.insert(run.run, sampled);
        }

        Ok(TrainingOutcome {
            table,
            training_topics,
        })
    }

    // Average of per-topic segment estimates over every sampled topic,
    // including topics whose segment was skipped
    fn estimate_run(
        &self,
        run: &JudgedRun,
        training: &BTreeSet<TopicId>,
        segmenter: &mut Segmenter,
    ) -> Vec<f64> {
        let mut accumulated = vec![0.0; self.n_segments];

        for topic in training {
            let Some(entries) = run.topics.get(topic) else {
                continue;
            };
            for (slot, segment) in accumulated.iter_mut().zip(segmenter.split(entries)) {
                if let Some(estimate) = segment_estimate(segment, self.policy) {
                    *slot += estimate;
                }
            }
        }

        let denominator = training.len() as f64;
        accumulated.iter().map(|sum| sum / denominator).collect()
    }
}

pub(crate) fn validate_parameters(n_segments: usize, training_fraction: f64) -> Result<()> {
    if n_segments == 0 {
        return Err(FusionError::InvalidParameter {
            name: "n_segments",
            message: "must be positive".to_string(),
        });
    }
    if !(training_fraction > 0.0 && training_fraction <= 1.0) {
        return Err(FusionError::InvalidParameter {
            name: "training_fraction",
            message: format!("must be in (0, 1], got {}", training_fraction),
        });
    }
    Ok(())
}

/// Draw `round(len * fraction)` topics uniformly without replacement
pub fn sample_training_topics<R: Rng + ?Sized>(
    topics: &[TopicId],
    fraction: f64,
    rng: &mut R,
) -> BTreeSet<TopicId> {
    let amount = ((topics.len() as f64) * fraction).round() as usize;
    let amount = amount.min(topics.len());

    rand::seq::index::sample(rng, topics.len(), amount)
        .into_iter()
        .map(|idx| topics[idx])
        .collect()
}

/// One training topic's relevance estimate for one segment
///
/// `None` means the segment contributes nothing: an empty segment, or (under
/// [`Policy::Judged`]) a segment without any judged document.
pub fn segment_estimate(segment: &[JudgedEntry], policy: Policy) -> Option<f64> {
    let relevant = count(segment, Relevance::Relevant);

    match policy {
        Policy::Judged => {
            let judged = relevant + count(segment, Relevance::NotRelevant);
            (judged > 0).then(|| relevant as f64 / judged as f64)
        }
        Policy::All => (!segment.is_empty()).then(|| relevant as f64 / segment.len() as f64),
    }
}

fn count(segment: &[JudgedEntry], label: Relevance) -> usize {
    segment.iter().filter(|e| e.label == label).count()
}
