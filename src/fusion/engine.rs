//! Basic score-based fusion across runs

use super::normalize::{normalize, Normalization};
use super::operators::CombOperator;
use super::ranking::{FusedEntry, FusedRanking, ScoreAccumulator};
use crate::error::{FusionError, Result};
use crate::types::{RankedRun, ScoredEntry, TopicId};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Scores each document received across the runs that returned it, in first-seen order
pub type DocScores = ScoreAccumulator<Vec<f64>>;

/// Normalizes every run per topic, aggregates scores per document and applies
/// each combination operator
pub struct BasicFusionEngine {
    normalization: Normalization,
    operators: Vec<CombOperator>,
    depth: usize,
}

impl BasicFusionEngine {
    /// Create an engine running all six operators
    ///
    /// # Arguments
    /// * `normalization` - Per-run, per-topic normalization method
    /// * `depth` - Maximum documents emitted per topic
    pub fn new(normalization: Normalization, depth: usize) -> Self {
        Self {
            normalization,
            operators: CombOperator::ALL.to_vec(),
            depth,
        }
    }

    /// Restrict the engine to a subset of operators
    pub fn with_operators(mut self, operators: &[CombOperator]) -> Self {
        self.operators = operators.to_vec();
        self
    }

    /// Fuse all runs, returning one ranking per operator
    pub fn fuse(&self, runs: &[RankedRun]) -> Result<BTreeMap<CombOperator, FusedRanking>> {
        if runs.is_empty() {
            return Err(FusionError::Structural("no runs to fuse".to_string()));
        }

        let topics: BTreeSet<TopicId> = runs
            .iter()
            .flat_map(|run| run.topics.keys().copied())
            .collect();

        info!(
            "Fusing {} runs over {} topics with {} normalization",
            runs.len(),
            topics.len(),
            self.normalization
        );

        let mut rankings: BTreeMap<CombOperator, FusedRanking> = self
            .operators
            .iter()
            .map(|op| (*op, FusedRanking::new()))
            .collect();

        for topic in topics {
            let normalized = runs
                .iter()
                .map(|run| self.normalize_topic(run, topic))
                .collect::<Result<Vec<_>>>()?;
            let aggregated = aggregate(normalized.iter().map(Vec::as_slice));

            debug!(
                "Topic {}: {} distinct documents across runs",
                topic,
                aggregated.len()
            );

            for op in &self.operators {
                let entries = apply_operator(&aggregated, *op)?;
                if let Some(ranking) = rankings.get_mut(op) {
                    ranking.insert_topic(topic, entries, self.depth);
                }
            }
        }

        Ok(rankings)
    }

    // Degenerate lists (one document, constant scores) get a flat 1.0
    fn normalize_topic(&self, run: &RankedRun, topic: TopicId) -> Result<Vec<ScoredEntry>> {
        let entries = run.entries(topic);
        match normalize(entries, self.normalization) {
            Err(FusionError::DegenerateInput { min, max }) => {
                warn!(
                    "Run {} topic {}: constant scores (min {}, max {}), using 1.0",
                    run.run, topic, min, max
                );
                Ok(entries
                    .iter()
                    .map(|e| ScoredEntry::new(e.doc_id.clone(), 1.0))
                    .collect())
            }
            other => other,
        }
    }
}

/// Collect each document's scores across lists, preserving first-seen order
pub fn aggregate<'a, I>(lists: I) -> DocScores
where
    I: IntoIterator<Item = &'a [ScoredEntry]>,
{
    let mut aggregated = DocScores::new();
    for list in lists {
        for entry in list {
            aggregated.slot(&entry.doc_id).push(entry.score);
        }
    }
    aggregated
}

/// Apply one operator to every aggregated document, in aggregation order
pub fn apply_operator(aggregated: &DocScores, op: CombOperator) -> Result<Vec<FusedEntry>> {
    aggregated
        .iter()
        .map(|(doc_id, scores)| {
            Ok(FusedEntry {
                doc_id: doc_id.to_string(),
                score: op.apply(scores)?,
            })
        })
        .collect()
}
