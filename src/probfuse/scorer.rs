//! ProbFuse scoring over the topics each run was not trained on

use super::segment::Segmenter;
use super::table::{ProbabilityTable, TrainingTopics};
use crate::error::{FusionError, Result};
use crate::fusion::{FusedEntry, FusedRanking, ScoreAccumulator};
use crate::types::{JudgedCorpus, TopicId};
use std::collections::BTreeMap;
use tracing::debug;

/// Combines per-segment probabilities into one fused score per document
///
/// A document in segment `s` of run `r` receives `P(r, s) / s`; contributions
/// from different runs add up.
#[derive(Debug, Clone)]
pub struct ProbFuseScorer {
    depth: usize,
}

impl ProbFuseScorer {
    pub fn new(depth: usize) -> Self {
        Self { depth }
    }

    pub fn score(
        &self,
        corpus: &JudgedCorpus,
        table: &ProbabilityTable,
        training_topics: &TrainingTopics,
    ) -> Result<FusedRanking> {
        let mut segmenter = Segmenter::new(table.n_segments());
        let mut per_topic: BTreeMap<TopicId, ScoreAccumulator<f64>> = BTreeMap::new();

        for run in corpus.runs() {
            let probabilities = table.run(run.run).ok_or_else(|| {
                FusionError::Structural(format!("no probabilities learned for run {}", run.run))
            })?;

            let mut scored_topics = 0usize;
            for (topic, entries) in &run.topics {
                if entries.is_empty() || training_topics.contains(run.run, *topic) {
                    continue;
                }
                scored_topics += 1;

                let totals = per_topic.entry(*topic).or_default();
                for (entry, segment) in segmenter.assign(entries) {
                    *totals.slot(&entry.doc_id) += probabilities[segment - 1] / segment as f64;
                }
            }
            debug!("Run {}: scored {} held-out topics", run.run, scored_topics);
        }

        let mut ranking = FusedRanking::new();
        for (topic, totals) in per_topic {
            let entries = totals
                .into_entries()
                .into_iter()
                .map(|(doc_id, score)| FusedEntry { doc_id, score })
                .collect();
            ranking.insert_topic(topic, entries, self.depth);
        }
        Ok(ranking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probfuse::table::Policy;
    use crate::types::{JudgedEntry, JudgedRun, Relevance};
    use std::collections::BTreeSet;

    fn judged_run(run: usize, topics: &[(TopicId, &[&str])]) -> JudgedRun {
        let mut judged = JudgedRun::new(run);
        for (topic, docs) in topics {
            judged.topics.insert(
                *topic,
                docs.iter()
                    .map(|d| JudgedEntry::new(*d, Relevance::Unjudged))
                    .collect(),
            );
        }
        judged
    }

    fn table(rows: &[(usize, Vec<f64>)], n_segments: usize) -> ProbabilityTable {
        let mut table = ProbabilityTable::new(n_segments, Policy::All);
        for (run, row) in rows {
            table.insert_run(*run, row.clone());
        }
        table
    }

    fn set(topics: &[TopicId]) -> BTreeSet<TopicId> {
        topics.iter().copied().collect()
    }

    #[test]
    fn test_rank_decayed_accumulation() {
        let corpus = JudgedCorpus::new(vec![
            judged_run(1, &[(10, &["A", "B", "C", "D"])]),
            judged_run(2, &[(10, &["C", "D", "A", "B"])]),
        ]);
        let table = table(&[(1, vec![0.8, 0.4]), (2, vec![0.6, 0.2])], 2);
        let ranking = ProbFuseScorer::new(1000)
            .score(&corpus, &table, &TrainingTopics::new())
            .unwrap();

        let top = ranking.topic(10).unwrap();
        // A: 0.8 + 0.2 / 2, C: 0.4 / 2 + 0.6
        assert_eq!(top[0].doc_id, "A");
        assert!((top[0].score - 0.9).abs() < 1e-12);
        assert_eq!(top[1].doc_id, "B");
        assert_eq!(top[2].doc_id, "C");
        assert!((top[2].score - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_training_topics_excluded_per_run() {
        let corpus = JudgedCorpus::new(vec![
            judged_run(1, &[(1, &["X"]), (2, &["Y"])]),
            judged_run(2, &[(1, &["Z"]), (2, &["Y"])]),
        ]);
        let table = table(&[(1, vec![0.5]), (2, vec![0.5])], 1);
        let mut training = TrainingTopics::new();
        training.insert(1, set(&[1]));
        training.insert(2, set(&[2]));

        let ranking = ProbFuseScorer::new(1000)
            .score(&corpus, &table, &training)
            .unwrap();

        // Topic 1 only receives run 2's documents; X was in run 1's training set
        let topic1: Vec<&str> = ranking.topic(1).unwrap().iter().map(|e| e.doc_id.as_str()).collect();
        assert_eq!(topic1, vec!["Z"]);
        let topic2: Vec<&str> = ranking.topic(2).unwrap().iter().map(|e| e.doc_id.as_str()).collect();
        assert_eq!(topic2, vec!["Y"]);
    }

    #[test]
    fn test_topic_trained_by_every_run_has_no_output() {
        let corpus = JudgedCorpus::new(vec![judged_run(1, &[(1, &["A"]), (2, &["B"])])]);
        let table = table(&[(1, vec![1.0])], 1);
        let mut training = TrainingTopics::new();
        training.insert(1, set(&[1]));

        let ranking = ProbFuseScorer::new(1000)
            .score(&corpus, &table, &training)
            .unwrap();
        assert!(ranking.topic(1).is_none());
        assert_eq!(ranking.topic_count(), 1);
    }

    #[test]
    fn test_empty_held_out_list_adds_no_topic() {
        let corpus = JudgedCorpus::new(vec![judged_run(1, &[(1, &["A"]), (2, &[])])]);
        let table = table(&[(1, vec![1.0])], 1);

        let ranking = ProbFuseScorer::new(1000)
            .score(&corpus, &table, &TrainingTopics::new())
            .unwrap();
        assert!(ranking.topic(2).is_none());
        assert_eq!(ranking.topic_count(), 1);
    }

    #[test]
    fn test_missing_probability_row() {
        let corpus = JudgedCorpus::new(vec![judged_run(3, &[(1, &["A"])])]);
        let table = table(&[(1, vec![1.0])], 1);
        let result = ProbFuseScorer::new(1000).score(&corpus, &table, &TrainingTopics::new());
        assert!(matches!(result, Err(FusionError::Structural(_))));
    }

    #[test]
    fn test_depth_limit() {
        let docs: Vec<String> = (0..30).map(|i| format!("D{i}")).collect();
        let refs: Vec<&str> = docs.iter().map(String::as_str).collect();
        let corpus = JudgedCorpus::new(vec![judged_run(1, &[(5, &refs[..])])]);
        let table = table(&[(1, vec![0.9, 0.5, 0.1])], 3);

        let ranking = ProbFuseScorer::new(12)
            .score(&corpus, &table, &TrainingTopics::new())
            .unwrap();
        let top = ranking.topic(5).unwrap();
        assert_eq!(top.len(), 12);
        assert!(top.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(top[0].doc_id, "D0");
    }
}
