//! Judgment table (`topic_id Q0 document_id relevance_weight`) and the relevance judger

use super::{parse_field, read_lines};
use crate::error::{FusionError, Result};
use crate::types::{JudgedEntry, JudgedRun, RankedRun, Relevance, TopicId};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{info, warn};

const QRELS_FIELDS: usize = 4;

/// Ground-truth relevance weights per topic and document
#[derive(Debug, Clone, Default)]
pub struct Qrels {
    topics: BTreeMap<TopicId, HashMap<String, i32>>,
}

impl Qrels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, topic: TopicId, doc_id: impl Into<String>, weight: i32) {
        self.topics
            .entry(topic)
            .or_default()
            .insert(doc_id.into(), weight);
    }

    /// Parse a judgment file
    pub fn read(path: &Path) -> Result<Self> {
        let mut qrels = Self::new();
        for (line_number, line) in read_lines(path)? {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != QRELS_FIELDS {
                return Err(FusionError::MalformedLine {
                    path: path.to_path_buf(),
                    line_number,
                    expected: format!("{} fields", QRELS_FIELDS),
                    found: format!("{} fields", fields.len()),
                    line,
                });
            }
            let topic: TopicId = parse_field(path, line_number, &line, fields[0], "topic id")?;
            let weight: i32 =
                parse_field(path, line_number, &line, fields[3], "relevance weight")?;
            qrels.insert(topic, fields[2], weight);
        }

        info!(
            "Loaded judgments for {} topics from {:?}",
            qrels.topics.len(),
            path
        );
        Ok(qrels)
    }

    pub fn has_topic(&self, topic: TopicId) -> bool {
        self.topics.contains_key(&topic)
    }

    /// Label a document: positive weight is relevant, other weights not
    /// relevant, absent documents unjudged
    pub fn label(&self, topic: TopicId, doc_id: &str) -> Relevance {
        match self.topics.get(&topic).and_then(|docs| docs.get(doc_id)) {
            Some(weight) if *weight > 0 => Relevance::Relevant,
            Some(_) => Relevance::NotRelevant,
            None => Relevance::Unjudged,
        }
    }
}

/// Turn a ranked run into per-document relevance labels, keeping rank order
pub fn judge_run(run: &RankedRun, qrels: &Qrels) -> JudgedRun {
    let mut judged = JudgedRun::new(run.run);
    for (topic, entries) in &run.topics {
        if !qrels.has_topic(*topic) {
            warn!(
                "Run {}: topic {} has no judgments, all documents unjudged",
                run.run, topic
            );
        }
        let labelled = entries
            .iter()
            .map(|e| JudgedEntry::new(e.doc_id.clone(), qrels.label(*topic, &e.doc_id)))
            .collect();
        judged.topics.insert(*topic, labelled);
    }
    judged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScoredEntry;
    use tempfile::TempDir;

    #[test]
    fn test_read_and_label() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("qrels.txt");
        std::fs::write(
            &path,
            "351 0 FT921-7107 1\n351 0 FT934-5418 0\n352 0 LA052890-0021 2\n",
        )
        .unwrap();

        let qrels = Qrels::read(&path).unwrap();
        assert_eq!(qrels.label(351, "FT921-7107"), Relevance::Relevant);
        assert_eq!(qrels.label(351, "FT934-5418"), Relevance::NotRelevant);
        assert_eq!(qrels.label(352, "LA052890-0021"), Relevance::Relevant);
        assert_eq!(qrels.label(351, "FBIS3-1"), Relevance::Unjudged);
        assert_eq!(qrels.label(399, "FT921-7107"), Relevance::Unjudged);
    }

    #[test]
    fn test_read_rejects_wrong_field_count() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("qrels.txt");
        std::fs::write(&path, "351 0 FT921-7107\n").unwrap();
        assert!(matches!(
            Qrels::read(&path),
            Err(FusionError::MalformedLine { line_number: 1, .. })
        ));
    }

    #[test]
    fn test_judge_run_keeps_order() {
        let mut qrels = Qrels::new();
        qrels.insert(351, "B", 1);
        qrels.insert(351, "C", 0);

        let mut run = RankedRun::new(4);
        run.topics.insert(
            351,
            vec![
                ScoredEntry::new("A", 3.0),
                ScoredEntry::new("B", 2.0),
                ScoredEntry::new("C", 1.0),
            ],
        );
        run.topics.insert(360, vec![ScoredEntry::new("A", 1.0)]);

        let judged = judge_run(&run, &qrels);
        assert_eq!(judged.run, 4);
        let labels: Vec<Relevance> = judged.topics[&351].iter().map(|e| e.label).collect();
        assert_eq!(
            labels,
            vec![Relevance::Unjudged, Relevance::Relevant, Relevance::NotRelevant]
        );
        assert_eq!(judged.topics[&360][0].label, Relevance::Unjudged);
    }
}
