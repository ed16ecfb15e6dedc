// Shared data model for runs, judgments and fused output
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Query identifier (e.g. TREC-7 topics 351-400)
pub type TopicId = u32;

/// Source ranking model identifier, 1-based
pub type RunId = usize;

/// A document returned by one run for one topic
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEntry {
    pub doc_id: String,
    pub score: f64,
}

impl ScoredEntry {
    pub fn new(doc_id: impl Into<String>, score: f64) -> Self {
        Self {
            doc_id: doc_id.into(),
            score,
        }
    }
}

/// One model's ranked output for every topic it answered
///
/// Each topic's entries are kept in ascending rank order.
#[derive(Debug, Clone, Default)]
pub struct RankedRun {
    pub run: RunId,
    pub topics: BTreeMap<TopicId, Vec<ScoredEntry>>,
}

impl RankedRun {
    pub fn new(run: RunId) -> Self {
        Self {
            run,
            topics: BTreeMap::new(),
        }
    }

    /// Entries for a topic, or an empty slice when the run did not answer it
    pub fn entries(&self, topic: TopicId) -> &[ScoredEntry] {
        self.topics.get(&topic).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Simplified relevance label of a retrieved document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relevance {
    Relevant,
    NotRelevant,
    Unjudged,
}

impl Relevance {
    /// Label used in the preprocessed judged-run format
    pub fn as_label(&self) -> &'static str {
        match self {
            Relevance::Relevant => "1",
            Relevance::NotRelevant => "0",
            Relevance::Unjudged => "-1",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "1" => Some(Relevance::Relevant),
            "0" => Some(Relevance::NotRelevant),
            "-1" => Some(Relevance::Unjudged),
            _ => None,
        }
    }

    pub fn is_judged(&self) -> bool {
        !matches!(self, Relevance::Unjudged)
    }
}

/// A retrieved document with its relevance label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgedEntry {
    pub doc_id: String,
    pub label: Relevance,
}

impl JudgedEntry {
    pub fn new(doc_id: impl Into<String>, label: Relevance) -> Self {
        Self {
            doc_id: doc_id.into(),
            label,
        }
    }
}

/// One run's judged document lists, per topic, in rank order
#[derive(Debug, Clone, Default)]
pub struct JudgedRun {
    pub run: RunId,
    pub topics: BTreeMap<TopicId, Vec<JudgedEntry>>,
}

impl JudgedRun {
    pub fn new(run: RunId) -> Self {
        Self {
            run,
            topics: BTreeMap::new(),
        }
    }
}

/// Read-only collection of judged runs shared by every ProbFuse configuration
#[derive(Debug, Clone, Default)]
pub struct JudgedCorpus {
    runs: Vec<JudgedRun>,
}

impl JudgedCorpus {
    /// Build a corpus, ordering runs by identifier
    pub fn new(mut runs: Vec<JudgedRun>) -> Self {
        runs.sort_by_key(|r| r.run);
        Self { runs }
    }

    pub fn runs(&self) -> &[JudgedRun] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}
