// Fused output rankings and the insertion-ordered accumulator behind them
use crate::types::TopicId;
use ahash::{HashMap, HashMapExt};
use std::collections::BTreeMap;

/// Default number of documents emitted per topic
pub const DEFAULT_DEPTH: usize = 1000;

/// A document with its fused score
#[derive(Debug, Clone, PartialEq)]
pub struct FusedEntry {
    pub doc_id: String,
    pub score: f64,
}

/// Per-document accumulator that remembers first-insertion order
///
/// Ties in the final sort are broken by that order, so output is
/// deterministic regardless of hashing.
#[derive(Debug, Default)]
pub struct ScoreAccumulator<T> {
    order: Vec<(String, T)>,
    index: HashMap<String, usize>,
}

impl<T: Default> ScoreAccumulator<T> {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Mutable slot for a document, created on first sight
    pub fn slot(&mut self, doc_id: &str) -> &mut T {
        let idx = match self.index.get(doc_id) {
            Some(&idx) => idx,
            None => {
                self.order.push((doc_id.to_string(), T::default()));
                self.index.insert(doc_id.to_string(), self.order.len() - 1);
                self.order.len() - 1
            }
        };
        &mut self.order[idx].1
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Documents and their values in first-insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.order.iter().map(|(doc, value)| (doc.as_str(), value))
    }

    pub fn into_entries(self) -> Vec<(String, T)> {
        self.order
    }
}

/// Sort by descending score (stable, so equal scores keep input order) and truncate
pub fn rank_entries(mut entries: Vec<FusedEntry>, depth: usize) -> Vec<FusedEntry> {
    entries.sort_by(|a, b| b.score.total_cmp(&a.score));
    entries.truncate(depth);
    entries
}

/// Fused ranked list per topic
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FusedRanking {
    topics: BTreeMap<TopicId, Vec<FusedEntry>>,
}

impl FusedRanking {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rank a topic's candidates and store at most `depth` of them
    pub fn insert_topic(&mut self, topic: TopicId, entries: Vec<FusedEntry>, depth: usize) {
        self.topics.insert(topic, rank_entries(entries, depth));
    }

    pub fn topic(&self, topic: TopicId) -> Option<&[FusedEntry]> {
        self.topics.get(&topic).map(Vec::as_slice)
    }

    /// Topics in ascending order with their ranked entries
    pub fn iter(&self) -> impl Iterator<Item = (TopicId, &[FusedEntry])> {
        self.topics
            .iter()
            .map(|(topic, entries)| (*topic, entries.as_slice()))
    }

    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}
