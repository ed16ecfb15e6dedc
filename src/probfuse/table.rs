// Learned per-run, per-segment relevance probabilities
use crate::error::{FusionError, Result};
use crate::types::{RunId, TopicId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// How a segment's relevance probability is estimated from a training topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// relevant / (relevant + not relevant); segments with no judged documents are skipped
    Judged,
    /// relevant / segment size; unjudged documents count as not relevant
    All,
}

impl Policy {
    pub const BOTH: [Policy; 2] = [Policy::Judged, Policy::All];

    /// Prefix of the output run label
    pub fn label(&self) -> &'static str {
        match self {
            Policy::Judged => "ProbFuseJudged",
            Policy::All => "ProbFuseAll",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Judged => write!(f, "judged"),
            Policy::All => write!(f, "all"),
        }
    }
}

impl FromStr for Policy {
    type Err = FusionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "judged" => Ok(Policy::Judged),
            "all" => Ok(Policy::All),
            other => Err(FusionError::InvalidParameter {
                name: "policy",
                message: format!("expected 'judged' or 'all', got '{}'", other),
            }),
        }
    }
}

/// Probability that a document in segment `s` of run `r` is relevant
///
/// Read-only once built, and scoped to one (segments, fraction, policy)
/// configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityTable {
    n_segments: usize,
    policy: Policy,
    rows: BTreeMap<RunId, Vec<f64>>,
}

impl ProbabilityTable {
    pub(crate) fn new(n_segments: usize, policy: Policy) -> Self {
        Self {
            n_segments,
            policy,
            rows: BTreeMap::new(),
        }
    }

    pub(crate) fn insert_run(&mut self, run: RunId, probabilities: Vec<f64>) {
        debug_assert_eq!(probabilities.len(), self.n_segments);
        self.rows.insert(run, probabilities);
    }

    /// Probability for a 1-based segment index
    pub fn get(&self, run: RunId, segment: usize) -> Option<f64> {
        if segment == 0 {
            return None;
        }
        self.rows
            .get(&run)
            .and_then(|row| row.get(segment - 1))
            .copied()
    }

    /// All segment probabilities of a run, index 0 holding segment 1
    pub fn run(&self, run: RunId) -> Option<&[f64]> {
        self.rows.get(&run).map(Vec::as_slice)
    }

    pub fn runs(&self) -> impl Iterator<Item = RunId> + '_ {
        self.rows.keys().copied()
    }

    pub fn n_segments(&self) -> usize {
        self.n_segments
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }
}

/// Topics each run was trained on, excluded from that run's scoring
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainingTopics {
    by_run: BTreeMap<RunId, BTreeSet<TopicId>>,
}

impl TrainingTopics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, run: RunId, topics: BTreeSet<TopicId>) {
        self.by_run.insert(run, topics);
    }

    pub fn contains(&self, run: RunId, topic: TopicId) -> bool {
        self.by_run
            .get(&run)
            .is_some_and(|topics| topics.contains(&topic))
    }

    pub fn for_run(&self, run: RunId) -> Option<&BTreeSet<TopicId>> {
        self.by_run.get(&run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_one_based_lookup() {
        let mut table = ProbabilityTable::new(3, Policy::All);
        table.insert_run(2, vec![0.6, 0.3, 0.1]);

        assert_eq!(table.get(2, 1), Some(0.6));
        assert_eq!(table.get(2, 3), Some(0.1));
        assert_eq!(table.get(2, 0), None);
        assert_eq!(table.get(2, 4), None);
        assert_eq!(table.get(1, 1), None);
    }

    #[test]
    fn test_training_topics_membership() {
        let mut training = TrainingTopics::new();
        training.insert(1, [351, 360].into_iter().collect());

        assert!(training.contains(1, 360));
        assert!(!training.contains(1, 352));
        assert!(!training.contains(2, 351));
    }

    #[test]
    fn test_policy_parse_and_label() {
        assert_eq!("Judged".parse::<Policy>().unwrap(), Policy::Judged);
        assert_eq!(Policy::All.label(), "ProbFuseAll");
        assert!("some".parse::<Policy>().is_err());
    }
}
