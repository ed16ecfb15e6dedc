//! The six classical score combination operators
//!
//! Each operator folds the scores one document received from the runs that
//! actually retrieved it. A run that did not return the document contributes
//! nothing, not a zero.

use crate::error::{FusionError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Score combination operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CombOperator {
    CombSum,
    CombMax,
    CombMin,
    CombMed,
    CombAnz,
    CombMnz,
}

impl CombOperator {
    /// Every operator, in output order
    pub const ALL: [CombOperator; 6] = [
        CombOperator::CombSum,
        CombOperator::CombMax,
        CombOperator::CombMin,
        CombOperator::CombMed,
        CombOperator::CombAnz,
        CombOperator::CombMnz,
    ];

    /// Name used as run label and output file stem
    pub fn name(&self) -> &'static str {
        match self {
            CombOperator::CombSum => "combSUM",
            CombOperator::CombMax => "combMAX",
            CombOperator::CombMin => "combMIN",
            CombOperator::CombMed => "combMED",
            CombOperator::CombAnz => "combANZ",
            CombOperator::CombMnz => "combMNZ",
        }
    }

    /// Fuse one document's scores
    pub fn apply(&self, scores: &[f64]) -> Result<f64> {
        if scores.is_empty() {
            return Err(FusionError::EmptyScoreSet {
                operator: self.name(),
            });
        }

        let fused = match self {
            CombOperator::CombSum => sum(scores),
            CombOperator::CombMax => scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            CombOperator::CombMin => scores.iter().copied().fold(f64::INFINITY, f64::min),
            CombOperator::CombMed => median(scores),
            CombOperator::CombAnz => sum(scores) / scores.len() as f64,
            CombOperator::CombMnz => sum(scores) * scores.len() as f64,
        };
        Ok(fused)
    }
}

impl fmt::Display for CombOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn sum(scores: &[f64]) -> f64 {
    scores.iter().sum()
}

// Even-length lists average the two middle values
fn median(scores: &[f64]) -> f64 {
    let mut sorted = scores.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
