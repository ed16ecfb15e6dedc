//! Per-topic score normalization for a single run

use crate::error::{FusionError, Result};
use crate::types::ScoredEntry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Score normalization method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// (score - min) / (max - min)
    #[default]
    MinMax,
    /// score / max, assuming non-negative scores
    Max,
}

impl fmt::Display for Normalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Normalization::MinMax => write!(f, "min_max"),
            Normalization::Max => write!(f, "max"),
        }
    }
}

impl FromStr for Normalization {
    type Err = FusionError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "min_max" => Ok(Normalization::MinMax),
            "max" => Ok(Normalization::Max),
            other => Err(FusionError::InvalidParameter {
                name: "normalization",
                message: format!("expected 'min_max' or 'max', got '{}'", other),
            }),
        }
    }
}

/// Rescale one run's entries for one topic
///
/// Returns a new list in the same order; the input is left untouched. An empty
/// input yields an empty output. Fails with [`FusionError::DegenerateInput`]
/// when the denominator is zero (all scores equal under `MinMax`, a zero
/// maximum under `Max`). `Max` only accepts non-negative scores and fails with
/// [`FusionError::InvalidParameter`] otherwise.
pub fn normalize(entries: &[ScoredEntry], method: Normalization) -> Result<Vec<ScoredEntry>> {
    if entries.is_empty() {
        return Ok(Vec::new());
    }

    let (min, max) = entries
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), e| {
            (lo.min(e.score), hi.max(e.score))
        });

    let lo = match method {
        Normalization::MinMax => min,
        Normalization::Max if min < 0.0 => {
            return Err(FusionError::InvalidParameter {
                name: "normalization",
                message: format!(
                    "max normalization requires non-negative scores, found {}; use min_max",
                    min
                ),
            });
        }
        Normalization::Max => 0.0,
    };
    let range = max - lo;
    if range == 0.0 {
        return Err(FusionError::DegenerateInput { min: lo, max });
    }

    Ok(entries
        .iter()
        .map(|e| ScoredEntry::new(e.doc_id.clone(), (e.score - lo) / range))
        .collect())
}
