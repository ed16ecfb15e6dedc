//! Score-based data fusion
//!
//! Normalizes each run per topic, groups every document's scores across the
//! runs that returned it, and ranks documents by the CombSUM family of
//! operators (SUM, MAX, MIN, MED, ANZ, MNZ).

mod engine;
mod normalize;
mod operators;
mod ranking;

pub use engine::{aggregate, apply_operator, BasicFusionEngine, DocScores};
pub use normalize::{normalize, Normalization};
pub use operators::CombOperator;
pub use ranking::{rank_entries, FusedEntry, FusedRanking, ScoreAccumulator, DEFAULT_DEPTH};
