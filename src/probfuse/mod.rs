//! ProbFuse: probabilistic, segment-based data fusion
//!
//! Each run's ranked lists are cut into rank segments. From a random sample of
//! training topics (drawn independently per run) the trainer estimates the
//! probability that a document in segment `s` is relevant. The scorer then
//! fuses the remaining topics by summing `P(run, s) / s` over every run that
//! returned the document.

mod grid;
mod scorer;
mod segment;
mod table;
mod trainer;

pub use grid::{run_seeded, ProbFuseConfig, ProbFuseGrid, ProbFuseRun};
pub use scorer::ProbFuseScorer;
pub use segment::{assign_segments, compute_segment_sizes, Segmenter};
pub use table::{Policy, ProbabilityTable, TrainingTopics};
pub use trainer::{sample_training_topics, segment_estimate, ProbFuseTrainer, TrainingOutcome};
