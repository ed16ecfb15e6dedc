//! probfuse - Data fusion for ranked retrieval runs
//!
//! Combines the ranked lists that several retrieval models return for the same
//! topics into a single ranking, using the CombSUM family of score operators
//! and the probabilistic, segment-based ProbFuse method.

pub mod cli;
pub mod config;
pub mod error;
pub mod eval;
pub mod fusion;
pub mod probfuse;
pub mod trec;
pub mod types;

pub use error::{FusionError, Result};
